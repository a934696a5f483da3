//! # Gadget Configuration
//!
//! Configuration for gadget connections and sessions.
//!
//! ## Features
//!
//! - **Wire Settings**: peer address, timeouts and record extent limits,
//!   layered from TOML files and `GADGET_` environment variables
//! - **Configuration Headers**: parsing of the session header describing
//!   encoding spaces; malformed headers yield `None` instead of an error
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gadget_config::{parse_header_config, WireConfig};
//! use std::path::Path;
//!
//! let wire = WireConfig::load(Some(Path::new("config/wire.toml")), Some("scanner"))?;
//! let reader_limits = wire.limits;
//!
//! if let Some(header) = parse_header_config("[experimental_conditions]\n...") {
//!     println!("{} encoding spaces", header.encodings.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod header_config;
pub mod wire_config;

// Re-export commonly used types
pub use header_config::{
    parse_header_config, try_parse_header_config, Encoding, HeaderConfig, HeaderConfigError,
    TrajectoryType,
};
pub use wire_config::WireConfig;

//! Gadget Network
//!
//! Blocking connections that move identifier-tagged records between
//! reconstruction stages. A [`Connection`] owns one byte stream and dispatches
//! each record through the shared [`ReaderRegistry`] / [`WriterRegistry`].
//!
//! ```no_run
//! use gadget_config::WireConfig;
//! use gadget_network::{default_registries, Connection, Inbound};
//! use std::sync::Arc;
//!
//! # fn main() -> gadget_network::Result<()> {
//! let config = WireConfig {
//!     peer_address: Some("localhost:9002".to_string()),
//!     ..WireConfig::default()
//! };
//! let (readers, writers) = default_registries(config.limits);
//! let mut conn = Connection::connect(&config, Arc::new(readers), Arc::new(writers))?;
//!
//! while let Inbound::Message { id, chain } = conn.receive()? {
//!     println!("record {} with {} nodes", id, chain.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod registry;

pub use connection::{Connection, ConnectionStats};
pub use error::{NetworkError, Result};
pub use registry::{default_registries, Inbound, ReaderRegistry, WriterRegistry};

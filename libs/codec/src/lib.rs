//! # Gadget Wire Codec
//!
//! ## Purpose
//!
//! This crate contains the "Rules" layer of the gadget wire protocol:
//! - Message identifier registry and framing
//! - Acquisition record writer (identifier + header + arrays)
//! - Acquisition record reader (all-or-nothing chain construction)
//! - Reader/writer traits used by the message-type registry
//! - Extent limits applied before buffer allocation
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → network/
//!     ↑           ↓          ↓
//! Pure Data   Wire Rules   Connections
//! Header      Reader       Registry
//! NdArray     Writer       Sockets
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket setup or connection handling (belongs in network/)
//! - Dispatch on inbound identifiers (the registry in network/ does that)
//! - Configuration loading (belongs in config/)
//!
//! ## Wire Format
//!
//! ```text
//! [u16 MessageIdentifier]
//! [AcquisitionHeader: 344 raw bytes]
//! [optional: f32 × (trajectory_dimensions × number_of_samples)]
//! [Complex32 × (number_of_samples × active_channels)]
//! ```
//!
//! Host byte order, no length fields: both ends must share the header layout.

pub mod constants;
pub mod error;
pub mod framing;
pub mod interface;
pub mod limits;
pub mod reader;
pub mod writer;

// Re-export key types for convenience
pub use constants::{MessageId, DATA_MESSAGE_ID_MIN, MESSAGE_IDENTIFIER_SIZE};
pub use error::{Section, WireError, WireResult};
pub use framing::{read_identifier, write_identifier, MessageIdentifier};
pub use interface::{MessageReader, MessageWriter};
pub use limits::WireLimits;
pub use reader::AcquisitionReader;
pub use writer::AcquisitionWriter;

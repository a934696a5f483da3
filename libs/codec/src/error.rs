//! Wire-level errors for acquisition record transfer
//!
//! Every failure names the record section it happened in, so a log line tells
//! which part of the stream was lost. I/O and allocation failures leave the
//! stream position undefined; there is no resynchronization marker, so they
//! are terminal for the connection.

use gadget_types::{AllocationError, ChainError};
use std::fmt;
use std::io;
use thiserror::Error;

/// Part of a record being transferred when an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Identifier,
    Header,
    Trajectory,
    Samples,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::Identifier => "message identifier",
            Section::Header => "acquisition header",
            Section::Trajectory => "trajectory array",
            Section::Samples => "sample array",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Acquisition protocol errors
#[derive(Debug, Error)]
pub enum WireError {
    /// Short or failed send/receive
    #[error("Connection I/O failure on {section}: {source}")]
    ConnectionIo {
        section: Section,
        #[source]
        source: io::Error,
    },

    /// Buffer sizing or allocation failed before the section was read
    #[error("Allocation failure for {section}: {source}")]
    Allocation {
        section: Section,
        #[source]
        source: AllocationError,
    },

    /// Writer was handed a chain that is not an acquisition record
    #[error("Invalid payload type for {expected}: {source}")]
    InvalidPayloadType {
        expected: &'static str,
        #[source]
        source: ChainError,
    },

    /// Array node does not match the extents its header declares
    #[error("{section} shape mismatch: header declares {expected:?}, payload has {found:?}")]
    PayloadShapeMismatch {
        section: Section,
        expected: Option<[usize; 2]>,
        found: Option<[usize; 2]>,
    },

    /// Inbound tag with no registered reader; its payload length is unknowable
    #[error("Unknown message identifier {id}")]
    UnknownMessageId { id: u16 },

    /// Outbound tag with no registered writer; nothing was written
    #[error("No writer registered for message identifier {id}")]
    NoWriter { id: u16 },
}

impl WireError {
    pub fn io(section: Section, source: io::Error) -> Self {
        Self::ConnectionIo { section, source }
    }

    pub fn allocation(section: Section, source: AllocationError) -> Self {
        Self::Allocation { section, source }
    }

    /// Section the failure is attributed to, if any
    pub fn section(&self) -> Option<Section> {
        match self {
            Self::ConnectionIo { section, .. }
            | Self::Allocation { section, .. }
            | Self::PayloadShapeMismatch { section, .. } => Some(*section),
            Self::InvalidPayloadType { .. }
            | Self::UnknownMessageId { .. }
            | Self::NoWriter { .. } => None,
        }
    }

    /// Header could not be received
    pub fn is_header_read_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionIo {
                section: Section::Header,
                ..
            }
        )
    }

    /// Trajectory or sample array could not be received
    pub fn is_array_read_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionIo {
                section: Section::Trajectory | Section::Samples,
                ..
            }
        )
    }

    /// Stream position is unknown; the connection must be closed
    ///
    /// Payload type, shape and missing-writer errors are raised before any
    /// byte is sent.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::ConnectionIo { .. } | Self::Allocation { .. } | Self::UnknownMessageId { .. } => {
                true
            }
            Self::InvalidPayloadType { .. }
            | Self::PayloadShapeMismatch { .. }
            | Self::NoWriter { .. } => false,
        }
    }
}

/// Result type for wire operations
pub type WireResult<T> = std::result::Result<T, WireError>;

//! Connection Error Types
//!
//! Errors raised while driving a gadget connection. Wire errors from the codec
//! are wrapped unchanged so callers can still ask which record section failed.

use gadget_codec::WireError;
use std::net::SocketAddr;
use thiserror::Error;

/// Main connection error type
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Record encoding/decoding failed
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Socket setup or flush failed
    #[error("Connection error: {message} (remote: {remote_addr:?})")]
    Connection {
        message: String,
        remote_addr: Option<SocketAddr>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An earlier fatal error left the stream out of step
    #[error("Connection broken: {reason}")]
    Broken { reason: String },
}

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>, remote_addr: Option<SocketAddr>) -> Self {
        Self::Connection {
            message: message.into(),
            remote_addr,
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_with_source(
        message: impl Into<String>,
        remote_addr: Option<SocketAddr>,
        source: std::io::Error,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            remote_addr,
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// The connection cannot be used for further records
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Wire(e) => e.is_fatal(),
            Self::Connection { .. } | Self::Broken { .. } => true,
            Self::Configuration { .. } => false,
        }
    }
}

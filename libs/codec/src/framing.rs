//! Identifier framing and exact-length section transfer
//!
//! Every logical record is preceded by exactly one [`MessageIdentifier`]. The
//! section helpers wrap `write_all`/`read_exact`: a transfer either moves the
//! full byte count or fails, attributed to the section it was moving.

use crate::constants::{MessageId, MESSAGE_IDENTIFIER_SIZE};
use crate::error::{Section, WireError, WireResult};
use std::io::{Read, Write};
use tracing::{error, trace};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Type tag preceding each payload (2 bytes, host byte order)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct MessageIdentifier {
    pub id: u16,
}

impl MessageIdentifier {
    pub const SIZE: usize = MESSAGE_IDENTIFIER_SIZE;

    pub fn new(id: impl Into<u16>) -> Self {
        Self { id: id.into() }
    }

    /// Known message type, if the tag is registered in [`MessageId`]
    pub fn message_id(&self) -> Option<MessageId> {
        MessageId::try_from(self.id).ok()
    }
}

/// Write one identifier tag
pub fn write_identifier<W: Write + ?Sized>(stream: &mut W, id: impl Into<u16>) -> WireResult<()> {
    let identifier = MessageIdentifier::new(id);
    send_section(stream, Section::Identifier, identifier.as_bytes())
}

/// Consume one identifier tag
pub fn read_identifier<R: Read + ?Sized>(stream: &mut R) -> WireResult<MessageIdentifier> {
    let mut identifier = MessageIdentifier::new_zeroed();
    recv_section(stream, Section::Identifier, identifier.as_bytes_mut())?;
    Ok(identifier)
}

/// Send `bytes` in full or fail for `section`
pub fn send_section<W: Write + ?Sized>(
    stream: &mut W,
    section: Section,
    bytes: &[u8],
) -> WireResult<()> {
    stream.write_all(bytes).map_err(|e| {
        error!(%section, bytes = bytes.len(), error = %e, "Unable to send section");
        WireError::io(section, e)
    })?;
    trace!(%section, bytes = bytes.len(), "Sent section");
    Ok(())
}

/// Fill `buffer` completely from the stream or fail for `section`
///
/// An empty buffer is a legal zero-extent section and reads nothing.
pub fn recv_section<R: Read + ?Sized>(
    stream: &mut R,
    section: Section,
    buffer: &mut [u8],
) -> WireResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    stream.read_exact(buffer).map_err(|e| {
        error!(%section, bytes = buffer.len(), error = %e, "Unable to receive section");
        WireError::io(section, e)
    })?;
    trace!(%section, bytes = buffer.len(), "Received section");
    Ok(())
}

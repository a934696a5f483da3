//! Message-type registries
//!
//! Maps inbound identifier codes to readers and outbound codes to writers.
//! Registries are built once at startup and then shared read-only (behind an
//! `Arc`) by every connection thread.

use gadget_codec::{
    read_identifier, write_identifier, AcquisitionReader, AcquisitionWriter, MessageId,
    MessageReader, MessageWriter, WireError, WireLimits, WireResult,
};
use gadget_types::MessageChain;
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::{debug, warn};

/// One inbound record, or the peer's request to end the session
#[derive(Debug, PartialEq)]
pub enum Inbound {
    Message { id: u16, chain: MessageChain },
    Close,
}

/// Identifier → reader dispatch table
#[derive(Default)]
pub struct ReaderRegistry {
    readers: HashMap<u16, Box<dyn MessageReader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the reader's own identifier, replacing any previous entry
    pub fn register<R: MessageReader + 'static>(&mut self, reader: R) -> &mut Self {
        let id = reader.message_id();
        if let Some(previous) = self.readers.insert(id.code(), Box::new(reader)) {
            warn!(%id, replaced = previous.name(), "Replaced registered reader");
        }
        self
    }

    pub fn get(&self, id: u16) -> Option<&dyn MessageReader> {
        self.readers.get(&id).map(|reader| reader.as_ref())
    }

    pub fn contains(&self, id: u16) -> bool {
        self.readers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Consume one identifier and hand the rest of the record to its reader
    ///
    /// An unknown identifier is fatal: its payload length is unknowable.
    pub fn read_message<R: Read + ?Sized>(&self, stream: &mut R) -> WireResult<Inbound> {
        let identifier = read_identifier(stream)?;
        if identifier.id == MessageId::Close.code() {
            debug!("Received close message");
            return Ok(Inbound::Close);
        }

        let reader = self.get(identifier.id).ok_or_else(|| {
            warn!(id = identifier.id, "No reader registered for message identifier");
            WireError::UnknownMessageId { id: identifier.id }
        })?;

        let chain = reader.read(&mut &mut *stream)?;
        Ok(Inbound::Message {
            id: identifier.id,
            chain,
        })
    }
}

/// Identifier → writer dispatch table
#[derive(Default)]
pub struct WriterRegistry {
    writers: HashMap<u16, Box<dyn MessageWriter>>,
}

impl WriterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the writer's own identifier, replacing any previous entry
    pub fn register<W: MessageWriter + 'static>(&mut self, writer: W) -> &mut Self {
        let id = writer.message_id();
        if let Some(previous) = self.writers.insert(id.code(), Box::new(writer)) {
            warn!(%id, replaced = previous.name(), "Replaced registered writer");
        }
        self
    }

    pub fn get(&self, id: u16) -> Option<&dyn MessageWriter> {
        self.writers.get(&id).map(|writer| writer.as_ref())
    }

    pub fn contains(&self, id: u16) -> bool {
        self.writers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Encode `chain` with the writer registered for `id`
    ///
    /// Nothing is written when no writer is registered, so the stream stays
    /// usable after [`WireError::NoWriter`].
    pub fn write_message<W: Write + ?Sized>(
        &self,
        stream: &mut W,
        id: u16,
        chain: &MessageChain,
    ) -> WireResult<()> {
        let writer = self.get(id).ok_or(WireError::NoWriter { id })?;
        writer.write(&mut &mut *stream, chain)
    }

    /// Write the bare close identifier that ends a session
    pub fn write_close<W: Write + ?Sized>(&self, stream: &mut W) -> WireResult<()> {
        write_identifier(stream, MessageId::Close)
    }
}

/// Registries with the acquisition reader/writer pair installed
pub fn default_registries(limits: WireLimits) -> (ReaderRegistry, WriterRegistry) {
    let mut readers = ReaderRegistry::new();
    readers.register(AcquisitionReader::new(limits));

    let mut writers = WriterRegistry::new();
    writers.register(AcquisitionWriter::new());

    (readers, writers)
}

//! Reader/writer seams used by the message-type registry
//!
//! A registry maps an identifier code to one reader and one writer. Readers are
//! invoked after the registry has consumed the identifier; writers emit their
//! own identifier. Both are stateless between calls so one instance can serve
//! many connections concurrently.

use crate::constants::MessageId;
use crate::error::WireResult;
use gadget_types::MessageChain;
use std::io::{Read, Write};

/// Decodes one record (identifier already consumed) into an owned chain
pub trait MessageReader: Send + Sync {
    /// Tag this reader is registered under
    fn message_id(&self) -> MessageId;

    fn name(&self) -> &'static str;

    /// Returns a fully built chain, or an error with nothing retained
    fn read(&self, stream: &mut dyn Read) -> WireResult<MessageChain>;
}

/// Encodes one chain, identifier first
pub trait MessageWriter: Send + Sync {
    fn message_id(&self) -> MessageId;

    fn name(&self) -> &'static str;

    fn write(&self, stream: &mut dyn Write, chain: &MessageChain) -> WireResult<()>;
}

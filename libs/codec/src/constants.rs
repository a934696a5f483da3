//! # Message Identifiers - Gadget Wire Type Tags
//!
//! ## Purpose
//!
//! Registry of the 16-bit type tags that precede every payload on a gadget
//! connection. Values are shared with every peer on the pipeline and must stay
//! stable.
//!
//! ## Architecture Role
//!
//! ```text
//! Writer → [u16 tag][payload...] → Reader registry → matching MessageReader
//! ```
//!
//! Control messages occupy 1-999; data messages start at 1000.

use num_enum::TryFromPrimitive;
use std::fmt;

/// Size of the identifier tag on the wire
pub const MESSAGE_IDENTIFIER_SIZE: usize = 2;

/// First identifier code reserved for data messages
pub const DATA_MESSAGE_ID_MIN: u16 = 1000;

/// Known message type tags
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum MessageId {
    // Control messages (1-999)
    ConfigFile = 1,
    ConfigScript = 2,
    ParameterScript = 3,
    Close = 4,

    // Data messages (1000+)
    Acquisition = 1001,
    NewMeasurement = 1002,
    EndOfScan = 1003,
    ImageComplexFloat = 1004,
    ImageRealFloat = 1005,
    ImageRealUshort = 1006,
    Empty = 1007,
    /// Acquisition record in this crate's padding-free header layout, not the
    /// packed ISMRMRD struct
    IsmrmrdAcquisition = 1008,
}

impl MessageId {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageId::ConfigFile => "ConfigFile",
            MessageId::ConfigScript => "ConfigScript",
            MessageId::ParameterScript => "ParameterScript",
            MessageId::Close => "Close",
            MessageId::Acquisition => "Acquisition",
            MessageId::NewMeasurement => "NewMeasurement",
            MessageId::EndOfScan => "EndOfScan",
            MessageId::ImageComplexFloat => "ImageComplexFloat",
            MessageId::ImageRealFloat => "ImageRealFloat",
            MessageId::ImageRealUshort => "ImageRealUshort",
            MessageId::Empty => "Empty",
            MessageId::IsmrmrdAcquisition => "IsmrmrdAcquisition",
        }
    }

    /// Control messages carry no record payload handled by data readers
    pub fn is_control(self) -> bool {
        self.code() < DATA_MESSAGE_ID_MIN
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl From<MessageId> for u16 {
    fn from(id: MessageId) -> Self {
        id.code()
    }
}

//! Acquisition records: the fixed header plus the arrays it sizes

pub mod header;
pub mod record;

pub use header::{
    AcquisitionHeader, EncodingCounters, ACQUISITION_HEADER_VERSION, CHANNEL_MASKS, USER_FLOATS,
    USER_INTS,
};
pub use record::Acquisition;

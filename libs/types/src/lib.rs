//! # Gadget Types Library
//!
//! Data types for acquisition records moving between pipeline stages.
//!
//! ## Design Philosophy
//!
//! - **Raw Layout Headers**: `AcquisitionHeader` is `#[repr(C)]`, padding-free and
//!   zerocopy-enabled so it can be sent and received as one fixed block
//! - **Header-Derived Extents**: array shapes come only from header fields
//! - **Fallible Allocation**: `NdArray::create` reports sizing and allocator
//!   failures as values, separate from I/O errors
//! - **Single Ownership**: a `MessageChain` owns its nodes and is moved, never
//!   shared; dropping it releases everything it built
//!
//! ## Quick Start
//!
//! ```rust
//! use gadget_types::{Acquisition, AcquisitionHeader, MessageChain};
//!
//! let acquisition = Acquisition::new(AcquisitionHeader::new(128, 4, 0)).unwrap();
//! let chain = MessageChain::from(acquisition);
//! assert_eq!(chain.len(), 2);
//! assert_eq!(chain.samples().unwrap().dims(), [128, 4]);
//! ```

pub mod acquisition;
pub mod array;
pub mod chain;

pub use acquisition::{Acquisition, AcquisitionHeader, EncodingCounters};
pub use array::{AllocationError, Complex32, NdArray};
pub use chain::{AcquisitionParts, ChainError, MessageChain, Payload, PayloadKind};

//! Acquisition Header Implementation
//!
//! The header is the fixed-size leading block of every acquisition record. It is
//! transferred as raw host-layout bytes and is the only source of array extents:
//! the wire format carries no separate length fields.

use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Layout version written into freshly built headers
pub const ACQUISITION_HEADER_VERSION: u16 = 1;

/// Number of 64-bit words in the channel mask (1024 channels)
pub const CHANNEL_MASKS: usize = 16;

/// Number of user-defined integer and float slots
pub const USER_INTS: usize = 8;
pub const USER_FLOATS: usize = 8;

/// Encoding loop counters (34 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodingCounters {
    pub kspace_encode_step_1: u16,
    pub kspace_encode_step_2: u16,
    pub average: u16,
    pub slice: u16,
    pub contrast: u16,
    pub phase: u16,
    pub repetition: u16,
    pub set: u16,
    pub segment: u16,
    pub user: [u16; 8],
}

/// Acquisition Header (344 bytes)
///
/// Only `trajectory_dimensions`, `number_of_samples` and `active_channels` are
/// interpreted by the protocol; every other field is carried opaquely.
///
/// **CRITICAL**: Fields are grouped by size (u64 → u32/f32 → u16) so the struct
/// has no implicit padding and `AsBytes` is sound. DO NOT REORDER without
/// rechecking `SIZE`; both ends of a connection must agree on this layout.
///
/// The field set follows the ISMRMRD acquisition header but the byte layout
/// does not: peers sending the packed ISMRMRD struct under tag 1008 are not
/// wire compatible. Both ends must be built from this crate.
///
/// ```text
/// ┌───────────────────┬──────────────────────┬──────────────────────────┐
/// │ AcquisitionHeader │ trajectory (f32)     │ samples (Complex32)      │
/// │ (344 bytes)       │ dims × samples       │ samples × channels       │
/// └───────────────────┴──────────────────────┴──────────────────────────┘
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionHeader {
    // 8-byte fields (bytes 0-135)
    pub flags: u64,
    pub channel_mask: [u64; CHANNEL_MASKS],

    // 4-byte fields (bytes 136-287)
    pub measurement_uid: u32,
    pub scan_counter: u32,
    pub acquisition_time_stamp: u32,
    pub physiology_time_stamp: [u32; 3],
    pub sample_time_us: f32,
    pub position: [f32; 3],
    pub read_dir: [f32; 3],
    pub phase_dir: [f32; 3],
    pub slice_dir: [f32; 3],
    pub patient_table_position: [f32; 3],
    pub user_int: [i32; USER_INTS],
    pub user_float: [f32; USER_FLOATS],

    // 2-byte fields (bytes 288-343)
    pub version: u16,
    pub number_of_samples: u16,
    pub available_channels: u16,
    pub active_channels: u16,
    pub discard_pre: u16,
    pub discard_post: u16,
    pub center_sample: u16,
    pub encoding_space_ref: u16,
    pub trajectory_dimensions: u16,
    pub idx: EncodingCounters,
    pub reserved: [u16; 2],
}
// Total: EXACTLY 344 bytes, a multiple of the 8-byte alignment.

impl AcquisitionHeader {
    /// Header size in bytes
    pub const SIZE: usize = 344;

    /// Create a zeroed header with the three sizing fields set
    pub fn new(number_of_samples: u16, active_channels: u16, trajectory_dimensions: u16) -> Self {
        let mut header = Self::new_zeroed();
        header.version = ACQUISITION_HEADER_VERSION;
        header.number_of_samples = number_of_samples;
        header.active_channels = active_channels;
        header.available_channels = active_channels;
        header.trajectory_dimensions = trajectory_dimensions;
        header
    }

    /// Whether a trajectory array follows this header on the wire
    pub fn has_trajectory(&self) -> bool {
        self.trajectory_dimensions > 0
    }

    /// Extents of the trajectory array, `[trajectory_dimensions, number_of_samples]`
    pub fn trajectory_dims(&self) -> Option<[usize; 2]> {
        self.has_trajectory().then(|| {
            [
                self.trajectory_dimensions as usize,
                self.number_of_samples as usize,
            ]
        })
    }

    /// Extents of the sample array, `[number_of_samples, active_channels]`
    pub fn sample_dims(&self) -> [usize; 2] {
        [self.number_of_samples as usize, self.active_channels as usize]
    }

    /// Trajectory float count; zero when no trajectory is attached
    pub fn trajectory_elements(&self) -> usize {
        self.trajectory_dimensions as usize * self.number_of_samples as usize
    }

    /// Complex sample count across all active channels
    pub fn data_elements(&self) -> usize {
        self.active_channels as usize * self.number_of_samples as usize
    }

    /// Bytes that follow the header on the wire for this record
    pub fn payload_bytes(&self) -> usize {
        self.trajectory_elements() * std::mem::size_of::<f32>()
            + self.data_elements() * 2 * std::mem::size_of::<f32>()
    }
}

impl Default for AcquisitionHeader {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

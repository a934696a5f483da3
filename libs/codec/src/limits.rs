//! Upper bounds on header-declared array extents
//!
//! Header fields are trusted for sizing, so a corrupt or hostile peer could ask
//! for multi-gigabyte buffers. Readers refuse anything above these limits with
//! an allocation error instead of attempting the allocation.

use serde::{Deserialize, Serialize};

/// Default cap on trajectory floats per record (16M floats, 64 MiB)
pub const DEFAULT_MAX_TRAJECTORY_ELEMENTS: usize = 16 * 1024 * 1024;

/// Default cap on complex samples per record (16M samples, 128 MiB)
pub const DEFAULT_MAX_SAMPLE_ELEMENTS: usize = 16 * 1024 * 1024;

/// Per-record element limits applied before allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireLimits {
    pub max_trajectory_elements: usize,
    pub max_sample_elements: usize,
}

impl WireLimits {
    /// Accept whatever the header declares
    pub const fn unbounded() -> Self {
        Self {
            max_trajectory_elements: usize::MAX,
            max_sample_elements: usize::MAX,
        }
    }
}

impl Default for WireLimits {
    fn default() -> Self {
        Self {
            max_trajectory_elements: DEFAULT_MAX_TRAJECTORY_ELEMENTS,
            max_sample_elements: DEFAULT_MAX_SAMPLE_ELEMENTS,
        }
    }
}

//! Typed 2-D buffers sized from header-declared extents
//!
//! `NdArray::create` is the single allocation point for record payloads. It
//! computes the exact element count, refuses overflowing or over-limit shapes
//! and uses fallible allocation, so allocation failure surfaces as an
//! [`AllocationError`] before any byte is read from a stream.

use std::collections::TryReserveError;
use std::mem::size_of;
use thiserror::Error;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Single-precision complex sample, stored as interleaved `(re, im)` floats
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    pub fn norm_sqr(&self) -> f32 {
        self.re * self.re + self.im * self.im
    }
}

impl From<(f32, f32)> for Complex32 {
    fn from((re, im): (f32, f32)) -> Self {
        Self { re, im }
    }
}

/// Buffer sizing and allocation failures
///
/// Distinct from I/O failure: these happen before any bytes are transferred,
/// and leave the stream position unknown to the peer.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// Extents multiply past the addressable size
    #[error("Array extents {dims:?} of {element_size}-byte elements overflow the addressable size")]
    Overflow { dims: [usize; 2], element_size: usize },

    /// Extents exceed the configured element limit
    #[error("Array extents {dims:?} hold {elements} elements, limit is {limit}")]
    ExceedsLimit {
        dims: [usize; 2],
        elements: usize,
        limit: usize,
    },

    /// The allocator refused the request
    #[error("Failed to allocate {bytes} bytes for array extents {dims:?}")]
    OutOfMemory {
        dims: [usize; 2],
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    /// Supplied data does not fill the declared extents
    #[error("Array extents {dims:?} need {expected} elements, got {got}")]
    ShapeMismatch {
        dims: [usize; 2],
        expected: usize,
        got: usize,
    },
}

/// Exclusively owned 2-D array; the first extent varies fastest
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray<T> {
    dims: [usize; 2],
    data: Vec<T>,
}

impl<T: FromZeroes + Copy> NdArray<T> {
    /// Allocate a zero-filled array of exactly `dims[0] × dims[1]` elements
    ///
    /// Zero extents are legal and yield an empty array.
    pub fn create(dims: [usize; 2]) -> Result<Self, AllocationError> {
        Self::create_bounded(dims, usize::MAX)
    }

    /// Like [`NdArray::create`], refusing shapes above `max_elements`
    pub fn create_bounded(dims: [usize; 2], max_elements: usize) -> Result<Self, AllocationError> {
        let elements = element_count::<T>(dims)?;
        if elements > max_elements {
            return Err(AllocationError::ExceedsLimit {
                dims,
                elements,
                limit: max_elements,
            });
        }

        let mut data = Vec::new();
        data.try_reserve_exact(elements)
            .map_err(|source| AllocationError::OutOfMemory {
                dims,
                bytes: elements * size_of::<T>(),
                source,
            })?;
        data.resize(elements, T::new_zeroed());

        Ok(Self { dims, data })
    }
}

impl<T> NdArray<T> {
    /// Wrap existing data, checking it fills the extents exactly
    pub fn from_vec(dims: [usize; 2], data: Vec<T>) -> Result<Self, AllocationError> {
        let expected = element_count::<T>(dims)?;
        if data.len() != expected {
            return Err(AllocationError::ShapeMismatch {
                dims,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element at `(i, j)` where `i < dims[0]`, `j < dims[1]`
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i >= self.dims[0] || j >= self.dims[1] {
            return None;
        }
        self.data.get(i + j * self.dims[0])
    }

    /// Contiguous run along the first extent for a fixed second index
    ///
    /// For sample arrays this is one channel's samples.
    pub fn lane(&self, j: usize) -> Option<&[T]> {
        if j >= self.dims[1] {
            return None;
        }
        let start = j * self.dims[0];
        self.data.get(start..start + self.dims[0])
    }
}

impl<T: AsBytes + FromBytes> NdArray<T> {
    /// Raw host-layout view of the elements
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice().as_bytes()
    }

    /// Writable raw view, used to read a payload straight into the buffer
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data.as_mut_slice().as_bytes_mut()
    }
}

fn element_count<T>(dims: [usize; 2]) -> Result<usize, AllocationError> {
    let overflow = || AllocationError::Overflow {
        dims,
        element_size: size_of::<T>(),
    };
    let elements = dims[0].checked_mul(dims[1]).ok_or_else(overflow)?;
    let bytes = elements.checked_mul(size_of::<T>()).ok_or_else(overflow)?;
    if bytes > isize::MAX as usize {
        return Err(overflow());
    }
    Ok(elements)
}

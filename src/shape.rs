//! Validated transform shapes.
//!
//! A [`Shape`] is an ordered sequence of positive extents. Order is
//! significant: `[4, 8]` and `[8, 4]` describe distinct row-major
//! transforms and never compare equal.

use alloc::vec::Vec;

use crate::kernel::FftError;

/// Rank and per-dimension extents of a transform, validated at construction.
///
/// Invariants: rank >= 1, every extent > 0, and the element-count product
/// fits in `usize`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    extents: Vec<usize>,
    total: usize,
}

impl Shape {
    /// Build a shape from ordered extents.
    ///
    /// Returns [`FftError::InvalidShape`] for an empty sequence, a zero
    /// extent, or an element count that overflows `usize`.
    pub fn new(extents: &[usize]) -> Result<Self, FftError> {
        if extents.is_empty() {
            return Err(FftError::InvalidShape);
        }
        let mut total: usize = 1;
        for &e in extents {
            if e == 0 {
                return Err(FftError::InvalidShape);
            }
            total = total.checked_mul(e).ok_or(FftError::InvalidShape)?;
        }
        Ok(Self {
            extents: extents.to_vec(),
            total,
        })
    }

    /// Convenience constructor for one-dimensional transforms.
    pub fn new_1d(n: usize) -> Result<Self, FftError> {
        Self::new(&[n])
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Total element count (product of extents).
    pub fn len(&self) -> usize {
        self.total
    }

    /// A shape never describes an empty buffer; provided for slice-like
    /// API completeness.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Row-major stride of `axis` in elements.
    pub fn stride(&self, axis: usize) -> usize {
        self.extents[axis + 1..].iter().product()
    }
}

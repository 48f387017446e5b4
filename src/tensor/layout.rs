//! Layout: element addressing for batched column-major storage

use super::shape::{STACK_DIMS, Shape};
use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// Strides type: element offsets between consecutive elements along each dimension
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[usize; STACK_DIMS]>;

/// Layout describes where each element of a tensor lives in its storage
///
/// Elements are stored column-major across the per-sample dimensions (the
/// first dimension varies fastest) and the batch is the outermost axis.
///
/// Address of element `[i0, i1, ..., ik]` of sample `n`:
///   i0 + d0 * i1 + d0 * d1 * i2 + ... + n * volume
///
/// # Example
/// ```
/// use devtensor::tensor::{Layout, Shape};
/// let layout = Layout::of(&Shape::new(&[2, 3], 2).unwrap());
/// assert_eq!(layout.strides(), &[1, 2]);
/// assert_eq!(layout.batch_stride(), 6);
/// assert_eq!(layout.offset(&[1, 2], 1).unwrap(), 11);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Per-sample dimension sizes
    dims: SmallVec<[usize; STACK_DIMS]>,
    /// Column-major strides of the per-sample dimensions
    strides: Strides,
    /// Distance between consecutive samples (the sample volume)
    batch_stride: usize,
    /// Number of samples
    batch: usize,
}

impl Layout {
    /// Compute the storage layout of a shape
    pub fn of(shape: &Shape) -> Self {
        let dims: SmallVec<[usize; STACK_DIMS]> = shape.dims().iter().copied().collect();
        let strides: Strides = (0..dims.len()).map(|d| shape.lower_volume(d)).collect();

        Self {
            dims,
            strides,
            batch_stride: shape.volume(),
            batch: shape.batch(),
        }
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Element distance between two consecutive batch samples
    #[inline]
    pub fn batch_stride(&self) -> usize {
        self.batch_stride
    }

    /// Total number of elements, saturating at `usize::MAX`
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.batch_stride.saturating_mul(self.batch)
    }

    /// Flat element offset of `index` within sample `sample`
    ///
    /// Missing trailing indices are taken as 0. Indices past the last
    /// dimension address implicit size-1 dimensions and must be 0.
    pub fn offset(&self, index: &[usize], sample: usize) -> Result<usize> {
        if sample >= self.batch {
            return Err(Error::IndexOutOfBounds {
                index: sample,
                size: self.batch,
            });
        }

        let mut offset = sample * self.batch_stride;
        for (axis, &i) in index.iter().enumerate() {
            let size = self.dims.get(axis).copied().unwrap_or(1);
            if i >= size {
                return Err(Error::IndexOutOfBounds { index: i, size });
            }
            if let Some(&stride) = self.strides.get(axis) {
                offset += i * stride;
            }
        }
        Ok(offset)
    }

    /// Range of flat offsets occupied by sample `sample`
    pub fn batch_range(&self, sample: usize) -> Result<Range<usize>> {
        if sample >= self.batch {
            return Err(Error::IndexOutOfBounds {
                index: sample,
                size: self.batch,
            });
        }
        let start = sample * self.batch_stride;
        Ok(start..start + self.batch_stride)
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("dims", &self.dims.as_slice())
            .field("strides", &self.strides.as_slice())
            .field("batch", &self.batch)
            .finish()
    }
}

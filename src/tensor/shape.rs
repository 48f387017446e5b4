//! Shape type: per-sample dimensions of a tensor plus its batch size

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape of a batched tensor
///
/// A shape is a list of per-sample dimension sizes plus a batch size, the
/// number of independent samples packed into one allocation. Trailing
/// dimensions of size 1 carry no information in column-major order and are
/// dropped, so `[2, 1]` and `[2]` describe the same shape.
///
/// # Example
///
/// ```
/// use devtensor::tensor::Shape;
/// let s = Shape::new(&[2, 3, 1], 4).unwrap();
/// assert_eq!(s.dims(), &[2, 3]);
/// assert_eq!(s.volume(), 6);
/// assert_eq!(s.elem_count(), 24);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: SmallVec<[usize; STACK_DIMS]>,
    batch: usize,
}

impl Shape {
    /// Create a shape from dimensions and a batch size.
    ///
    /// Fails with [`Error::InvalidShape`] when `batch` is zero or the
    /// element count does not fit in `usize`.
    pub fn new(dims: &[usize], batch: usize) -> Result<Self> {
        Self::canonical(dims.iter().copied().collect(), batch).validated()
    }

    /// Create a single-sample shape (batch size 1).
    pub fn from_dims(dims: &[usize]) -> Self {
        Self::canonical(dims.iter().copied().collect(), 1)
    }

    /// Shape of a single scalar value.
    pub fn scalar() -> Self {
        Self {
            dims: SmallVec::new(),
            batch: 1,
        }
    }

    fn canonical(mut dims: SmallVec<[usize; STACK_DIMS]>, batch: usize) -> Self {
        while dims.last() == Some(&1) {
            dims.pop();
        }
        Self { dims, batch }
    }

    fn validated(self) -> Result<Self> {
        if self.batch == 0 {
            return Err(Error::invalid_shape("batch size must be at least 1"));
        }
        if self.checked_elem_count().is_none() {
            return Err(Error::invalid_shape(format!(
                "element count of {self} overflows usize"
            )));
        }
        Ok(self)
    }

    /// Same dimensions with a different batch size.
    pub fn with_batch(&self, batch: usize) -> Result<Self> {
        Self {
            dims: self.dims.clone(),
            batch,
        }
        .validated()
    }

    /// Per-sample dimension sizes (trailing 1s removed).
    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.dims.as_slice()
    }

    /// Size of dimension `index`; dimensions past [`ndim`](Self::ndim) are 1.
    #[inline]
    pub fn dim(&self, index: usize) -> usize {
        self.dims.get(index).copied().unwrap_or(1)
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of samples in the batch.
    #[inline]
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Number of elements in one sample (batch excluded).
    ///
    /// Saturates at `usize::MAX`; see [`checked_elem_count`](Self::checked_elem_count).
    #[inline]
    pub fn volume(&self) -> usize {
        self.lower_volume(self.dims.len())
    }

    /// Product of the dimensions strictly below `dim`, saturating at `usize::MAX`.
    ///
    /// This is the column-major stride of dimension `dim`.
    pub fn lower_volume(&self, dim: usize) -> usize {
        checked_product(self.dims.iter().take(dim)).unwrap_or(usize::MAX)
    }

    /// Total number of elements, batch included.
    ///
    /// Saturates at `usize::MAX`; see [`checked_elem_count`](Self::checked_elem_count).
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.checked_elem_count().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or `None` if it overflows `usize`.
    pub fn checked_elem_count(&self) -> Option<usize> {
        checked_product(self.dims.iter())?.checked_mul(self.batch)
    }

    /// Whether the batch holds more than one sample.
    #[inline]
    pub fn has_batch(&self) -> bool {
        self.batch > 1
    }

    /// Whether each sample is a single value.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Whether both shapes have the same per-sample dimensions.
    pub fn has_same_dims(&self, other: &Self) -> bool {
        self.dims == other.dims
    }

    /// Whether the batch sizes are equal or one of them is 1.
    pub fn has_compatible_batch(&self, other: &Self) -> bool {
        self.batch == other.batch || self.batch == 1 || other.batch == 1
    }
}

fn checked_product<'a>(mut dims: impl Iterator<Item = &'a usize>) -> Option<usize> {
    dims.try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

impl Default for Shape {
    fn default() -> Self {
        Self::scalar()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]x{}", self.batch)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shape({self})")
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.dims.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self::canonical(value.into_iter().collect(), 1)
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self::from_dims(value)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self::canonical(value.into_iter().collect(), 1)
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self::canonical(iter.into_iter().collect(), 1)
    }
}

//! Core Tensor type

use super::storage::{RawBuffer, Storage};
use super::{Layout, Shape};
use crate::error::{Error, Result};
use crate::runtime::{Device, Runtime};
use std::fmt;
use std::sync::Arc;

/// Size of one element in bytes
const ELEM_SIZE: usize = std::mem::size_of::<f32>();

/// Bytes needed to store every element of `shape`
fn storage_size(shape: &Shape) -> Result<usize> {
    shape
        .checked_elem_count()
        .and_then(|n| n.checked_mul(ELEM_SIZE))
        .ok_or_else(|| Error::AllocationFailed {
            size: usize::MAX,
            reason: format!("storage for {shape} exceeds the address space"),
        })
}

/// Batched `f32` array stored on a compute device
///
/// `Tensor` is the fundamental data structure in devtensor. It consists of:
/// - **Shape**: per-sample dimensions plus the batch size
/// - **Storage**: one device allocation of exactly `shape.elem_count()` values,
///   owned by this tensor alone
/// - **Device**: an `Arc` to the device that allocated the storage
///
/// # Ownership
///
/// A tensor is move-only. It is neither `Clone` nor `Copy`, moving it hands
/// the storage to the new owner, and dropping it frees the storage through
/// its runtime exactly once. Assigning over a live tensor drops the old
/// value first, so nothing leaks.
///
/// # Layout
///
/// Values are column-major across the per-sample dimensions with the batch
/// as the outermost axis (see [`Layout`]).
///
/// # Example
///
/// ```
/// use devtensor::prelude::*;
///
/// let device = CpuRuntime::default_device();
/// let shape = Shape::new(&[2, 3], 1)?;
/// let t = Tensor::<CpuRuntime>::try_from_slice(shape, &device, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
/// assert_eq!(t.to_vector()?, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// # Ok::<(), devtensor::error::Error>(())
/// ```
pub struct Tensor<R: Runtime> {
    /// Shape, fixed for the tensor's lifetime
    shape: Shape,
    /// Device memory
    storage: Storage<R>,
}

impl<R: Runtime> Tensor<R> {
    /// Create an uninitialized tensor
    ///
    /// # Panics
    ///
    /// Panics if allocation fails. For a fallible alternative, use
    /// [`Self::try_empty`].
    pub fn empty(shape: Shape, device: &Arc<R::Device>) -> Self {
        Self::try_empty(shape, device).expect("Tensor::empty failed")
    }

    /// Create an uninitialized tensor (fallible version)
    ///
    /// Element values are unspecified until written. Allocation failures
    /// are returned unchanged, and a shape whose byte size overflows fails
    /// with [`Error::AllocationFailed`] before the device is asked.
    pub fn try_empty(shape: Shape, device: &Arc<R::Device>) -> Result<Self> {
        let size_bytes = storage_size(&shape)?;
        let storage = Storage::new(size_bytes, device)?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "{}: allocated 0x{:x} ({size_bytes} bytes) for {shape}",
                device.name(),
                storage.ptr()
            );
        }
        Ok(Self { shape, storage })
    }

    /// Create a tensor from host data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal `shape.elem_count()` or the device
    /// fails. For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice(shape: Shape, device: &Arc<R::Device>, data: &[f32]) -> Self {
        Self::try_from_slice(shape, device, data).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from host data (fallible version)
    ///
    /// `data` is laid out column-major per sample with samples one after
    /// another, and is copied, not referenced. The length is checked before
    /// anything is allocated. If the copy fails, the new storage is released
    /// before the error is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use devtensor::prelude::*;
    ///
    /// let device = CpuRuntime::default_device();
    /// let err = Tensor::<CpuRuntime>::try_from_slice(Shape::from([3]), &device, &[1.0, 2.0])
    ///     .unwrap_err();
    /// assert!(matches!(err, Error::ShapeMismatch { expected: 3, got: 2, .. }));
    /// ```
    pub fn try_from_slice(shape: Shape, device: &Arc<R::Device>, data: &[f32]) -> Result<Self> {
        if data.len() != shape.elem_count() {
            return Err(Error::shape_mismatch(&shape, data.len()));
        }

        let mut tensor = Self::try_empty(shape, device)?;
        tensor.storage.write(bytemuck::cast_slice(data))?;
        Ok(tensor)
    }

    /// Adopt storage previously released by [`Self::into_raw_parts`]
    ///
    /// # Safety
    ///
    /// `handle` must have been allocated on `device` by `R::allocate` with
    /// exactly `shape.elem_count() * 4` bytes, and nothing else may own it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AllocationFailed`] if the byte size of `shape`
    /// overflows; `handle` is then left untouched and still owned by the caller.
    pub unsafe fn from_raw_parts(shape: Shape, device: Arc<R::Device>, handle: u64) -> Result<Self> {
        let size_bytes = storage_size(&shape)?;
        // SAFETY: forwarded from the caller
        let storage = unsafe { Storage::from_raw(handle, size_bytes, device) };
        Ok(Self { shape, storage })
    }

    /// Give up ownership of the storage without freeing it
    ///
    /// The caller becomes responsible for the handle: either pass it back to
    /// [`Self::from_raw_parts`] or free it with `R::deallocate`.
    pub fn into_raw_parts(self) -> (Shape, Arc<R::Device>, u64) {
        let Self { shape, storage } = self;
        let (handle, device) = storage.into_raw();
        (shape, device, handle)
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the device that owns the storage
    #[inline]
    pub fn device(&self) -> &Arc<R::Device> {
        self.storage.device()
    }

    /// Get the storage layout
    pub fn layout(&self) -> Layout {
        Layout::of(&self.shape)
    }

    /// Size of the storage in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.storage.size_in_bytes()
    }

    /// Whether both tensors live on the same device
    pub fn is_same_device(&self, other: &Self) -> bool {
        self.device().is_same(other.device())
    }

    /// Raw storage handle for kernels that read the tensor
    #[inline]
    pub fn data(&self) -> RawBuffer<'_> {
        RawBuffer::new(self.storage.ptr(), self.shape.elem_count())
    }

    /// Raw storage handle for kernels that write the tensor
    ///
    /// Taking `&mut self` keeps every other borrow of the tensor out while the
    /// handle is in use.
    #[inline]
    pub fn data_mut(&mut self) -> RawBuffer<'_> {
        RawBuffer::new(self.storage.ptr(), self.shape.elem_count())
    }

    /// Copy all values back to the host
    ///
    /// The result has `shape().elem_count()` values in storage order.
    pub fn to_vector(&self) -> Result<Vec<f32>> {
        let mut result = vec![0f32; self.shape.elem_count()];
        self.storage.read(bytemuck::cast_slice_mut(&mut result))?;
        Ok(result)
    }

    /// Copy the values back to the host, one vector per batch sample
    pub fn to_batch_vectors(&self) -> Result<Vec<Vec<f32>>> {
        let values = self.to_vector()?;
        let layout = self.layout();
        (0..self.shape.batch())
            .map(|n| -> Result<Vec<f32>> { Ok(values[layout.batch_range(n)?].to_vec()) })
            .collect()
    }

    /// Value of a single-element tensor
    pub fn to_scalar(&self) -> Result<f32> {
        if self.shape.elem_count() != 1 {
            return Err(Error::shape_mismatch(&self.shape, 1));
        }
        let mut value = [0f32; 1];
        self.storage.read(bytemuck::cast_slice_mut(&mut value))?;
        Ok(value[0])
    }

    /// Overwrite all values from host data
    ///
    /// `data` must hold exactly `shape().elem_count()` values. Shape and
    /// storage handle are unchanged.
    pub fn write_from_slice(&mut self, data: &[f32]) -> Result<()> {
        if data.len() != self.shape.elem_count() {
            return Err(Error::shape_mismatch(&self.shape, data.len()));
        }
        self.storage.write(bytemuck::cast_slice(data))
    }

    /// Set every value to `value`
    pub fn fill(&mut self, value: f32) -> Result<()> {
        let data = vec![value; self.shape.elem_count()];
        self.storage.write(bytemuck::cast_slice(&data))
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("runtime", &R::name())
            .field("shape", &self.shape)
            .field("storage", &self.storage)
            .finish()
    }
}

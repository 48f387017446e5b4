//! Storage: exclusive ownership of one device allocation

use crate::error::Result;
use crate::runtime::{Device, Runtime};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::sync::Arc;

/// Device memory owned by exactly one tensor
///
/// Storage pairs an opaque handle with the device that allocated it and
/// releases it through the same runtime when dropped. It is not `Clone`:
/// moving a `Storage` moves the only right to free the handle.
pub(crate) struct Storage<R: Runtime> {
    /// Opaque device handle (host address or buffer id)
    ptr: u64,
    /// Size of the allocation
    size_bytes: usize,
    /// Device where memory is allocated
    device: Arc<R::Device>,
}

impl<R: Runtime> Storage<R> {
    /// Allocate `size_bytes` on `device`
    pub(crate) fn new(size_bytes: usize, device: &Arc<R::Device>) -> Result<Self> {
        let ptr = R::allocate(size_bytes, device)?;
        Ok(Self {
            ptr,
            size_bytes,
            device: Arc::clone(device),
        })
    }

    /// Adopt an existing allocation
    ///
    /// # Safety
    /// `ptr` must come from `R::allocate(size_bytes, &device)` and must not be
    /// owned by anything else.
    pub(crate) unsafe fn from_raw(ptr: u64, size_bytes: usize, device: Arc<R::Device>) -> Self {
        Self {
            ptr,
            size_bytes,
            device,
        }
    }

    /// Give up ownership without freeing
    pub(crate) fn into_raw(self) -> (u64, Arc<R::Device>) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the Arc is moved out exactly once.
        let device = unsafe { std::ptr::read(&this.device) };
        (this.ptr, device)
    }

    #[inline]
    pub(crate) fn ptr(&self) -> u64 {
        self.ptr
    }

    #[inline]
    pub(crate) fn size_in_bytes(&self) -> usize {
        self.size_bytes
    }

    #[inline]
    pub(crate) fn device(&self) -> &Arc<R::Device> {
        &self.device
    }

    /// Copy host bytes in and wait until they have landed
    pub(crate) fn write(&mut self, src: &[u8]) -> Result<()> {
        R::copy_to_device(src, self.ptr, &self.device)?;
        R::synchronize(&self.device)
    }

    /// Wait for pending work, then copy the contents out
    pub(crate) fn read(&self, dst: &mut [u8]) -> Result<()> {
        R::synchronize(&self.device)?;
        R::copy_from_device(self.ptr, dst, &self.device)
    }
}

impl<R: Runtime> Drop for Storage<R> {
    fn drop(&mut self) {
        // Device names are built on demand
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "{}: releasing 0x{:x} ({} bytes)",
                self.device.name(),
                self.ptr,
                self.size_bytes
            );
        }
        R::deallocate(self.ptr, self.size_bytes, &self.device);
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.ptr))
            .field("size_bytes", &self.size_bytes)
            .field("device", &self.device.name())
            .finish()
    }
}

/// Borrowed view of a tensor's storage handle for backend kernels
///
/// The view carries the lifetime of the tensor borrow it came from, so it
/// cannot outlive the tensor or survive a move of it. The handle itself is
/// still opaque: what it addresses depends on the runtime, and the caller
/// must never free it.
#[derive(Copy, Clone, Debug)]
pub struct RawBuffer<'a> {
    ptr: u64,
    len: usize,
    _tensor: PhantomData<&'a ()>,
}

impl<'a> RawBuffer<'a> {
    #[inline]
    pub(crate) fn new(ptr: u64, len: usize) -> Self {
        Self {
            ptr,
            len,
            _tensor: PhantomData,
        }
    }

    /// Device handle
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Number of `f32` elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len * std::mem::size_of::<f32>()
    }
}

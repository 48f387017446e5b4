//! CPU runtime implementation

use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};
use std::sync::Arc;

/// Alignment of every host allocation (AVX-512 friendly)
const ALIGN: usize = 64;

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN).map_err(|e| {
            Error::AllocationFailed {
                size: size_bytes,
                reason: e.to_string(),
            }
        })?;

        // Zeroed so that reading never observes uninitialized host memory
        let ptr = unsafe { alloc_zeroed(layout) };

        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        match AllocLayout::from_size_align(size_bytes, ALIGN) {
            Ok(layout) => unsafe { dealloc(ptr as *mut u8, layout) },
            Err(e) => log::error!("cpu: cannot free 0x{ptr:x} ({size_bytes} bytes): {e}"),
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        if dst == 0 {
            return Err(Error::device_copy("cpu", "null destination"));
        }

        log::trace!("cpu: host -> 0x{dst:x}, {} bytes", src.len());
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        if src == 0 {
            return Err(Error::device_copy("cpu", "null source"));
        }

        log::trace!("cpu: 0x{src:x} -> host, {} bytes", dst.len());
        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn default_device() -> Arc<Self::Device> {
        CpuDevice::shared()
    }
}

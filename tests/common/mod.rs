//! Common test utilities
#![allow(dead_code)]

use devtensor::error::{Error, Result};
use devtensor::runtime::{Device, Runtime};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Install a test logger once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Counting backend: host memory behind ids, with every call recorded.
// Implemented only through the public traits, as a downstream crate would.
// =============================================================================

static NEXT_ID: AtomicUsize = AtomicUsize::new(1000);

pub struct CountingDevice {
    id: usize,
    next_handle: AtomicU64,
    buffers: Mutex<HashMap<u64, Vec<u8>>>,
    allocations: AtomicUsize,
    frees: Mutex<Vec<u64>>,
    fail_allocations: AtomicBool,
    fail_copies: AtomicBool,
}

impl CountingDevice {
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            next_handle: AtomicU64::new(1),
            buffers: Mutex::new(HashMap::new()),
            allocations: AtomicUsize::new(0),
            frees: Mutex::new(Vec::new()),
            fail_allocations: AtomicBool::new(false),
            fail_copies: AtomicBool::new(false),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.lock().len()
    }

    pub fn freed_handles(&self) -> Vec<u64> {
        self.frees.lock().clone()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_copies(&self, fail: bool) {
        self.fail_copies.store(fail, Ordering::SeqCst);
    }

    /// Mimic a kernel writing `values` into the buffer behind `handle`
    pub fn kernel_write(&self, handle: u64, values: &[f32]) {
        let mut buffers = self.buffers.lock();
        let buffer = buffers.get_mut(&handle).expect("kernel on unknown buffer");
        buffer.copy_from_slice(bytemuck::cast_slice(values));
    }
}

impl Device for CountingDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        format!("counting:{}", self.id)
    }
}

#[derive(Clone)]
pub struct CountingRuntime;

impl Runtime for CountingRuntime {
    type Device = CountingDevice;

    fn name() -> &'static str {
        "counting"
    }

    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64> {
        if device.fail_allocations.load(Ordering::SeqCst) {
            return Err(Error::OutOfMemory { size: size_bytes });
        }
        let handle = device.next_handle.fetch_add(1, Ordering::SeqCst);
        device.buffers.lock().insert(handle, vec![0; size_bytes]);
        device.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn deallocate(ptr: u64, _size_bytes: usize, device: &Self::Device) {
        device.buffers.lock().remove(&ptr);
        device.frees.lock().push(ptr);
    }

    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()> {
        if device.fail_copies.load(Ordering::SeqCst) {
            return Err(Error::device_copy(device.name(), "injected failure"));
        }
        let mut buffers = device.buffers.lock();
        let buffer = buffers
            .get_mut(&dst)
            .ok_or_else(|| Error::device_copy(device.name(), "unknown buffer"))?;
        buffer[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()> {
        if device.fail_copies.load(Ordering::SeqCst) {
            return Err(Error::device_copy(device.name(), "injected failure"));
        }
        let buffers = device.buffers.lock();
        let buffer = buffers
            .get(&src)
            .ok_or_else(|| Error::device_copy(device.name(), "unknown buffer"))?;
        dst.copy_from_slice(&buffer[..dst.len()]);
        Ok(())
    }

    fn default_device() -> Arc<Self::Device> {
        CountingDevice::shared()
    }
}

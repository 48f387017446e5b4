//! Core trait for compute backends

use std::sync::Arc;

/// Core trait for compute backends
///
/// `Runtime` abstracts over different memory backends (host RAM, accelerator
/// pools, ...). It uses static dispatch via generics for zero-cost
/// abstraction: a runtime is a zero-sized backend identity whose associated
/// functions act on a concrete [`Runtime::Device`].
///
/// Handles returned by [`allocate`](Runtime::allocate) are opaque `u64`
/// values. For host memory they are addresses; other backends may use buffer
/// ids, so callers must never do arithmetic on them.
///
/// # Example
///
/// ```
/// use devtensor::runtime::Runtime;
/// use devtensor::runtime::cpu::CpuRuntime;
///
/// let device = CpuRuntime::default_device();
/// let ptr = CpuRuntime::allocate(1024, &device).unwrap();
/// // ... use memory ...
/// CpuRuntime::deallocate(ptr, 1024, &device);
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device type
    type Device: super::Device;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate device memory
    ///
    /// Returns an opaque handle to at least `size_bytes` bytes.
    /// Returns `Err(OutOfMemory)` or `Err(AllocationFailed)` if allocation fails.
    fn allocate(size_bytes: usize, device: &Self::Device) -> crate::error::Result<u64>;

    /// Deallocate device memory
    ///
    /// Called at most once per handle. Must not panic; anomalies are logged.
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    ///
    /// Returns an error if the transfer fails. The write may still be queued
    /// on return; [`synchronize`](Runtime::synchronize) completes it.
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> crate::error::Result<()>;

    /// Copy data from device to host
    ///
    /// Blocks until `dst` holds the data. Returns an error if the transfer fails.
    fn copy_from_device(
        src: u64,
        dst: &mut [u8],
        device: &Self::Device,
    ) -> crate::error::Result<()>;

    /// Wait for all pending operations on `device` to complete
    fn synchronize(_device: &Self::Device) -> crate::error::Result<()> {
        Ok(())
    }

    /// Get the default device
    fn default_device() -> Arc<Self::Device>;
}

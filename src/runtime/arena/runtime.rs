//! Arena runtime implementation

use super::config::ArenaConfig;
use super::device::ArenaDevice;
use crate::error::Result;
use crate::runtime::Runtime;
use std::sync::Arc;
use std::sync::OnceLock;

/// Runtime for [`ArenaDevice`] pools
#[derive(Clone, Debug, Default)]
pub struct ArenaRuntime;

impl Runtime for ArenaRuntime {
    type Device = ArenaDevice;

    fn name() -> &'static str {
        "arena"
    }

    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64> {
        device.allocate(size_bytes)
    }

    fn deallocate(ptr: u64, _size_bytes: usize, device: &Self::Device) {
        device.release(ptr);
    }

    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()> {
        device.write(dst, src)
    }

    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()> {
        device.read(src, dst)
    }

    fn synchronize(device: &Self::Device) -> Result<()> {
        device.flush()
    }

    /// Process-wide unbounded arena
    fn default_device() -> Arc<Self::Device> {
        static DEFAULT: OnceLock<Arc<ArenaDevice>> = OnceLock::new();
        Arc::clone(DEFAULT.get_or_init(|| Arc::new(ArenaDevice::new(ArenaConfig::new()))))
    }
}

//! Arena runtime: handle-addressed device memory
//!
//! Storage lives in a per-device pool and is named by opaque non-zero
//! buffer ids, the way accelerator APIs hand out buffer objects rather than
//! host pointers. The arena is useful as an accelerator stand-in: it can be
//! bounded, taken offline, and made to queue writes, and it counts every
//! allocation and free.

mod config;
mod device;
mod runtime;

pub use config::ArenaConfig;
pub use device::{ArenaDevice, ArenaStats};
pub use runtime::ArenaRuntime;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runtime::{Device, Runtime};

    #[test]
    fn test_handles_are_opaque_ids() {
        let device = ArenaDevice::new(ArenaConfig::new());
        let a = ArenaRuntime::allocate(16, &device).unwrap();
        let b = ArenaRuntime::allocate(0, &device).unwrap();
        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert_ne!(a, b);
        assert_eq!(device.stats().live_buffers, 2);
        ArenaRuntime::deallocate(a, 16, &device);
        ArenaRuntime::deallocate(b, 0, &device);
        assert_eq!(device.stats().live_buffers, 0);
    }

    #[test]
    fn test_capacity_limit() {
        let device = ArenaDevice::new(ArenaConfig::new().capacity(32));
        let a = ArenaRuntime::allocate(24, &device).unwrap();
        assert!(matches!(
            ArenaRuntime::allocate(16, &device),
            Err(Error::OutOfMemory { size: 16 })
        ));
        ArenaRuntime::deallocate(a, 24, &device);
        let b = ArenaRuntime::allocate(32, &device).unwrap();
        assert_eq!(device.stats().peak_bytes, 32);
        ArenaRuntime::deallocate(b, 32, &device);
    }

    #[test]
    fn test_unsatisfiable_requests_are_out_of_memory() {
        // Running total would overflow usize
        let bounded = ArenaDevice::new(ArenaConfig::new().capacity(64));
        let a = ArenaRuntime::allocate(8, &bounded).unwrap();
        assert!(matches!(
            ArenaRuntime::allocate(usize::MAX, &bounded),
            Err(Error::OutOfMemory { size: usize::MAX })
        ));

        // No capacity set, but the host cannot reserve that much
        let unbounded = ArenaDevice::new(ArenaConfig::new());
        let huge = 1usize << 63;
        assert!(matches!(
            ArenaRuntime::allocate(huge, &unbounded),
            Err(Error::OutOfMemory { size }) if size == huge
        ));
        assert_eq!(unbounded.stats().live_buffers, 0);
        assert_eq!(unbounded.stats().allocations, 0);

        ArenaRuntime::deallocate(a, 8, &bounded);
        assert_eq!(bounded.stats().bytes_in_use, 0);
    }

    #[test]
    fn test_double_free_is_logged_not_fatal() {
        let device = ArenaDevice::new(ArenaConfig::new());
        let a = ArenaRuntime::allocate(8, &device).unwrap();
        ArenaRuntime::deallocate(a, 8, &device);
        ArenaRuntime::deallocate(a, 8, &device);
        let stats = device.stats();
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.invalid_frees, 1);
    }

    #[test]
    fn test_offline_device() {
        let device = ArenaDevice::new(ArenaConfig::new());
        let a = ArenaRuntime::allocate(4, &device).unwrap();
        device.set_online(false);

        assert!(matches!(
            ArenaRuntime::copy_to_device(&[1, 2, 3, 4], a, &device),
            Err(Error::DeviceCopy { .. })
        ));
        let mut out = [0u8; 4];
        assert!(ArenaRuntime::copy_from_device(a, &mut out, &device).is_err());
        assert!(matches!(
            ArenaRuntime::synchronize(&device),
            Err(Error::DeviceCopy { .. })
        ));
        assert!(ArenaRuntime::allocate(4, &device).unwrap_err().is_allocation());

        // Frees never fail
        ArenaRuntime::deallocate(a, 4, &device);
        assert_eq!(device.stats().frees, 1);
    }

    #[test]
    fn test_deferred_writes_land_on_synchronize() {
        let device = ArenaDevice::new(ArenaConfig::new().deferred_writes(true));
        let a = ArenaRuntime::allocate(4, &device).unwrap();
        ArenaRuntime::copy_to_device(&[9, 8, 7, 6], a, &device).unwrap();
        assert_eq!(device.stats().pending_writes, 1);

        ArenaRuntime::synchronize(&device).unwrap();
        assert_eq!(device.stats().pending_writes, 0);
        let first = device.with_buffer_mut(a, |bytes| bytes[0]).unwrap();
        assert_eq!(first, 9);
        ArenaRuntime::deallocate(a, 4, &device);
    }

    #[test]
    fn test_oversized_write_rejected() {
        let device = ArenaDevice::new(ArenaConfig::new());
        let a = ArenaRuntime::allocate(2, &device).unwrap();
        assert!(ArenaRuntime::copy_to_device(&[1, 2, 3], a, &device).is_err());
        ArenaRuntime::deallocate(a, 2, &device);
    }

    #[test]
    fn test_device_identity() {
        let a = ArenaDevice::new(ArenaConfig::new());
        let b = ArenaDevice::new(ArenaConfig::new().label("gpu-sim"));
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a));
        assert_ne!(a.id(), 0);
        assert_eq!(b.name(), "gpu-sim");
        assert_eq!(a.name(), format!("arena:{}", a.id()));
    }
}

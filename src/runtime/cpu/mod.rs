//! CPU runtime implementation
//!
//! The CPU runtime keeps tensor storage in host RAM. Handles are plain
//! addresses of 64-byte aligned heap blocks, and copies are synchronous
//! `memcpy`s, so [`Runtime::synchronize`](crate::runtime::Runtime::synchronize)
//! has nothing to wait for.

mod device;
mod runtime;

pub use device::CpuDevice;
pub use runtime::CpuRuntime;

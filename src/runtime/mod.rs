//! Runtime backends for tensor storage
//!
//! This module defines the `Runtime` and `Device` traits and provides
//! implementations for different memory backends.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity, zero-sized)
//! ├── allocate / deallocate   (opaque u64 handles)
//! ├── copy_to_device / copy_from_device
//! ├── synchronize             (completes queued work)
//! └── Device (shared capability object with a stable identity)
//! ```

pub mod cpu;

#[cfg(feature = "arena")]
pub mod arena;

mod traits;

pub use traits::{Device, Runtime};

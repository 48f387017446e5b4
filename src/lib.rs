//! # devtensor
//!
//! **Device-backed tensor handles with explicit backend memory ownership.**
//!
//! devtensor provides a batched `f32` tensor whose storage is allocated,
//! copied and freed through an interchangeable runtime backend. The tensor
//! is an ordinary move-only Rust value: return it, store it in a `Vec`,
//! move it between threads. Its device memory is released exactly once, by
//! whichever owner drops it last.
//!
//! ## Features
//!
//! - **Shapes with a batch axis**: per-sample dimensions plus batch size
//! - **Fixed layout**: column-major per sample, batch outermost
//! - **Pluggable backends**: implement [`runtime::Runtime`] for new memory
//! - **Host round-trip**: construct from and copy back to `Vec<f32>`
//! - **Raw handles**: lifetime-bound storage access for backend kernels
//!
//! ## Quick Start
//!
//! ```rust
//! use devtensor::prelude::*;
//!
//! let device = CpuRuntime::default_device();
//! let shape = Shape::new(&[2, 3], 2)?;
//! let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
//!
//! let t = Tensor::<CpuRuntime>::try_from_slice(shape, &device, &data)?;
//! assert_eq!(t.to_vector()?, data);
//! assert_eq!(t.to_batch_vectors()?[1], &data[6..]);
//! # Ok::<(), devtensor::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `arena` (default): handle-addressed memory pool backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::runtime::cpu::{CpuDevice, CpuRuntime};
    pub use crate::runtime::{Device, Runtime};
    pub use crate::tensor::{Layout, Shape, Tensor};

    #[cfg(feature = "arena")]
    pub use crate::runtime::arena::{ArenaConfig, ArenaDevice, ArenaRuntime};
}

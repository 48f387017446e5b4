//! Tensor types
//!
//! This module provides the core `Tensor` type, a move-only handle to a
//! batched `f32` array whose memory is owned by a runtime device, together
//! with the `Shape` and `Layout` types that describe it.

mod core;
mod layout;
mod shape;
mod storage;

pub use core::Tensor;
pub use layout::{Layout, Strides};
pub use shape::Shape;
pub use storage::RawBuffer;

//! Error types for devtensor

use crate::tensor::Shape;
use thiserror::Error;

/// Result type alias using devtensor's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating, filling or reading tensors
#[derive(Error, Debug)]
pub enum Error {
    /// Host data length does not match the element count of a shape
    #[error("Shape mismatch: shape {shape} holds {expected} elements, got {got}")]
    ShapeMismatch {
        /// Declared shape
        shape: Shape,
        /// Element count required by the shape (batch included)
        expected: usize,
        /// Number of values actually supplied
        got: usize,
    },

    /// Shape description is not valid
    #[error("Invalid shape: {reason}")]
    InvalidShape {
        /// Why the shape was rejected
        reason: String,
    },

    /// Index out of bounds
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Size of the dimension
        size: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Allocation refused for a reason other than memory exhaustion
    #[error("Allocation of {size} bytes failed: {reason}")]
    AllocationFailed {
        /// Requested size in bytes
        size: usize,
        /// Backend-provided reason
        reason: String,
    },

    /// Host/device transfer failed
    #[error("Copy on device '{device}' failed: {reason}")]
    DeviceCopy {
        /// Name of the device involved in the transfer
        device: String,
        /// Backend-provided reason
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error for host data of length `got`
    pub fn shape_mismatch(shape: &Shape, got: usize) -> Self {
        Self::ShapeMismatch {
            shape: shape.clone(),
            expected: shape.elem_count(),
            got,
        }
    }

    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a device copy error
    pub fn device_copy(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeviceCopy {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the allocator
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. } | Self::AllocationFailed { .. })
    }
}

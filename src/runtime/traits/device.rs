//! Trait for device identification

/// Trait for device identification
///
/// A device is the long-lived capability object that backs tensor storage.
/// Tensors hold it through an `Arc`, so it must be shareable across threads
/// and outlives every tensor allocated on it.
pub trait Device: Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

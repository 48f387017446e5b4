//! Arena device configuration

/// Configuration for an [`ArenaDevice`](super::ArenaDevice)
///
/// # Example
///
/// ```
/// use devtensor::runtime::arena::ArenaConfig;
/// let config = ArenaConfig::new()
///     .capacity(1 << 20)
///     .deferred_writes(true)
///     .label("scratch");
/// assert_eq!(config.capacity_bytes, Some(1 << 20));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Upper bound on live bytes; `None` means unbounded
    pub capacity_bytes: Option<usize>,
    /// Queue host-to-device writes until the device is synchronized
    pub deferred_writes: bool,
    /// Name reported by the device; defaults to `arena:<id>`
    pub label: Option<String>,
}

impl ArenaConfig {
    /// Unbounded, immediate-write configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of live bytes
    pub fn capacity(mut self, bytes: usize) -> Self {
        self.capacity_bytes = Some(bytes);
        self
    }

    /// Enable or disable queued host-to-device writes
    pub fn deferred_writes(mut self, enabled: bool) -> Self {
        self.deferred_writes = enabled;
        self
    }

    /// Set the device name
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

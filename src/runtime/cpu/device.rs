//! CPU device implementation

use crate::runtime::Device;
use std::sync::Arc;
use std::sync::OnceLock;

/// CPU device (there's only one: the host CPU)
#[derive(Clone, Debug, Default)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Create a new CPU device
    pub fn new() -> Self {
        Self { id: 0 }
    }

    /// Process-wide shared CPU device
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<CpuDevice>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(CpuDevice::new())))
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}

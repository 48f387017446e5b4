//! Arena device: a handle-addressed memory pool

use super::config::ArenaConfig;
use crate::error::{Error, Result};
use crate::runtime::Device;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counter for arena device ids. Id 0 belongs to the CPU device.
static NEXT_DEVICE_ID: AtomicUsize = AtomicUsize::new(1);

/// Memory pool that hands out opaque buffer ids instead of addresses
///
/// The arena behaves like accelerator memory seen from the host: storage is
/// only reachable through its handle, transfers go through explicit copies,
/// and the device can be taken offline to make every transfer fail. With
/// [`ArenaConfig::deferred_writes`] enabled, host-to-device copies are queued
/// and only land on [`ArenaRuntime::synchronize`](super::ArenaRuntime) or on
/// the next read, like work submitted to an in-order stream.
pub struct ArenaDevice {
    id: usize,
    name: String,
    config: ArenaConfig,
    online: AtomicBool,
    state: Mutex<ArenaState>,
}

#[derive(Default)]
struct ArenaState {
    buffers: HashMap<u64, Box<[u8]>>,
    pending: Vec<(u64, Vec<u8>)>,
    next_handle: u64,
    bytes_in_use: usize,
    peak_bytes: usize,
    allocations: usize,
    frees: usize,
    invalid_frees: usize,
}

impl ArenaState {
    fn flush(&mut self) {
        for (handle, bytes) in self.pending.drain(..) {
            if let Some(buffer) = self.buffers.get_mut(&handle) {
                buffer[..bytes.len()].copy_from_slice(&bytes);
            }
        }
    }
}

/// Snapshot of an arena's allocation counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Successful allocations so far
    pub allocations: usize,
    /// Successful frees so far
    pub frees: usize,
    /// Frees of handles that were not live (double free, foreign handle)
    pub invalid_frees: usize,
    /// Buffers currently allocated
    pub live_buffers: usize,
    /// Bytes currently allocated
    pub bytes_in_use: usize,
    /// Highest `bytes_in_use` observed
    pub peak_bytes: usize,
    /// Host-to-device writes queued but not yet applied
    pub pending_writes: usize,
}

impl ArenaDevice {
    /// Create a new arena device
    pub fn new(config: ArenaConfig) -> Self {
        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);
        let name = config
            .label
            .clone()
            .unwrap_or_else(|| format!("arena:{id}"));
        Self {
            id,
            name,
            config,
            online: AtomicBool::new(true),
            state: Mutex::new(ArenaState {
                next_handle: 1,
                ..ArenaState::default()
            }),
        }
    }

    /// Configuration this device was created with
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Take the device offline (or bring it back)
    ///
    /// While offline, allocations and transfers fail. Frees still succeed.
    pub fn set_online(&self, online: bool) {
        if !online {
            log::warn!("{}: device taken offline", self.name);
        }
        self.online.store(online, Ordering::Release);
    }

    /// Whether the device accepts allocations and transfers
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Current allocation counters
    pub fn stats(&self) -> ArenaStats {
        let state = self.state.lock();
        ArenaStats {
            allocations: state.allocations,
            frees: state.frees,
            invalid_frees: state.invalid_frees,
            live_buffers: state.buffers.len(),
            bytes_in_use: state.bytes_in_use,
            peak_bytes: state.peak_bytes,
            pending_writes: state.pending.len(),
        }
    }

    /// Run `f` on the bytes behind `handle`
    ///
    /// This is the arena's kernel entry point: code holding a tensor's raw
    /// buffer reads and writes its storage through here. Queued writes are
    /// applied first.
    pub fn with_buffer_mut<T>(&self, handle: u64, f: impl FnOnce(&mut [u8]) -> T) -> Result<T> {
        self.ensure_online("buffer access")?;
        let mut state = self.state.lock();
        state.flush();
        match state.buffers.get_mut(&handle) {
            Some(buffer) => Ok(f(&mut buffer[..])),
            None => Err(self.unknown_handle(handle)),
        }
    }

    pub(crate) fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if !self.is_online() {
            return Err(Error::AllocationFailed {
                size: size_bytes,
                reason: format!("{} is offline", self.name),
            });
        }

        let mut state = self.state.lock();
        let Some(in_use) = state.bytes_in_use.checked_add(size_bytes) else {
            return Err(Error::OutOfMemory { size: size_bytes });
        };
        if self.config.capacity_bytes.is_some_and(|capacity| in_use > capacity) {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        // Host refusal is reported, not aborted on
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size_bytes)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;
        buffer.resize(size_bytes, 0u8);

        let handle = state.next_handle;
        state.next_handle += 1;
        state.buffers.insert(handle, buffer.into_boxed_slice());
        state.bytes_in_use = in_use;
        state.peak_bytes = state.peak_bytes.max(state.bytes_in_use);
        state.allocations += 1;
        log::trace!("{}: allocated buffer {handle} ({size_bytes} bytes)", self.name);
        Ok(handle)
    }

    pub(crate) fn release(&self, handle: u64) {
        let mut state = self.state.lock();
        match state.buffers.remove(&handle) {
            Some(buffer) => {
                state.pending.retain(|(target, _)| *target != handle);
                state.bytes_in_use -= buffer.len();
                state.frees += 1;
                log::trace!("{}: released buffer {handle}", self.name);
            }
            None => {
                state.invalid_frees += 1;
                log::error!("{}: free of unknown buffer {handle}", self.name);
            }
        }
    }

    pub(crate) fn write(&self, handle: u64, src: &[u8]) -> Result<()> {
        self.ensure_online("host to device copy")?;
        let mut state = self.state.lock();
        let len = match state.buffers.get(&handle) {
            Some(buffer) => buffer.len(),
            None => return Err(self.unknown_handle(handle)),
        };
        if src.len() > len {
            return Err(Error::device_copy(
                &self.name,
                format!("{} bytes do not fit buffer {handle} of {len} bytes", src.len()),
            ));
        }

        if self.config.deferred_writes {
            state.pending.push((handle, src.to_vec()));
        } else if let Some(buffer) = state.buffers.get_mut(&handle) {
            buffer[..src.len()].copy_from_slice(src);
        }
        Ok(())
    }

    pub(crate) fn read(&self, handle: u64, dst: &mut [u8]) -> Result<()> {
        self.ensure_online("device to host copy")?;
        let mut state = self.state.lock();
        state.flush();
        let buffer = match state.buffers.get(&handle) {
            Some(buffer) => buffer,
            None => return Err(self.unknown_handle(handle)),
        };
        if dst.len() > buffer.len() {
            return Err(Error::device_copy(
                &self.name,
                format!(
                    "read of {} bytes exceeds buffer {handle} of {} bytes",
                    dst.len(),
                    buffer.len()
                ),
            ));
        }
        dst.copy_from_slice(&buffer[..dst.len()]);
        Ok(())
    }

    pub(crate) fn flush(&self) -> Result<()> {
        self.ensure_online("synchronize")?;
        self.state.lock().flush();
        Ok(())
    }

    fn ensure_online(&self, op: &str) -> Result<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(Error::device_copy(&self.name, format!("{op} on offline device")))
        }
    }

    fn unknown_handle(&self, handle: u64) -> Error {
        Error::device_copy(&self.name, format!("unknown buffer {handle}"))
    }
}

impl Device for ArenaDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

impl std::fmt::Debug for ArenaDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("online", &self.is_online())
            .field("stats", &self.stats())
            .finish()
    }
}

//! Native sink handles and their ownership.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::trace;

use crate::backend::TrackBackend;
use crate::VideoSink;

/// Opaque token for a sink resource allocated by the native side.
///
/// Zero is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeSinkHandle(NonZeroU64);

impl NativeSinkHandle {
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    pub fn as_raw(self) -> u64 {
        self.0.get()
    }

    /// Arena handles keep the slot index in the low half and a non-zero
    /// generation in the high half.
    pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
        debug_assert!(generation != 0);
        let raw = (u64::from(generation) << 32) | u64::from(index);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    pub(crate) fn index(self) -> u32 {
        self.as_raw() as u32
    }

    pub(crate) fn generation(self) -> u32 {
        (self.as_raw() >> 32) as u32
    }
}

impl fmt::Display for NativeSinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.as_raw())
    }
}

/// Identity of a shared object, taken from its allocation address.
///
/// Two equal-valued sinks in separate allocations get different keys.
/// Whoever stores a key must also keep the `Arc` alive, or the address
/// could be reused by a later allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct IdentityKey(usize);

impl IdentityKey {
    pub(crate) fn of<T: ?Sized>(value: &Arc<T>) -> Self {
        Self(Arc::as_ptr(value) as *const () as usize)
    }
}

/// A sink wrapped into a native handle, owned by one registry entry.
///
/// Releasing unregisters the handle from delivery and then frees it. That
/// happens once, either through [`release`](Self::release) or on drop.
pub(crate) struct SinkRegistration {
    sink: Arc<dyn VideoSink>,
    handle: Option<NativeSinkHandle>,
    backend: Arc<dyn TrackBackend>,
}

impl SinkRegistration {
    pub(crate) fn new(
        sink: Arc<dyn VideoSink>,
        handle: NativeSinkHandle,
        backend: Arc<dyn TrackBackend>,
    ) -> Self {
        Self {
            sink,
            handle: Some(handle),
            backend,
        }
    }

    pub(crate) fn sink(&self) -> &Arc<dyn VideoSink> {
        &self.sink
    }

    pub(crate) fn handle(&self) -> Option<NativeSinkHandle> {
        self.handle
    }

    pub(crate) fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.remove_sink(handle);
            self.backend.free_sink(handle);
            trace!(%handle, "native sink released");
        }
    }
}

impl Drop for SinkRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

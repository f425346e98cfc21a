use std::sync::Arc;

use crate::{NativeSinkHandle, TrackError, VideoSink};

/// The native side of a video track.
///
/// The track calls these from its control thread. Frames are delivered
/// by the backend on its own thread to every registered handle.
pub trait TrackBackend: Send + Sync {
    /// Identifier of the underlying native track.
    fn id(&self) -> String;

    /// Allocate a native sink resource that forwards frames to `sink`.
    fn wrap_sink(&self, sink: Arc<dyn VideoSink>) -> Result<NativeSinkHandle, TrackError>;

    /// Start delivering frames to `handle`.
    fn add_sink(&self, handle: NativeSinkHandle);

    /// Stop delivering frames to `handle`.
    ///
    /// Must not return until any delivery to `handle` already in progress
    /// has finished; the handle is freed right after.
    fn remove_sink(&self, handle: NativeSinkHandle);

    /// Free a resource returned by [`wrap_sink`](Self::wrap_sink).
    fn free_sink(&self, handle: NativeSinkHandle);

    fn enabled(&self) -> bool;

    /// Returns whether the native track accepted the change.
    fn set_enabled(&self, enabled: bool) -> bool;

    /// A new track now shares this backend. Each retain is balanced by
    /// one [`release`](Self::release).
    fn retain(&self) {}

    /// Release one track's hold on the native side. Implementations shared
    /// between tracks free themselves on the last release.
    fn release(&self);
}

//! Video track sink registry
//!
//! A [`VideoTrack`] maps each attached frame consumer to the native sink
//! handle created for it, and guarantees that every handle is unregistered
//! from delivery before it is freed, exactly once. The native side sits
//! behind [`TrackBackend`]; [`LocalVideoSource`] implements it in-process.

use thiserror::Error;

mod arena;
mod backend;
mod frame;
mod handle;
mod local;
mod track;

pub use arena::SinkArena;
pub use backend::TrackBackend;
pub use frame::{PixelFormat, VideoFrame};
pub use handle::NativeSinkHandle;
pub use local::LocalVideoSource;
pub use track::{TrackState, VideoTrack};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    #[error("sink is already attached to track {track}")]
    SinkAlreadyAttached { track: String },
    #[error("renderer is already attached to track {track}")]
    RendererAlreadyAttached { track: String },
    #[error("track {0} has been disposed")]
    Disposed(String),
    #[error("failed to wrap sink: {0}")]
    WrapFailed(String),
}

/// Receives decoded frames.
///
/// Called on the delivery thread, not the thread that attached the sink.
pub trait VideoSink: Send + Sync {
    fn on_frame(&self, frame: &VideoFrame);
}

/// Legacy consumer that owns a native handle allocated outside the track.
///
/// The renderer owns its handle: it must obtain it from the same backend's
/// [`TrackBackend::wrap_sink`], and free it with
/// [`TrackBackend::free_sink`] from [`dispose`](Self::dispose).
pub trait VideoRenderer: Send + Sync {
    /// Handle returned by the track backend's `wrap_sink`. A handle the
    /// backend did not allocate receives no frames.
    fn native_handle(&self) -> NativeSinkHandle;

    /// Free the renderer's native resources, including its sink handle.
    /// Called once, after delivery to its handle has stopped.
    fn dispose(&self);
}

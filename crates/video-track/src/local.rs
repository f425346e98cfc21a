//! In-process implementation of the native track side.
//!
//! Delivery runs under a read lock over the registered handles while
//! attach/detach take the write lock, so once `remove_sink` returns no
//! frame is still being handed to that sink.

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::arena::SinkArena;
use crate::backend::TrackBackend;
use crate::{NativeSinkHandle, TrackError, VideoFrame, VideoSink};

#[derive(Default)]
struct SourceState {
    arena: SinkArena<Arc<dyn VideoSink>>,
    active: Vec<NativeSinkHandle>,
}

pub struct LocalVideoSource {
    id: String,
    state: RwLock<SourceState>,
    enabled: AtomicBool,
    released: AtomicBool,
    tracks: AtomicUsize,
}

impl Default for LocalVideoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalVideoSource {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: RwLock::new(SourceState::default()),
            enabled: AtomicBool::new(true),
            released: AtomicBool::new(false),
            tracks: AtomicUsize::new(0),
        }
    }

    /// Handles currently receiving frames.
    pub fn active_sinks(&self) -> usize {
        self.state.read().active.len()
    }

    /// Native sink resources allocated and not yet freed.
    pub fn allocated_sinks(&self) -> usize {
        self.state.read().arena.len()
    }

    /// Tracks that retained this source and have not released it.
    pub fn track_count(&self) -> usize {
        self.tracks.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Hand `frame` to every registered sink. Returns how many received it.
    ///
    /// Sinks must not attach or detach from inside `on_frame`.
    pub fn deliver(&self, frame: &VideoFrame) -> usize {
        if !self.enabled.load(Ordering::SeqCst) || self.is_released() {
            return 0;
        }
        let state = self.state.read();
        let mut delivered = 0;
        for &handle in &state.active {
            if let Some(sink) = state.arena.get(handle) {
                sink.on_frame(frame);
                delivered += 1;
            }
        }
        delivered
    }

    /// Run delivery on a dedicated thread until `frames` disconnects.
    ///
    /// The thread returns the total number of per-sink deliveries.
    pub fn spawn_pump(
        self: &Arc<Self>,
        frames: Receiver<VideoFrame>,
    ) -> std::io::Result<thread::JoinHandle<usize>> {
        let source = Arc::clone(self);
        thread::Builder::new()
            .name(format!("video-delivery-{}", source.id))
            .spawn(move || {
                let mut total = 0;
                for frame in frames.iter() {
                    total += source.deliver(&frame);
                }
                debug!(source = %source.id, total, "delivery pump finished");
                total
            })
    }
}

impl TrackBackend for LocalVideoSource {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn wrap_sink(&self, sink: Arc<dyn VideoSink>) -> Result<NativeSinkHandle, TrackError> {
        if self.is_released() {
            return Err(TrackError::WrapFailed(format!(
                "source {} already released",
                self.id
            )));
        }
        Ok(self.state.write().arena.insert(sink))
    }

    fn add_sink(&self, handle: NativeSinkHandle) {
        let mut state = self.state.write();
        if !state.arena.contains(handle) {
            warn!(source = %self.id, %handle, "add_sink for unknown handle ignored");
            return;
        }
        if !state.active.contains(&handle) {
            state.active.push(handle);
        }
    }

    fn remove_sink(&self, handle: NativeSinkHandle) {
        self.state.write().active.retain(|&h| h != handle);
    }

    fn free_sink(&self, handle: NativeSinkHandle) {
        let mut state = self.state.write();
        if state.active.contains(&handle) {
            warn!(source = %self.id, %handle, "freeing a sink that is still registered");
            state.active.retain(|&h| h != handle);
        }
        if state.arena.remove(handle).is_none() {
            warn!(source = %self.id, %handle, "free_sink for unknown or stale handle");
        }
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) -> bool {
        if self.is_released() {
            return false;
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        true
    }

    fn retain(&self) {
        self.tracks.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        let remaining = match self
            .tracks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        };
        if remaining > 0 {
            debug!(source = %self.id, remaining, "track released, source still shared");
            return;
        }
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut state = self.state.write();
        state.active.clear();
        let leaked = state.arena.drain().len();
        if leaked > 0 {
            warn!(source = %self.id, leaked, "released source with sinks still allocated");
        }
        info!(source = %self.id, "video source released");
    }
}

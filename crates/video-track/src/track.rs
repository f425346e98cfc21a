//! Video track with its sink and renderer registry.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::TrackBackend;
use crate::handle::{IdentityKey, SinkRegistration};
use crate::{NativeSinkHandle, TrackError, VideoRenderer, VideoSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// A video track and the consumers attached to it.
///
/// Sinks are keyed by the identity of their `Arc`, never by value. Each
/// attached sink owns exactly one native handle, released on
/// [`remove_sink`](Self::remove_sink), on [`dispose`](Self::dispose), or
/// when the track is dropped.
///
/// Mutation takes `&mut self`: one control thread owns the registry.
pub struct VideoTrack {
    backend: Arc<dyn TrackBackend>,
    id: String,
    sinks: HashMap<IdentityKey, SinkRegistration>,
    renderers: Vec<Arc<dyn VideoRenderer>>,
    disposed: bool,
}

impl VideoTrack {
    pub const KIND: &'static str = "video";

    pub fn new(backend: Arc<dyn TrackBackend>) -> Self {
        let id = backend.id();
        backend.retain();
        debug!(track = %id, "video track created");
        Self {
            backend,
            id,
            sinks: HashMap::new(),
            renderers: Vec::new(),
            disposed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    pub fn state(&self) -> TrackState {
        if self.disposed {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    pub fn enabled(&self) -> bool {
        !self.disposed && self.backend.enabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<bool, TrackError> {
        self.ensure_live()?;
        Ok(self.backend.set_enabled(enabled))
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_attached(&self, sink: &Arc<dyn VideoSink>) -> bool {
        self.sinks.contains_key(&IdentityKey::of(sink))
    }

    /// Native handle currently owned for `sink`, if attached.
    pub fn native_handle(&self, sink: &Arc<dyn VideoSink>) -> Option<NativeSinkHandle> {
        self.sinks
            .get(&IdentityKey::of(sink))
            .and_then(SinkRegistration::handle)
    }

    /// Attached sinks, in no particular order.
    pub fn sinks(&self) -> Vec<Arc<dyn VideoSink>> {
        self.sinks
            .values()
            .map(|registration| registration.sink().clone())
            .collect()
    }

    /// Wrap `sink` in a native handle and start delivering frames to it.
    ///
    /// A sink that is already attached is rejected without allocating.
    pub fn add_sink(&mut self, sink: Arc<dyn VideoSink>) -> Result<(), TrackError> {
        self.ensure_live()?;
        let key = IdentityKey::of(&sink);
        if self.sinks.contains_key(&key) {
            warn!(track = %self.id, "sink already attached");
            return Err(TrackError::SinkAlreadyAttached {
                track: self.id.clone(),
            });
        }

        let handle = self.backend.wrap_sink(sink.clone())?;
        self.sinks.insert(
            key,
            SinkRegistration::new(sink, handle, self.backend.clone()),
        );
        self.backend.add_sink(handle);
        debug!(track = %self.id, %handle, sinks = self.sinks.len(), "sink attached");
        Ok(())
    }

    /// Stop delivery to `sink` and free its native handle.
    ///
    /// Returns false, touching nothing, if the sink was not attached.
    pub fn remove_sink(&mut self, sink: &Arc<dyn VideoSink>) -> bool {
        let key = IdentityKey::of(sink);
        let Some(registration) = self.sinks.get_mut(&key) else {
            return false;
        };
        registration.release();
        self.sinks.remove(&key);
        debug!(track = %self.id, sinks = self.sinks.len(), "sink detached");
        true
    }

    /// Attach a renderer that brings its own native handle.
    pub fn add_renderer(&mut self, renderer: Arc<dyn VideoRenderer>) -> Result<(), TrackError> {
        self.ensure_live()?;
        let key = IdentityKey::of(&renderer);
        if self.renderers.iter().any(|r| IdentityKey::of(r) == key) {
            return Err(TrackError::RendererAlreadyAttached {
                track: self.id.clone(),
            });
        }
        let handle = renderer.native_handle();
        self.renderers.push(renderer);
        self.backend.add_sink(handle);
        debug!(track = %self.id, %handle, "renderer attached");
        Ok(())
    }

    /// Stop delivery to `renderer` and dispose it. No-op if not attached.
    pub fn remove_renderer(&mut self, renderer: &Arc<dyn VideoRenderer>) -> bool {
        let key = IdentityKey::of(renderer);
        let Some(pos) = self.renderers.iter().position(|r| IdentityKey::of(r) == key) else {
            return false;
        };
        let renderer = self.renderers.remove(pos);
        self.backend.remove_sink(renderer.native_handle());
        renderer.dispose();
        true
    }

    /// Detach every renderer and sink, then release the native track.
    ///
    /// Calling this again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let renderers = self.renderers.len();
        for renderer in self.renderers.drain(..) {
            self.backend.remove_sink(renderer.native_handle());
            renderer.dispose();
        }
        let sinks = self.sinks.len();
        for (_, mut registration) in self.sinks.drain() {
            registration.release();
        }
        self.backend.release();
        self.disposed = true;
        info!(track = %self.id, renderers, sinks, "video track disposed");
    }

    fn ensure_live(&self) -> Result<(), TrackError> {
        if self.disposed {
            Err(TrackError::Disposed(self.id.clone()))
        } else {
            Ok(())
        }
    }
}

impl Drop for VideoTrack {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for VideoTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTrack")
            .field("id", &self.id)
            .field("sinks", &self.sinks.len())
            .field("renderers", &self.renderers.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

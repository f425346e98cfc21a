/// Sink and renderer lifecycle against a recording backend
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use video_track::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Wrap(u64),
    Add(u64),
    Remove(u64),
    Free(u64),
    Release,
}

#[derive(Default)]
struct RecordingBackend {
    ops: Mutex<Vec<Op>>,
    next: AtomicU64,
    enabled: AtomicBool,
}

impl RecordingBackend {
    fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    fn push(&self, op: Op) {
        self.ops.lock().push(op);
    }
}

impl TrackBackend for RecordingBackend {
    fn id(&self) -> String {
        "recording".to_string()
    }

    fn wrap_sink(&self, _sink: Arc<dyn VideoSink>) -> Result<NativeSinkHandle, TrackError> {
        let raw = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.push(Op::Wrap(raw));
        NativeSinkHandle::from_raw(raw).ok_or_else(|| TrackError::WrapFailed("zero".into()))
    }

    fn add_sink(&self, handle: NativeSinkHandle) {
        self.push(Op::Add(handle.as_raw()));
    }

    fn remove_sink(&self, handle: NativeSinkHandle) {
        self.push(Op::Remove(handle.as_raw()));
    }

    fn free_sink(&self, handle: NativeSinkHandle) {
        self.push(Op::Free(handle.as_raw()));
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) -> bool {
        self.enabled.store(enabled, Ordering::SeqCst);
        true
    }

    fn release(&self) {
        self.push(Op::Release);
    }
}

#[derive(Default)]
struct CountingSink {
    frames: AtomicUsize,
}

impl VideoSink for CountingSink {
    fn on_frame(&self, _frame: &VideoFrame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

/// Two sinks that compare equal by value.
#[derive(PartialEq)]
struct NamedSink(&'static str);

impl VideoSink for NamedSink {
    fn on_frame(&self, _frame: &VideoFrame) {}
}

struct Renderer {
    handle: NativeSinkHandle,
    disposed: AtomicUsize,
}

impl Renderer {
    fn new(raw: u64) -> Self {
        Self {
            handle: NativeSinkHandle::from_raw(raw).unwrap(),
            disposed: AtomicUsize::new(0),
        }
    }
}

impl VideoRenderer for Renderer {
    fn native_handle(&self) -> NativeSinkHandle {
        self.handle
    }

    fn dispose(&self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn track() -> (Arc<RecordingBackend>, VideoTrack) {
    let backend = Arc::new(RecordingBackend::default());
    let track = VideoTrack::new(backend.clone());
    (backend, track)
}

#[test]
fn attach_then_detach_creates_and_destroys_once() {
    let (backend, mut track) = track();
    let sink: Arc<dyn VideoSink> = Arc::new(CountingSink::default());

    track.add_sink(sink.clone()).unwrap();
    assert!(track.is_attached(&sink));
    assert_eq!(track.native_handle(&sink).map(|h| h.as_raw()), Some(1));

    assert!(track.remove_sink(&sink));
    assert_eq!(track.sink_count(), 0);
    assert!(!track.is_attached(&sink));
    assert_eq!(
        backend.ops(),
        vec![Op::Wrap(1), Op::Add(1), Op::Remove(1), Op::Free(1)]
    );
}

#[test]
fn detaching_unknown_sink_touches_nothing() {
    let (backend, mut track) = track();
    let attached: Arc<dyn VideoSink> = Arc::new(CountingSink::default());
    let stranger: Arc<dyn VideoSink> = Arc::new(CountingSink::default());
    track.add_sink(attached.clone()).unwrap();
    let before = backend.ops();

    assert!(!track.remove_sink(&stranger));
    assert_eq!(backend.ops(), before);
    assert_eq!(track.sink_count(), 1);
}

#[test]
fn double_attach_is_rejected_without_allocating() {
    let (backend, mut track) = track();
    let sink: Arc<dyn VideoSink> = Arc::new(CountingSink::default());
    track.add_sink(sink.clone()).unwrap();

    let err = track.add_sink(sink.clone()).unwrap_err();
    assert_eq!(
        err,
        TrackError::SinkAlreadyAttached {
            track: "recording".to_string()
        }
    );
    assert_eq!(backend.ops(), vec![Op::Wrap(1), Op::Add(1)]);
    assert_eq!(track.sink_count(), 1);
}

#[test]
fn equal_valued_sinks_are_distinct_entries() {
    let (backend, mut track) = track();
    let a: Arc<dyn VideoSink> = Arc::new(NamedSink("same"));
    let b: Arc<dyn VideoSink> = Arc::new(NamedSink("same"));
    track.add_sink(a.clone()).unwrap();
    track.add_sink(b.clone()).unwrap();
    assert_eq!(track.sink_count(), 2);

    track.remove_sink(&a);
    assert!(track.is_attached(&b));
    assert_eq!(
        backend.ops(),
        vec![
            Op::Wrap(1),
            Op::Add(1),
            Op::Wrap(2),
            Op::Add(2),
            Op::Remove(1),
            Op::Free(1)
        ]
    );
}

#[test]
fn dispose_is_idempotent() {
    let (backend, mut track) = track();
    let renderer = Arc::new(Renderer::new(100));
    track.add_renderer(renderer.clone()).unwrap();
    track
        .add_sink(Arc::new(CountingSink::default()))
        .unwrap();

    track.dispose();
    let after_first = backend.ops();
    assert_eq!(
        after_first,
        vec![
            Op::Add(100),
            Op::Wrap(1),
            Op::Add(1),
            Op::Remove(100),
            Op::Remove(1),
            Op::Free(1),
            Op::Release
        ]
    );
    assert_eq!(renderer.disposed.load(Ordering::SeqCst), 1);

    track.dispose();
    drop(track);
    assert_eq!(backend.ops(), after_first);
    assert_eq!(renderer.disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn every_sink_is_unregistered_before_it_is_freed() {
    let (backend, mut track) = track();
    for _ in 0..4 {
        track.add_sink(Arc::new(CountingSink::default())).unwrap();
    }
    track.dispose();

    let ops = backend.ops();
    for raw in 1..=4u64 {
        let removed = ops.iter().position(|op| *op == Op::Remove(raw)).unwrap();
        let freed = ops.iter().position(|op| *op == Op::Free(raw)).unwrap();
        assert!(removed < freed, "handle {raw}: {ops:?}");
        assert_eq!(ops.iter().filter(|op| **op == Op::Free(raw)).count(), 1);
    }
    assert_eq!(ops.last(), Some(&Op::Release));
}

#[test]
fn dropping_the_track_disposes_it() {
    let (backend, mut track) = track();
    track.add_sink(Arc::new(CountingSink::default())).unwrap();
    drop(track);
    assert_eq!(
        backend.ops(),
        vec![Op::Wrap(1), Op::Add(1), Op::Remove(1), Op::Free(1), Op::Release]
    );
}

#[test]
fn disposed_track_rejects_mutation() {
    let (_backend, mut track) = track();
    track.dispose();
    assert_eq!(track.state(), TrackState::Ended);
    assert!(!track.enabled());
    assert!(matches!(
        track.add_sink(Arc::new(CountingSink::default())),
        Err(TrackError::Disposed(_))
    ));
    assert!(matches!(
        track.add_renderer(Arc::new(Renderer::new(1))),
        Err(TrackError::Disposed(_))
    ));
    assert!(matches!(track.set_enabled(true), Err(TrackError::Disposed(_))));
}

#[test]
fn renderer_removal_unregisters_then_disposes() {
    let (backend, mut track) = track();
    let renderer = Arc::new(Renderer::new(9));
    let as_dyn: Arc<dyn VideoRenderer> = renderer.clone();
    track.add_renderer(as_dyn.clone()).unwrap();
    assert!(matches!(
        track.add_renderer(as_dyn.clone()),
        Err(TrackError::RendererAlreadyAttached { .. })
    ));

    assert!(track.remove_renderer(&as_dyn));
    assert!(!track.remove_renderer(&as_dyn));
    assert_eq!(track.renderer_count(), 0);
    assert_eq!(backend.ops(), vec![Op::Add(9), Op::Remove(9)]);
    assert_eq!(renderer.disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn track_surface_reports_identity_and_enablement() {
    let (_backend, mut track) = track();
    assert_eq!(track.id(), "recording");
    assert_eq!(track.kind(), "video");
    assert_eq!(track.state(), TrackState::Live);
    assert!(track.set_enabled(true).unwrap());
    assert!(track.enabled());
}

#[test]
fn local_source_stops_delivery_before_free_under_load() {
    let source = Arc::new(LocalVideoSource::with_id("local"));
    let mut track = VideoTrack::new(source.clone());
    let sink = Arc::new(CountingSink::default());
    let as_dyn: Arc<dyn VideoSink> = sink.clone();
    track.add_sink(as_dyn.clone()).unwrap();
    assert_eq!(source.active_sinks(), 1);

    let (tx, rx) = crossbeam_channel::bounded(8);
    let pump = source.spawn_pump(rx).unwrap();
    let producer = thread::spawn(move || {
        for i in 0..200 {
            if tx
                .send(VideoFrame::blank(PixelFormat::I420, 4, 4, i))
                .is_err()
            {
                break;
            }
        }
    });

    thread::sleep(Duration::from_millis(5));
    assert!(track.remove_sink(&as_dyn));
    let seen = sink.frames.load(Ordering::SeqCst);
    assert_eq!(source.allocated_sinks(), 0);

    producer.join().unwrap();
    pump.join().unwrap();
    assert_eq!(sink.frames.load(Ordering::SeqCst), seen);

    track.dispose();
    assert!(source.is_released());
}

#[test]
fn disposing_one_track_leaves_a_shared_source_serving_the_other() {
    let source = Arc::new(LocalVideoSource::with_id("shared"));
    let mut first = VideoTrack::new(source.clone());
    let mut second = VideoTrack::new(source.clone());
    assert_eq!(source.track_count(), 2);

    let first_sink = Arc::new(CountingSink::default());
    let second_sink = Arc::new(CountingSink::default());
    first.add_sink(first_sink.clone()).unwrap();
    second.add_sink(second_sink.clone()).unwrap();

    first.dispose();
    assert!(!source.is_released());
    assert_eq!(source.allocated_sinks(), 1);

    let frame = VideoFrame::blank(PixelFormat::I420, 2, 2, 0);
    assert_eq!(source.deliver(&frame), 1);
    assert_eq!(second_sink.frames.load(Ordering::SeqCst), 1);
    assert_eq!(first_sink.frames.load(Ordering::SeqCst), 0);

    assert_eq!(second.state(), TrackState::Live);
    second.add_sink(Arc::new(CountingSink::default())).unwrap();
    assert_eq!(source.allocated_sinks(), 2);

    second.dispose();
    assert!(source.is_released());
    assert_eq!(source.allocated_sinks(), 0);
    assert_eq!(source.track_count(), 0);
}

/// Renderer that wraps its own sink on the source and frees it on dispose.
struct SourceRenderer {
    source: Arc<LocalVideoSource>,
    handle: NativeSinkHandle,
    sink: Arc<CountingSink>,
}

impl SourceRenderer {
    fn new(source: Arc<LocalVideoSource>) -> Self {
        let sink = Arc::new(CountingSink::default());
        let handle = source.wrap_sink(sink.clone()).unwrap();
        Self {
            source,
            handle,
            sink,
        }
    }
}

impl VideoRenderer for SourceRenderer {
    fn native_handle(&self) -> NativeSinkHandle {
        self.handle
    }

    fn dispose(&self) {
        self.source.free_sink(self.handle);
    }
}

#[test]
fn renderer_on_local_source_receives_frames_and_frees_its_handle() {
    let source = Arc::new(LocalVideoSource::with_id("renderers"));
    let mut track = VideoTrack::new(source.clone());
    let frame = VideoFrame::blank(PixelFormat::Nv12, 2, 2, 0);

    let removed = Arc::new(SourceRenderer::new(source.clone()));
    let removed_dyn: Arc<dyn VideoRenderer> = removed.clone();
    track.add_renderer(removed_dyn.clone()).unwrap();
    let kept = Arc::new(SourceRenderer::new(source.clone()));
    track.add_renderer(kept.clone()).unwrap();

    assert_eq!(source.deliver(&frame), 2);
    assert!(track.remove_renderer(&removed_dyn));
    assert_eq!(source.allocated_sinks(), 1);
    assert_eq!(source.deliver(&frame), 1);
    assert_eq!(removed.sink.frames.load(Ordering::SeqCst), 1);
    assert_eq!(kept.sink.frames.load(Ordering::SeqCst), 2);

    track.dispose();
    assert_eq!(source.allocated_sinks(), 0);
    assert!(source.is_released());
}

//! Recording test doubles for the surface and engine capability traits

#![allow(dead_code)]

use kino_bind_core::{
    EngineConfig, EngineEvent, EngineEventKind, EngineFactory, Error, EventHandler,
    LocalBoxFuture, PlaybackSurface, Result, StreamingEngine, HLS_MIME_TYPE,
};
use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Ordered call log plus attachment bookkeeping shared by all doubles
#[derive(Default)]
pub struct Recorder {
    calls: RefCell<Vec<String>>,
    attached: Cell<usize>,
    max_attached: Cell<usize>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == call)
    }

    pub fn attached(&self) -> usize {
        self.attached.get()
    }

    pub fn max_attached(&self) -> usize {
        self.max_attached.get()
    }
}

// =============================================================================
// Surface
// =============================================================================

struct SurfaceState {
    native_hls: Cell<bool>,
    reject_play: Cell<bool>,
    src: RefCell<Option<String>>,
    controls: Cell<bool>,
    attributes: RefCell<Vec<(String, String)>>,
    recorder: Rc<Recorder>,
}

/// Playback surface double; clones share state like DOM references do
#[derive(Clone)]
pub struct MockSurface {
    state: Rc<SurfaceState>,
}

impl MockSurface {
    pub fn new(recorder: &Rc<Recorder>) -> Self {
        Self {
            state: Rc::new(SurfaceState {
                native_hls: Cell::new(false),
                reject_play: Cell::new(false),
                src: RefCell::new(None),
                controls: Cell::new(false),
                attributes: RefCell::new(Vec::new()),
                recorder: recorder.clone(),
            }),
        }
    }

    pub fn with_native_hls(self) -> Self {
        self.state.native_hls.set(true);
        self
    }

    pub fn rejecting_play(self) -> Self {
        self.state.reject_play.set(true);
        self
    }

    pub fn src(&self) -> Option<String> {
        self.state.src.borrow().clone()
    }

    pub fn controls(&self) -> bool {
        self.state.controls.get()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state
            .attributes
            .borrow()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn same_as(&self, other: &MockSurface) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl PlaybackSurface for MockSurface {
    fn can_play_type(&self, mime_type: &str) -> bool {
        self.state.native_hls.get() && mime_type == HLS_MIME_TYPE
    }

    fn set_src(&self, url: &str) {
        self.state.recorder.record(format!("surface.set_src:{url}"));
        *self.state.src.borrow_mut() = Some(url.to_string());
    }

    fn play(&self) -> LocalBoxFuture<'static, Result<()>> {
        self.state.recorder.record("surface.play");
        let reject = self.state.reject_play.get();
        Box::pin(async move {
            if reject {
                Err(Error::AutoplayRejected("NotAllowedError".into()))
            } else {
                Ok(())
            }
        })
    }

    fn set_controls(&self, enabled: bool) {
        self.state.controls.set(enabled);
    }

    fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        if name.contains(' ') {
            return Err(Error::Surface(format!("invalid attribute name: {name}")));
        }
        self.state
            .attributes
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn remove_attribute(&self, name: &str) -> Result<()> {
        self.state.recorder.record(format!("surface.remove_attribute:{name}"));
        self.state.attributes.borrow_mut().retain(|(n, _)| n != name);
        Ok(())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Streaming engine double recording every command
pub struct MockEngine {
    pub id: usize,
    pub config: EngineConfig,
    recorder: Rc<Recorder>,
    handlers: RefCell<Vec<(EngineEventKind, Rc<dyn Fn(EngineEvent)>)>>,
    attached: Cell<bool>,
    destroyed: Cell<bool>,
    loaded: RefCell<Option<String>>,
    start_load_calls: Cell<u32>,
    recover_calls: Cell<u32>,
    /// Raised synchronously from inside `load_source`
    load_event: Option<EngineEvent>,
}

impl MockEngine {
    /// Deliver an event to every handler subscribed to its kind
    pub fn emit(&self, event: EngineEvent) {
        if self.destroyed.get() {
            return;
        }
        self.deliver(event);
    }

    /// Deliver even after `destroy`, like a late callback from a replaced instance
    pub fn emit_late(&self, event: EngineEvent) {
        self.deliver(event);
    }

    fn deliver(&self, event: EngineEvent) {
        let kind = event.kind();
        let handlers: Vec<_> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    pub fn subscribed_kinds(&self) -> Vec<EngineEventKind> {
        self.handlers.borrow().iter().map(|(k, _)| *k).collect()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn loaded(&self) -> Option<String> {
        self.loaded.borrow().clone()
    }

    pub fn start_load_calls(&self) -> u32 {
        self.start_load_calls.get()
    }

    pub fn recover_calls(&self) -> u32 {
        self.recover_calls.get()
    }
}

impl StreamingEngine for MockEngine {
    type Surface = MockSurface;

    fn attach_media(&self, _surface: &MockSurface) {
        self.recorder.record(format!("engine#{}.attach_media", self.id));
        if !self.attached.replace(true) {
            let attached = self.recorder.attached.get() + 1;
            self.recorder.attached.set(attached);
            self.recorder
                .max_attached
                .set(self.recorder.max_attached.get().max(attached));
        }
    }

    fn load_source(&self, url: &str) {
        self.recorder.record(format!("engine#{}.load_source:{url}", self.id));
        *self.loaded.borrow_mut() = Some(url.to_string());
        if let Some(event) = self.load_event.clone() {
            self.emit(event);
        }
    }

    fn on(&self, kind: EngineEventKind, handler: EventHandler) {
        self.handlers.borrow_mut().push((kind, Rc::from(handler)));
    }

    fn start_load(&self) {
        self.recorder.record(format!("engine#{}.start_load", self.id));
        self.start_load_calls.set(self.start_load_calls.get() + 1);
    }

    fn recover_media_error(&self) {
        self.recorder.record(format!("engine#{}.recover_media_error", self.id));
        self.recover_calls.set(self.recover_calls.get() + 1);
    }

    fn destroy(&self) {
        self.recorder.record(format!("engine#{}.destroy", self.id));
        self.destroyed.set(true);
        if self.attached.replace(false) {
            self.recorder.attached.set(self.recorder.attached.get() - 1);
        }
    }
}

/// Factory double; engines are numbered from 1 in construction order
pub struct MockFactory {
    supported: bool,
    fail: bool,
    load_event: Option<EngineEvent>,
    next_id: Cell<usize>,
    recorder: Rc<Recorder>,
}

impl MockFactory {
    pub fn supported(recorder: &Rc<Recorder>) -> Self {
        Self {
            supported: true,
            fail: false,
            load_event: None,
            next_id: Cell::new(1),
            recorder: recorder.clone(),
        }
    }

    pub fn unsupported(recorder: &Rc<Recorder>) -> Self {
        Self {
            supported: false,
            ..Self::supported(recorder)
        }
    }

    pub fn failing(recorder: &Rc<Recorder>) -> Self {
        Self {
            fail: true,
            ..Self::supported(recorder)
        }
    }

    /// Engines emit `event` while loading their source
    pub fn emitting_on_load(recorder: &Rc<Recorder>, event: EngineEvent) -> Self {
        Self {
            load_event: Some(event),
            ..Self::supported(recorder)
        }
    }
}

impl EngineFactory for MockFactory {
    type Engine = MockEngine;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn construct(&self, config: &EngineConfig) -> Result<MockEngine> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        if self.fail {
            self.recorder.record(format!("factory.construct_failed#{id}"));
            return Err(Error::EngineConstruct("Hls is not a constructor".into()));
        }
        self.recorder.record(format!("factory.construct#{id}"));
        Ok(MockEngine {
            id,
            config: config.clone(),
            recorder: self.recorder.clone(),
            handlers: RefCell::new(Vec::new()),
            attached: Cell::new(false),
            destroyed: Cell::new(false),
            loaded: RefCell::new(None),
            start_load_calls: Cell::new(0),
            recover_calls: Cell::new(0),
            load_event: self.load_event.clone(),
        })
    }
}

// =============================================================================
// Spawner
// =============================================================================

/// Futures handed to the binder's spawner, run on demand by the test
#[derive(Clone, Default)]
pub struct SpawnQueue {
    queue: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
}

impl SpawnQueue {
    pub fn spawner(&self) -> impl Fn(LocalBoxFuture<'static, ()>) + 'static {
        let queue = self.queue.clone();
        move |future: LocalBoxFuture<'static, ()>| queue.borrow_mut().push(future)
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Await every queued future in spawn order
    pub async fn run_all(&self) {
        let pending: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        for future in pending {
            future.await;
        }
    }
}

// =============================================================================
// Log capture
// =============================================================================

/// In-memory writer for `tracing-subscriber`
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Install a subscriber writing into this capture for the current thread
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

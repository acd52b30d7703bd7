//! The run loop.
//!
//! A [`Canvas`] owns a [`Platform`], one [`Surface`] and one [`Handler`].
//! Two activities share the surface and handler behind a single lock:
//!
//! * the calling thread polls platform events and dispatches them to
//!   [`Handler::on_event`];
//! * a tick thread calls [`Handler::on_update`], [`Handler::on_draw`] and
//!   [`Surface::present`] at the configured rate.
//!
//! The lifecycle is `Initialized → Running → Terminating → Stopped`. An
//! unhandled [`Event::Quit`] stops both activities, as does a panic on the
//! tick thread, which the handler can not veto.
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, select, tick, Receiver, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::config::CanvasConfig;
use crate::error::{trap, CanvasError, PlatformError, RenderError};
use crate::fonts::Font;
use crate::geometry::{Color, ScreenPoint, ScreenVertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    Running,
    Terminating,
    Stopped,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Initialized,
            1 => RunState::Running,
            2 => RunState::Terminating,
            _ => RunState::Stopped,
        }
    }
}

/// Lifecycle state shared between the canvas, its handles and the tick thread
#[derive(Debug, Clone)]
struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new(state: RunState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: RunState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Esc,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Quit,
    Key(KeyCode),
    Resized { width: u32, height: u32 },
}

/// A drawing target created by a [`Platform`]
pub trait Surface {
    fn set_draw_color(&mut self, color: Color) -> Result<(), RenderError>;

    /// Fill the whole surface with the draw color
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Fill a triangle given in device coordinates
    fn fill_triangle(&mut self, vertices: &[ScreenVertex; 3]) -> Result<(), RenderError>;

    /// Connected line segments through `points`, in the draw color
    fn draw_lines(&mut self, points: &[ScreenPoint]) -> Result<(), RenderError>;

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        font: Font,
        color: Color,
    ) -> Result<(), RenderError>;

    /// Show everything drawn since the last present
    fn present(&mut self) -> Result<(), RenderError>;

    fn size(&self) -> (u32, u32);

    fn resize(&mut self, _width: u32, _height: u32) -> Result<(), RenderError> {
        Ok(())
    }

    fn clear_with(&mut self, color: Color) -> Result<(), RenderError> {
        self.set_draw_color(color)?;
        self.clear()
    }
}

/// The windowing and input collaborator
pub trait Platform {
    type Surface: Surface + Send + 'static;

    fn create_surface(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        config: &CanvasConfig,
    ) -> Result<Self::Surface, PlatformError>;

    /// Next pending event, without blocking
    fn poll_event(&mut self) -> Result<Option<Event>, PlatformError>;

    fn destroy_surface(&mut self, surface: &mut Self::Surface);

    fn shutdown(&mut self);
}

/// Application callbacks. Every callback runs with the canvas lock held, so
/// callbacks never run concurrently with each other.
pub trait Handler<S: Surface>: Send + 'static {
    /// Called once, before ticking starts
    fn on_init(&mut self, _handle: &CanvasHandle, _surface: &mut S) {}

    /// Return `true` to mark the event handled. An unhandled
    /// [`Event::Quit`] stops the canvas.
    fn on_event(&mut self, _event: &Event) -> bool {
        false
    }

    fn on_update(&mut self) {}

    fn on_draw(&mut self, _surface: &mut S) {}

    fn on_destroy(&mut self) {}
}

/// Work queued for the event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    /// Dispatched to the handler like a platform event
    Dispatch(Event),
    /// Stop without consulting the handler
    Shutdown,
}

/// A cloneable way for handlers to ask the run loop for things
#[derive(Debug, Clone)]
pub struct CanvasHandle {
    requests: Sender<Request>,
    state: StateCell,
}

impl CanvasHandle {
    /// Queue a quit event; it is dispatched like any platform event
    pub fn request_quit(&self) {
        if self.requests.send(Request::Dispatch(Event::Quit)).is_err() {
            debug!("quit requested after the canvas was dropped");
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_terminated(&self) -> bool {
        self.state() != RunState::Running
    }
}

struct Stage<S, H> {
    surface: S,
    handler: H,
}

struct TickWorker {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Requests a shutdown if the tick thread unwinds
struct PanicGuard {
    requests: Sender<Request>,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("tick thread panicked, shutting down");
            let _ = self.requests.send(Request::Shutdown);
        }
    }
}

pub struct Canvas<P: Platform, H: Handler<P::Surface>> {
    platform: P,
    stage: Arc<Mutex<Stage<P::Surface, H>>>,
    state: StateCell,
    config: CanvasConfig,
    ticker: Option<TickWorker>,
    requests: Sender<Request>,
    pending: Receiver<Request>,
    closed: bool,
}

impl<P: Platform, H: Handler<P::Surface>> Canvas<P, H> {
    /// Create, run and tear down a canvas. Returns once the canvas stops.
    pub fn open(
        platform: P,
        title: &str,
        width: u32,
        height: u32,
        handler: H,
        config: CanvasConfig,
    ) -> Result<(), CanvasError> {
        let mut canvas = Self::new(platform, title, width, height, handler, config)?;
        canvas.start()?;
        canvas.run();
        canvas.close();
        Ok(())
    }

    /// Create the surface and initialize the handler
    pub fn new(
        mut platform: P,
        title: &str,
        width: u32,
        height: u32,
        mut handler: H,
        config: CanvasConfig,
    ) -> Result<Self, CanvasError> {
        let mut surface = match platform.create_surface(title, width, height, &config) {
            Ok(surface) => surface,
            Err(err) => {
                platform.shutdown();
                return Err(err.into());
            }
        };

        let (requests, pending) = channel::unbounded();
        let state = StateCell::new(RunState::Initialized);
        let handle = CanvasHandle {
            requests: requests.clone(),
            state: state.clone(),
        };
        handler.on_init(&handle, &mut surface);
        info!("canvas `{title}` created ({width}x{height})");

        Ok(Self {
            platform,
            stage: Arc::new(Mutex::new(Stage { surface, handler })),
            state,
            config,
            ticker: None,
            requests,
            pending,
            closed: false,
        })
    }

    pub fn handle(&self) -> CanvasHandle {
        CanvasHandle {
            requests: self.requests.clone(),
            state: self.state.clone(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Start the tick thread and enter the running state
    pub fn start(&mut self) -> Result<(), CanvasError> {
        let state = self.state.get();
        if state != RunState::Initialized {
            warn!("canvas can not be started from {state:?}");
            return Ok(());
        }

        let (shutdown, shutdown_rx) = channel::bounded(1);
        let stage = Arc::clone(&self.stage);
        let cell = self.state.clone();
        let requests = self.requests.clone();
        let interval = self.config.tick_interval();

        self.state.set(RunState::Running);
        let spawned = thread::Builder::new()
            .name("poly3d-tick".to_string())
            .spawn(move || tick_loop(stage, cell, requests, shutdown_rx, interval));
        match spawned {
            Ok(handle) => {
                self.ticker = Some(TickWorker { shutdown, handle });
                info!("canvas running at {} Hz", self.config.tick_rate);
                Ok(())
            }
            Err(err) => {
                self.state.set(RunState::Initialized);
                Err(CanvasError::Spawn(err))
            }
        }
    }

    /// Poll and dispatch events until the canvas leaves the running state
    pub fn run(&mut self) {
        if self.state.get() != RunState::Running {
            warn!("event loop entered while {:?}", self.state.get());
        }
        while self.state.get() == RunState::Running {
            while let Ok(request) = self.pending.try_recv() {
                match request {
                    Request::Dispatch(event) => self.dispatch(event),
                    Request::Shutdown => self.quit(),
                }
            }
            while self.state.get() == RunState::Running {
                match self.platform.poll_event() {
                    Ok(Some(event)) => self.dispatch(event),
                    Ok(None) => break,
                    Err(err) => {
                        error!("event poll failed: {err}");
                        break;
                    }
                }
            }
            thread::sleep(self.config.poll_interval);
        }
        debug!("event loop exited");
    }

    fn dispatch(&mut self, event: Event) {
        let handled = {
            let mut stage = self.stage.lock();
            let event = match event {
                Event::Resized { width, height } => {
                    trap(stage.surface.resize(width, height));
                    let (width, height) = stage.surface.size();
                    Event::Resized { width, height }
                }
                event => event,
            };
            stage.handler.on_event(&event)
        };
        // The lock is released before quitting: the tick thread needs it
        // to observe the state change and exit.
        if !handled && event == Event::Quit {
            self.quit();
        }
    }

    /// Stop ticking. Does nothing unless the canvas is running.
    pub fn quit(&mut self) {
        let state = self.state.get();
        if state != RunState::Running {
            info!("quit ignored while {state:?}");
            return;
        }

        info!("canvas terminating");
        self.state.set(RunState::Terminating);
        if let Some(worker) = self.ticker.take() {
            let _ = worker.shutdown.try_send(());
            if worker.handle.join().is_err() {
                error!("tick thread ended with a panic");
            }
        }
        self.state.set(RunState::Stopped);
        info!("canvas stopped");
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_terminated(&self) -> bool {
        self.state.get() != RunState::Running
    }

    /// Stop if needed, then release the handler, surface and platform
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.quit();
        self.state.set(RunState::Stopped);

        let mut stage = self.stage.lock();
        stage.handler.on_destroy();
        self.platform.destroy_surface(&mut stage.surface);
        drop(stage);
        self.platform.shutdown();
        debug!("canvas torn down");
    }
}

impl<P: Platform, H: Handler<P::Surface>> Drop for Canvas<P, H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn tick_loop<S: Surface, H: Handler<S>>(
    stage: Arc<Mutex<Stage<S, H>>>,
    state: StateCell,
    requests: Sender<Request>,
    shutdown: Receiver<()>,
    interval: Duration,
) {
    let _guard = PanicGuard { requests };
    let ticker = tick(interval);
    loop {
        select! {
            recv(shutdown) -> _ => break,
            recv(ticker) -> _ => {
                if state.get() != RunState::Running {
                    break;
                }
                let mut stage = stage.lock();
                let Stage { surface, handler } = &mut *stage;
                handler.on_update();
                handler.on_draw(surface);
                trap(surface.present());
            }
        }
    }
    debug!("tick loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }

        fn count(&self, entry: &str) -> usize {
            self.0.lock().iter().filter(|e| *e == entry).count()
        }
    }

    struct MockSurface {
        journal: Journal,
    }

    impl Surface for MockSurface {
        fn set_draw_color(&mut self, color: Color) -> Result<(), RenderError> {
            self.journal.push(format!("color {color}"));
            Ok(())
        }

        fn clear(&mut self) -> Result<(), RenderError> {
            self.journal.push("clear");
            Ok(())
        }

        fn fill_triangle(&mut self, _vertices: &[ScreenVertex; 3]) -> Result<(), RenderError> {
            Ok(())
        }

        fn draw_lines(&mut self, _points: &[ScreenPoint]) -> Result<(), RenderError> {
            Ok(())
        }

        fn draw_text(
            &mut self,
            _x: i32,
            _y: i32,
            _text: &str,
            _font: Font,
            _color: Color,
        ) -> Result<(), RenderError> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.journal.push("present");
            Err(RenderError::Backend("present is trapped".to_string()))
        }

        fn size(&self) -> (u32, u32) {
            (80, 24)
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
            self.journal.push(format!("resize {width}x{height}"));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPlatform {
        journal: Journal,
        events: VecDeque<Event>,
        refuse_surface: bool,
    }

    impl Platform for MockPlatform {
        type Surface = MockSurface;

        fn create_surface(
            &mut self,
            _title: &str,
            _width: u32,
            _height: u32,
            _config: &CanvasConfig,
        ) -> Result<MockSurface, PlatformError> {
            if self.refuse_surface {
                return Err(PlatformError::Surface("no display".to_string()));
            }
            self.journal.push("create_surface");
            Ok(MockSurface {
                journal: self.journal.clone(),
            })
        }

        fn poll_event(&mut self) -> Result<Option<Event>, PlatformError> {
            Ok(self.events.pop_front())
        }

        fn destroy_surface(&mut self, _surface: &mut MockSurface) {
            self.journal.push("destroy_surface");
        }

        fn shutdown(&mut self) {
            self.journal.push("shutdown");
        }
    }

    #[derive(Default)]
    struct MockHandler {
        journal: Journal,
        handle: Option<CanvasHandle>,
        swallow_quits: usize,
        quit_after_updates: Option<usize>,
        panic_on_update: bool,
        updates: usize,
    }

    impl Handler<MockSurface> for MockHandler {
        fn on_init(&mut self, handle: &CanvasHandle, _surface: &mut MockSurface) {
            self.journal.push("init");
            self.handle = Some(handle.clone());
        }

        fn on_event(&mut self, event: &Event) -> bool {
            self.journal.push(format!("event {event:?}"));
            if *event == Event::Quit && self.swallow_quits > 0 {
                self.swallow_quits -= 1;
                return true;
            }
            false
        }

        fn on_update(&mut self) {
            if self.panic_on_update {
                panic!("update failed");
            }
            self.journal.push("update");
            self.updates += 1;
            if Some(self.updates) == self.quit_after_updates {
                if let Some(handle) = &self.handle {
                    handle.request_quit();
                }
            }
        }

        fn on_draw(&mut self, _surface: &mut MockSurface) {
            self.journal.push("draw");
        }

        fn on_destroy(&mut self) {
            self.journal.push("destroy");
        }
    }

    fn fixture(events: Vec<Event>) -> (Journal, MockPlatform, MockHandler) {
        let journal = Journal::default();
        let platform = MockPlatform {
            journal: journal.clone(),
            events: events.into(),
            ..Default::default()
        };
        let handler = MockHandler {
            journal: journal.clone(),
            ..Default::default()
        };
        (journal, platform, handler)
    }

    fn fast() -> CanvasConfig {
        CanvasConfig::new().with_tick_rate(1000)
    }

    #[test]
    fn test_unhandled_quit_ends_run() {
        let (journal, platform, handler) = fixture(vec![
            Event::Key(KeyCode::Char('x')),
            Event::Resized {
                width: 100,
                height: 40,
            },
            Event::Quit,
        ]);
        Canvas::open(platform, "test", 80, 24, handler, fast()).unwrap();

        let entries = journal.entries();
        assert_eq!(entries[0], "create_surface");
        assert_eq!(entries[1], "init");
        assert!(entries.contains(&"event Key(Char('x'))".to_string()));
        assert!(entries.contains(&"resize 100x40".to_string()));
        // The handler sees the size the surface settled on
        assert!(entries.contains(&"event Resized { width: 80, height: 24 }".to_string()));
        assert_eq!(
            entries[entries.len() - 3..],
            ["destroy", "destroy_surface", "shutdown"]
        );
    }

    #[test]
    fn test_handled_quit_is_swallowed() {
        let (journal, platform, mut handler) = fixture(vec![Event::Quit, Event::Quit]);
        handler.swallow_quits = 1;
        Canvas::open(platform, "test", 80, 24, handler, fast()).unwrap();
        assert_eq!(journal.count("event Quit"), 2);
    }

    #[test]
    fn test_request_quit_from_update() {
        let (journal, platform, mut handler) = fixture(vec![]);
        handler.quit_after_updates = Some(3);
        Canvas::open(platform, "test", 80, 24, handler, fast()).unwrap();

        let entries = journal.entries();
        assert!(journal.count("update") >= 3);
        assert!(journal.count("event Quit") >= 1);
        // Each tick runs update, draw and present as one unit
        for (i, entry) in entries.iter().enumerate() {
            if entry == "update" {
                assert_eq!(entries[i + 1], "draw");
                assert_eq!(entries[i + 2], "present");
            }
        }
    }

    #[test]
    fn test_quit_is_idempotent() {
        let (journal, platform, handler) = fixture(vec![]);
        let mut canvas = Canvas::new(platform, "test", 80, 24, handler, fast()).unwrap();
        canvas.start().unwrap();
        assert_eq!(canvas.state(), RunState::Running);
        assert!(!canvas.is_terminated());

        canvas.quit();
        assert_eq!(canvas.state(), RunState::Stopped);
        canvas.quit();
        assert_eq!(canvas.state(), RunState::Stopped);
        assert!(canvas.is_terminated());

        canvas.close();
        assert_eq!(journal.count("destroy"), 1);
        assert_eq!(journal.count("shutdown"), 1);
    }

    #[test]
    fn test_initialized_counts_as_terminated() {
        let (journal, platform, handler) = fixture(vec![]);
        let canvas = Canvas::new(platform, "test", 80, 24, handler, fast()).unwrap();
        let handle = canvas.handle();
        assert_eq!(handle.state(), RunState::Initialized);
        assert!(canvas.is_terminated());
        assert!(handle.is_terminated());

        drop(canvas);
        assert_eq!(handle.state(), RunState::Stopped);
        assert_eq!(journal.count("destroy"), 1);
        assert_eq!(journal.count("update"), 0);
        handle.request_quit();
    }

    #[test]
    fn test_surface_failure_is_returned() {
        let (journal, mut platform, handler) = fixture(vec![]);
        platform.refuse_surface = true;
        let result = Canvas::new(platform, "test", 80, 24, handler, fast());
        assert!(matches!(
            result,
            Err(CanvasError::Platform(PlatformError::Surface(_)))
        ));
        assert_eq!(journal.entries(), ["shutdown"]);
    }

    #[test]
    fn test_tick_panic_shuts_down() {
        let (journal, platform, mut handler) = fixture(vec![]);
        handler.panic_on_update = true;
        Canvas::open(platform, "test", 80, 24, handler, fast()).unwrap();
        assert_eq!(journal.count("event Quit"), 0);
        assert_eq!(journal.count("destroy"), 1);
    }

    #[test]
    fn test_tick_panic_bypasses_handler() {
        let (journal, platform, mut handler) = fixture(vec![]);
        handler.panic_on_update = true;
        handler.swallow_quits = 1;
        Canvas::open(platform, "test", 80, 24, handler, fast()).unwrap();
        assert_eq!(journal.count("event Quit"), 0);
        assert_eq!(journal.count("destroy"), 1);
    }

    #[test]
    fn test_clear_with_sets_color_first() {
        let journal = Journal::default();
        let mut surface = MockSurface {
            journal: journal.clone(),
        };
        surface.clear_with(Color::BLACK).unwrap();
        assert_eq!(journal.entries(), ["color #000000FF", "clear"]);
    }
}

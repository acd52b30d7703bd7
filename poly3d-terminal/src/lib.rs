/// Terminal platform for the poly3d run loop
use crossterm::{
    cursor,
    event::{self, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use log::{debug, info, warn};
use poly3d_core::{CanvasConfig, Event, KeyCode, Platform, PlatformError, WindowFlags};
use std::io::{stdout, Stdout};
use std::time::Duration;

pub mod app;
pub mod renderer;

pub use app::SceneHandler;
pub use renderer::TerminalSurface;

/// Height of a terminal cell relative to its width
pub const CELL_ASPECT: f64 = 2.0;

/// Raw-mode terminal in the alternate screen. Window flags other than
/// fullscreen have no terminal equivalent and are ignored.
#[derive(Debug, Default)]
pub struct TerminalPlatform {
    active: bool,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(err) = execute!(stdout(), cursor::Show, LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {err}");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            warn!("failed to disable raw mode: {err}");
        }
        debug!("terminal restored");
    }
}

impl Platform for TerminalPlatform {
    type Surface = TerminalSurface<Stdout>;

    fn create_surface(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
        config: &CanvasConfig,
    ) -> Result<Self::Surface, PlatformError> {
        let (cols, rows) = terminal::size()?;
        let fullscreen = config.window_flags.intersects(WindowFlags::FULLSCREEN);
        let limit = (!fullscreen).then_some((width, height));
        let (width, height) = fit_to_terminal(limit, (cols as u32, rows as u32));
        if width == 0 || height == 0 {
            return Err(PlatformError::Surface(format!(
                "terminal too small ({cols}x{rows})"
            )));
        }

        terminal::enable_raw_mode()?;
        self.active = true;
        execute!(stdout(), EnterAlternateScreen, cursor::Hide, SetTitle(title))?;
        info!("terminal surface {width}x{height}");
        let surface = TerminalSurface::new(stdout(), width, height);
        Ok(match limit {
            Some((max_width, max_height)) => surface.with_size_limit(max_width, max_height),
            None => surface,
        })
    }

    fn poll_event(&mut self) -> Result<Option<Event>, PlatformError> {
        while event::poll(Duration::ZERO)? {
            if let Some(event) = translate_event(event::read()?) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn destroy_surface(&mut self, _surface: &mut Self::Surface) {
        self.restore();
    }

    fn shutdown(&mut self) {
        self.restore();
    }
}

/// Surface size for a terminal of `terminal` cells. A requested size caps
/// the surface; without one the whole terminal is used.
fn fit_to_terminal(limit: Option<(u32, u32)>, terminal: (u32, u32)) -> (u32, u32) {
    match limit {
        Some((width, height)) => (width.min(terminal.0), height.min(terminal.1)),
        None => terminal,
    }
}

/// Map a crossterm event onto a run loop event. Key releases, mouse and
/// focus events have no counterpart.
pub fn translate_event(event: event::Event) -> Option<Event> {
    match event {
        event::Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) => {
            if kind == KeyEventKind::Release {
                return None;
            }
            if modifiers.contains(KeyModifiers::CONTROL) && code == event::KeyCode::Char('c') {
                return Some(Event::Quit);
            }
            let key = match code {
                event::KeyCode::Char(c) => KeyCode::Char(c),
                event::KeyCode::Up => KeyCode::Up,
                event::KeyCode::Down => KeyCode::Down,
                event::KeyCode::Left => KeyCode::Left,
                event::KeyCode::Right => KeyCode::Right,
                event::KeyCode::Esc => KeyCode::Esc,
                event::KeyCode::Enter => KeyCode::Enter,
                _ => KeyCode::Other,
            };
            Some(Event::Key(key))
        }
        event::Event::Resize(width, height) => Some(Event::Resized {
            width: width as u32,
            height: height as u32,
        }),
        _ => None,
    }
}

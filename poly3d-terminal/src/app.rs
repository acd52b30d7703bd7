/// Rotating model scene
use poly3d_core::{
    trap, Camera, CanvasHandle, Color, Event, FontManager, FrameRate, Handler, KeyCode, Model,
    RotationState, Surface, Triangle,
};

/// Degrees added per keypress
const STEP: f64 = 5.0;

/// Spins a model in front of the camera and draws it filled or as a
/// wireframe, with the frame rate in the top-left corner.
///
/// Controls: arrows/WASD rotate, `f` toggles wireframe, `p` pauses the
/// spin, `q`/Esc quits.
pub struct SceneHandler {
    model: Model,
    distance: f64,
    rotation: RotationState,
    spin: (f64, f64, f64),
    camera: Camera,
    fonts: FontManager,
    frame_rate: FrameRate,
    wireframe: bool,
    paused: bool,
    handle: Option<CanvasHandle>,
}

impl SceneHandler {
    pub fn new(model: Model) -> Self {
        let mut camera = Camera::new(80, 24);
        camera.pixel_aspect = crate::CELL_ASPECT;
        Self {
            distance: (model.bounding_radius() * 3.0).max(1.0),
            model,
            rotation: RotationState::zero(),
            spin: (0.5, 1.0, 0.0),
            camera,
            fonts: FontManager::new(),
            frame_rate: FrameRate::new(),
            wireframe: false,
            paused: false,
            handle: None,
        }
    }

    pub fn with_fonts(mut self, fonts: FontManager) -> Self {
        self.fonts = fonts;
        self
    }

    /// Degrees per tick around each axis
    pub fn with_spin(mut self, x: f64, y: f64, z: f64) -> Self {
        self.spin = (x, y, z);
        self
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    /// The current frame's triangles, farthest first
    pub fn triangles(&self) -> Vec<Triangle> {
        let placed = self
            .model
            .transform(&self.rotation.matrix())
            .translate(0.0, 0.0, self.distance);
        self.camera.render(&placed)
    }
}

impl<S: Surface> Handler<S> for SceneHandler {
    fn on_init(&mut self, handle: &CanvasHandle, surface: &mut S) {
        let (width, height) = surface.size();
        self.camera.resize(width, height);
        self.handle = Some(handle.clone());
    }

    fn on_event(&mut self, event: &Event) -> bool {
        match *event {
            Event::Quit => false,
            Event::Resized { width, height } => {
                self.camera.resize(width, height);
                true
            }
            Event::Key(key) => {
                match key {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        if let Some(handle) = &self.handle {
                            handle.request_quit();
                        }
                    }
                    KeyCode::Char('w') | KeyCode::Up => self.rotation.rotate(-STEP, 0.0, 0.0),
                    KeyCode::Char('s') | KeyCode::Down => self.rotation.rotate(STEP, 0.0, 0.0),
                    KeyCode::Char('a') | KeyCode::Left => self.rotation.rotate(0.0, STEP, 0.0),
                    KeyCode::Char('d') | KeyCode::Right => self.rotation.rotate(0.0, -STEP, 0.0),
                    KeyCode::Char('f') => self.wireframe = !self.wireframe,
                    KeyCode::Char('p') => self.paused = !self.paused,
                    _ => return false,
                }
                true
            }
        }
    }

    fn on_update(&mut self) {
        if !self.paused {
            let (x, y, z) = self.spin;
            self.rotation.rotate(x, y, z);
        }
    }

    fn on_draw(&mut self, surface: &mut S) {
        trap(surface.clear_with(Color::BLACK));
        for triangle in self.triangles() {
            if self.wireframe {
                trap(surface.set_draw_color(triangle.shaded_color()));
                trap(surface.draw_lines(&triangle.outline()));
            } else {
                trap(surface.fill_triangle(&triangle.screen_vertices()));
            }
        }
        trap(self.frame_rate.write(&self.fonts, surface, 0, 0));
    }

    fn on_destroy(&mut self) {
        self.frame_rate.release();
        self.fonts.release();
    }
}

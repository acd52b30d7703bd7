/// poly3d Core Library - Shared geometry, projection and run loop
///
/// This library provides the platform-independent half of the renderer:
/// vector and matrix math, triangle and model handling, the model file
/// loader, the camera pipeline and the two-activity run loop that drives a
/// platform surface.

pub mod error;
pub mod vector;
pub mod matrix;
pub mod transform;
pub mod geometry;
pub mod model;
pub mod loader;
pub mod projection;
pub mod config;
pub mod fonts;
pub mod frame_rate;
pub mod canvas;

// Re-export commonly used types
pub use canvas::{Canvas, CanvasHandle, Event, Handler, KeyCode, Platform, RunState, Surface};
pub use config::{CanvasConfig, CanvasOptions, RendererFlags, WindowFlags, WindowPosition};
pub use error::{
    trap, CanvasError, ConfigError, FontError, LoadError, ModelError, ParseError, PlatformError,
    RenderError,
};
pub use fonts::{Font, FontManager, GlyphRun};
pub use frame_rate::FrameRate;
pub use geometry::{Color, ScreenPoint, ScreenVertex, Triangle};
pub use matrix::Matrix;
pub use model::{Face, Model};
pub use projection::Camera;
pub use transform::RotationState;
pub use vector::Vector;

/// poly3d Terminal Viewer - Rotating Model
///
/// Usage: poly3d-terminal [model[.obj]] [config.toml]
///
/// Without a model a cube is shown.
/// Controls:
///   - WASD / Arrow Keys: Rotate the model
///   - F: Toggle wireframe
///   - P: Pause the spin
///   - Q/ESC/Ctrl+C: Quit

use std::env;
use std::process::ExitCode;

use log::info;
use poly3d_core::{config, loader, Canvas, CanvasConfig, FontManager, Model};
use poly3d_terminal::{SceneHandler, TerminalPlatform};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = env::args().skip(1);

    let model = match args.next() {
        Some(path) => match loader::load(&path) {
            Ok(model) => model,
            Err(err) => {
                eprintln!("poly3d: failed to load model: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => Model::cube(2.0),
    };
    info!(
        "model ready: {} vertices, {} faces",
        model.vertices().len(),
        model.len()
    );

    let config = match args.next() {
        Some(path) => match config::load_options(&path) {
            Ok(options) => CanvasConfig::new().apply(&options),
            Err(err) => {
                eprintln!("poly3d: failed to read {path}: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => CanvasConfig::new(),
    };

    // Font files are optional in a terminal
    let fonts = env::current_dir()
        .ok()
        .and_then(|dir| FontManager::load(dir).ok())
        .unwrap_or_default();

    let scene = SceneHandler::new(model).with_fonts(fonts);
    match Canvas::open(TerminalPlatform::new(), "poly3d", 120, 40, scene, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("poly3d: {err}");
            ExitCode::FAILURE
        }
    }
}

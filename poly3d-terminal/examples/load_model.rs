/// Example: Load a model file and print what the camera sees
///
/// Usage: cargo run --example load_model -- path/to/model.obj

use std::env;
use std::process::ExitCode;

use poly3d_core::{loader, Camera, Model};

fn main() -> ExitCode {
    let model = match env::args().nth(1) {
        Some(path) => match loader::load(&path) {
            Ok(model) => model,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            eprintln!("No model file provided, using default cube...");
            Model::cube(2.0)
        }
    };

    println!("Vertices:        {}", model.vertices().len());
    println!("Faces:           {}", model.len());
    println!("Bounding radius: {:.3}", model.bounding_radius());

    let distance = (model.bounding_radius() * 3.0).max(1.0);
    let visible = Camera::new(800, 600).render(&model.translate(0.0, 0.0, distance));
    println!("Visible faces:   {}", visible.len());
    for triangle in visible.iter().take(5) {
        println!("{} shaded {}", triangle, triangle.shaded_color());
    }
    ExitCode::SUCCESS
}

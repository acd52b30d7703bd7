/// Camera and projection pipeline
use crate::geometry::Triangle;
use crate::matrix::Matrix;
use crate::model::Model;
use crate::vector::Vector;

/// Camera configuration for 3D rendering.
///
/// View space is mirrored in y so that it matches device space (y grows
/// downwards). In that space faces turned towards the camera have normals
/// pointing along +z, the same direction as the light.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vector,
    pub target: Vector,
    pub up: Vector,
    /// Field of view in degrees
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    pub width: u32,
    pub height: u32,
    /// Height of one device pixel relative to its width
    pub pixel_aspect: f64,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vector::point(0.0, 0.0, 0.0),
            target: Vector::point(0.0, 0.0, 1.0),
            up: Vector::direction(0.0, 1.0, 0.0),
            fov: 90.0,
            near: 0.1,
            far: 1000.0,
            width,
            height,
            pixel_aspect: 1.0,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// World-to-view transform (including the y mirror)
    pub fn view_matrix(&self) -> Matrix {
        Matrix::invert_axes(false, true, false).multiply(&Matrix::look_at(
            &self.eye,
            &self.target,
            &self.up,
        ))
    }

    pub fn projection_matrix(&self) -> Matrix {
        Matrix::project(
            self.width as f64,
            self.height as f64 * self.pixel_aspect,
            self.fov,
            self.near,
            self.far,
        )
    }

    /// Map normalized device coordinates onto the device
    fn to_screen(&self, triangle: &Triangle) -> Triangle {
        triangle
            .translate(&Vector::direction(1.0, 1.0, 0.0))
            .transform(&Matrix::scale(
                self.width as f64 / 2.0,
                self.height as f64 / 2.0,
                1.0,
            ))
    }

    /// Run a model through the pipeline.
    ///
    /// The model's offset places it in the world. Faces turned away from the
    /// camera, degenerate faces and faces with a vertex in front of the near
    /// plane are dropped. The rest are shaded, projected to device space and
    /// returned farthest first, ready to be painted in order.
    pub fn render(&self, model: &Model) -> Vec<Triangle> {
        let offset = model.offset();
        let model_view = self
            .view_matrix()
            .multiply(&Matrix::translate(offset.x(), offset.y(), offset.z()));
        let projection = self.projection_matrix();

        let mut visible: Vec<Triangle> = model
            .triangles()
            .iter()
            .filter_map(|triangle| {
                let viewed = triangle.transform(&model_view);
                if viewed.vertices().iter().any(|v| v.z() < self.near) {
                    return None;
                }
                let sight = viewed.centroid().normalize();
                let viewed = viewed.compute_normal(&sight);
                viewed.is_visible().then_some(viewed)
            })
            .collect();

        visible.sort_by(|a, b| b.compare_depth(a));
        visible
            .iter()
            .map(|t| self.to_screen(&t.project(&projection)))
            .collect()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Polygon models built on a shared vertex arena
use std::path::Path;
use std::str::FromStr;

use crate::error::{LoadError, ModelError, ParseError};
use crate::geometry::{Color, Triangle};
use crate::loader;
use crate::matrix::{deg_to_rad, Matrix};
use crate::vector::Vector;

/// A triangular face: three indices into the model's vertex arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub indices: [usize; 3],
    pub color: Color,
}

/// An ordered list of faces over a vertex arena, plus an optional offset.
///
/// Faces share vertices by index, so transforming a model touches every
/// vertex once. The offset is placement metadata for whoever positions the
/// model in the world; it is never baked into the vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    vertices: Vec<Vector>,
    faces: Vec<Face>,
    offset: Option<Vector>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
            offset: None,
        }
    }

    /// Read a model file, resolving the name as [`loader::resolve_path`] does
    pub fn load(name: impl AsRef<Path>) -> Result<Model, LoadError> {
        loader::load(name)
    }

    /// Append a vertex and return its 0-based index
    pub fn add_vertex(&mut self, vertex: Vector) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Append a face over existing 0-based vertex indices
    pub fn add_face(&mut self, indices: [usize; 3], color: Color) -> Result<usize, ModelError> {
        let count = self.vertices.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= count) {
            return Err(ModelError::VertexOutOfRange { index, count });
        }
        self.faces.push(Face { indices, color });
        Ok(self.faces.len() - 1)
    }

    /// Recolor the face at the 0-based `index`
    pub fn set_face_color(&mut self, index: usize, color: Color) -> Result<(), ModelError> {
        let count = self.faces.len();
        let face = self
            .faces
            .get_mut(index)
            .ok_or(ModelError::FaceOutOfRange { index, count })?;
        face.color = color;
        Ok(())
    }

    pub fn vertices(&self) -> &[Vector] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        self.faces.get(index).map(|face| self.materialize(face))
    }

    /// Materialize every face as an owned triangle, in face order
    pub fn triangles(&self) -> Vec<Triangle> {
        self.faces.iter().map(|face| self.materialize(face)).collect()
    }

    fn materialize(&self, face: &Face) -> Triangle {
        let [a, b, c] = face.indices;
        Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c], face.color)
    }

    /// Transform every vertex in place.
    ///
    /// This is the only mutating geometry operation; everything else returns
    /// a new model.
    pub fn apply_matrix(&mut self, m: &Matrix) {
        for vertex in &mut self.vertices {
            *vertex = vertex.apply_matrix(m);
        }
    }

    pub fn transform(&self, m: &Matrix) -> Model {
        let mut model = self.clone();
        model.apply_matrix(m);
        model
    }

    pub fn rotate(&self, x_deg: f64, y_deg: f64, z_deg: f64) -> Model {
        self.transform(&Matrix::rotate_xyz(
            deg_to_rad(x_deg),
            deg_to_rad(y_deg),
            deg_to_rad(z_deg),
        ))
    }

    pub fn scale(&self, x: f64, y: f64, z: f64) -> Model {
        self.transform(&Matrix::scale(x, y, z))
    }

    /// Copy with the offset replaced by `(x, y, z)`
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Model {
        Self {
            offset: Some(Vector::direction(x, y, z)),
            ..self.clone()
        }
    }

    pub fn offset(&self) -> Vector {
        self.offset.unwrap_or_else(|| Vector::direction(0.0, 0.0, 0.0))
    }

    /// Distance from the origin to the farthest vertex
    pub fn bounding_radius(&self) -> f64 {
        self.vertices
            .iter()
            .map(Vector::length)
            .fold(0.0, f64::max)
    }

    /// An axis-aligned cube centred on the origin with outward winding
    pub fn cube(size: f64) -> Self {
        let h = size / 2.0;
        let mut model = Self::with_capacity(8, 12);
        for (x, y, z) in [
            (-h, -h, -h),
            (h, -h, -h),
            (h, h, -h),
            (-h, h, -h),
            (-h, -h, h),
            (h, -h, h),
            (h, h, h),
            (-h, h, h),
        ] {
            model.add_vertex(Vector::point(x, y, z));
        }

        const FACES: [[usize; 3]; 12] = [
            // Front (z = -h)
            [0, 3, 2],
            [0, 2, 1],
            // Back (z = +h)
            [4, 5, 6],
            [4, 6, 7],
            // Top
            [3, 7, 6],
            [3, 6, 2],
            // Bottom
            [0, 1, 5],
            [0, 5, 4],
            // Right
            [1, 2, 6],
            [1, 6, 5],
            // Left
            [0, 4, 7],
            [0, 7, 3],
        ];
        for indices in FACES {
            model.faces.push(Face {
                indices,
                color: Color::WHITE,
            });
        }
        model
    }
}

impl FromStr for Model {
    type Err = ParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        loader::parse(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_model() -> Model {
        let mut model = Model::new();
        let a = model.add_vertex(Vector::point(0.0, 0.0, 0.0));
        let b = model.add_vertex(Vector::point(1.0, 0.0, 0.0));
        let c = model.add_vertex(Vector::point(0.0, 1.0, 0.0));
        model.add_face([a, b, c], Color::WHITE).unwrap();
        model
    }

    #[test]
    fn test_add_face_checks_indices() {
        let mut model = triangle_model();
        assert_eq!(
            model.add_face([0, 1, 3], Color::WHITE),
            Err(ModelError::VertexOutOfRange { index: 3, count: 3 })
        );
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_set_face_color_range() {
        let mut model = triangle_model();
        model.set_face_color(0, Color::rgb(1, 2, 3)).unwrap();
        assert_eq!(model.faces()[0].color, Color::rgb(1, 2, 3));
        assert!(model.set_face_color(1, Color::WHITE).is_err());
    }

    #[test]
    fn test_transform_leaves_source_untouched() {
        let model = triangle_model();
        let moved = model.transform(&Matrix::translate(5.0, 0.0, 0.0));
        assert_eq!(model.vertices()[1], Vector::point(1.0, 0.0, 0.0));
        assert_eq!(moved.vertices()[1], Vector::point(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_shared_vertices_transform_once() {
        let mut model = triangle_model();
        model.add_face([2, 1, 0], Color::WHITE).unwrap();
        model.apply_matrix(&Matrix::scale(2.0, 2.0, 2.0));
        let triangles = model.triangles();
        assert_eq!(triangles[0].vertices()[1], triangles[1].vertices()[1]);
        assert_eq!(triangles[0].vertices()[1], Vector::point(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotate_in_degrees() {
        let rotated = triangle_model().rotate(0.0, 0.0, 90.0);
        assert_relative_eq!(rotated.vertices()[1], Vector::point(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_from_str() {
        let model: Model = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".parse().unwrap();
        assert_eq!(model, triangle_model());
        assert!("f 1 2 3".parse::<Model>().is_err());
    }

    #[test]
    fn test_scale() {
        let scaled = triangle_model().scale(3.0, 1.0, 1.0);
        assert_eq!(scaled.vertices()[1], Vector::point(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_translate_sets_offset() {
        let model = triangle_model();
        assert_eq!(model.offset(), Vector::direction(0.0, 0.0, 0.0));
        let placed = model.translate(1.0, 2.0, 3.0).translate(0.0, 0.0, 9.0);
        assert_eq!(placed.offset(), Vector::direction(0.0, 0.0, 9.0));
        assert_eq!(placed.vertices(), model.vertices());
    }

    #[test]
    fn test_cube_winding_is_outward() {
        let cube = Model::cube(2.0);
        assert_eq!(cube.len(), 12);
        assert_relative_eq!(cube.bounding_radius(), 3.0f64.sqrt(), epsilon = 1e-12);
        let origin = Vector::point(0.0, 0.0, 0.0);
        for triangle in cube.triangles() {
            let outward = triangle.centroid().subtract(&origin).normalize();
            let t = triangle.compute_normal(&outward);
            assert!(t.is_visible(), "face points inward: {t}");
        }
    }
}

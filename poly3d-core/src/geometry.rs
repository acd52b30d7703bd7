/// Geometry primitives for 3D rendering
use std::cmp::Ordering;
use std::f64::consts::FRAC_PI_2;
use std::fmt;

use crate::matrix::Matrix;
use crate::vector::Vector;

/// Packed RGBA color, red in the most significant byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const BLACK: Color = Color(0x0000_00FF);
    /// Returned by [`Triangle::shaded_color`] for faces turned away from the light
    pub const SHADOW: Color = Color::rgba(32, 32, 32, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self((r as u32) << 24 | (g as u32) << 16 | (b as u32) << 8 | a as u32)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn a(self) -> u8 {
        self.0 as u8
    }

    /// Perceived brightness in [0, 1]
    pub fn luminance(self) -> f64 {
        (0.299 * self.r() as f64 + 0.587 * self.g() as f64 + 0.114 * self.b() as f64) / 255.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// A device-space point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// A device-space point with a fill color, as handed to the rasterizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub position: ScreenPoint,
    pub color: Color,
}

/// Reference direction the light shines along
fn light_direction() -> Vector {
    Vector::direction(0.0, 0.0, 1.0)
}

/// A triangle face with derived lighting data.
///
/// Operations return new triangles; `transform`, `project` and `translate`
/// carry the normal and incidence angles over unchanged, so callers must
/// call [`Triangle::compute_normal`] again after anything that changes
/// orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [Vector; 3],
    normal: Vector,
    normal_incidence: f64,
    view_incidence: f64,
    color: Color,
}

impl Triangle {
    pub fn new(v0: Vector, v1: Vector, v2: Vector, color: Color) -> Self {
        Self {
            vertices: [v0, v1, v2],
            normal: Vector::point(0.0, 0.0, 0.0),
            normal_incidence: 0.0,
            view_incidence: 0.0,
            color,
        }
    }

    pub fn vertices(&self) -> &[Vector; 3] {
        &self.vertices
    }

    pub fn normal(&self) -> Vector {
        self.normal
    }

    /// Angle between the normal and the light direction `(0, 0, 1)`
    pub fn normal_incidence(&self) -> f64 {
        self.normal_incidence
    }

    /// Angle between the normal and the last view direction
    pub fn view_incidence(&self) -> f64 {
        self.view_incidence
    }

    pub fn face_color(&self) -> Color {
        self.color
    }

    pub fn with_color(&self, color: Color) -> Triangle {
        Self {
            color,
            ..self.clone()
        }
    }

    fn map_vertices(&self, f: impl Fn(&Vector) -> Vector) -> Triangle {
        Self {
            vertices: self.vertices.each_ref().map(f),
            ..self.clone()
        }
    }

    /// Recompute the unit face normal and both incidence angles.
    ///
    /// Collinear vertices give a zero normal and NaN angles; such a triangle
    /// is never visible.
    pub fn compute_normal(&self, view: &Vector) -> Triangle {
        let [v0, v1, v2] = &self.vertices;
        let normal = v1.subtract(v0).cross(&v2.subtract(v0)).normalize();
        let length = normal.length();
        Self {
            normal,
            normal_incidence: (normal.dot(&light_direction()) / length).acos(),
            view_incidence: (normal.dot(view) / length).acos(),
            ..self.clone()
        }
    }

    /// Back-face test against the view direction used in `compute_normal`
    pub fn is_visible(&self) -> bool {
        self.view_incidence < FRAC_PI_2
    }

    pub fn is_degenerate(&self) -> bool {
        !self.normal.length().is_finite() || self.normal.length() == 0.0
    }

    /// Base color dimmed by the cosine of the light incidence
    pub fn shaded_color(&self) -> Color {
        if self.normal_incidence > FRAC_PI_2 {
            return Color::SHADOW;
        }
        let shade = self.normal_incidence.cos();
        let c = self.color;
        let scale = |channel: u8| (channel as f64 * shade) as u8;
        Color::rgba(scale(c.r()), scale(c.g()), scale(c.b()), c.a())
    }

    pub fn transform(&self, m: &Matrix) -> Triangle {
        self.map_vertices(|v| v.apply_matrix(m))
    }

    /// Apply `projection` and divide each vertex by its `w`
    pub fn project(&self, projection: &Matrix) -> Triangle {
        self.map_vertices(|v| {
            let clip = v.apply_matrix(projection);
            clip.divide(clip.w())
        })
    }

    pub fn translate(&self, offset: &Vector) -> Triangle {
        self.map_vertices(|v| v.add(offset))
    }

    pub fn centroid(&self) -> Vector {
        let [a, b, c] = &self.vertices;
        Vector::centroid(a, b, c)
    }

    /// Mean z of the three vertices
    pub fn depth(&self) -> f64 {
        self.centroid().z()
    }

    /// Order by depth, nearest first
    pub fn compare_depth(&self, other: &Triangle) -> Ordering {
        self.depth().total_cmp(&other.depth())
    }

    /// The three vertices as shaded device points
    pub fn screen_vertices(&self) -> [ScreenVertex; 3] {
        let color = self.shaded_color();
        self.vertices.each_ref().map(|v| ScreenVertex {
            position: screen_point(v),
            color,
        })
    }

    /// Closed outline: vertex 0 is repeated at the end
    pub fn outline(&self) -> [ScreenPoint; 4] {
        let [a, b, c] = &self.vertices;
        [screen_point(a), screen_point(b), screen_point(c), screen_point(a)]
    }
}

fn screen_point(v: &Vector) -> ScreenPoint {
    ScreenPoint {
        x: v.x() as f32,
        y: v.y() as f32,
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    X           Y           Z           W")?;
        for v in &self.vertices {
            writeln!(f, "{v}")?;
        }
        Ok(())
    }
}

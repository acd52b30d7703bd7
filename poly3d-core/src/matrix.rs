/// 4x4 homogeneous transformation matrices
use std::f64::consts::PI;

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Matrix4;

use crate::vector::Vector;

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// A row-major 4x4 transform. Vectors are treated as columns, so
/// `a.multiply(&b)` applies `b` first and `a` second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(Matrix4<f64>);

impl Matrix {
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let [r0, r1, r2, r3] = rows;
        #[rustfmt::skip]
        let m = Matrix4::new(
            r0[0], r0[1], r0[2], r0[3],
            r1[0], r1[1], r1[2], r1[3],
            r2[0], r2[1], r2[2], r2[3],
            r3[0], r3[1], r3[2], r3[3],
        );
        Self(m)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    pub(crate) fn as_inner(&self) -> &Matrix4<f64> {
        &self.0
    }

    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    #[rustfmt::skip]
    pub fn translate(x: f64, y: f64, z: f64) -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translate_x(x: f64) -> Self {
        Self::translate(x, 0.0, 0.0)
    }

    pub fn translate_y(y: f64) -> Self {
        Self::translate(0.0, y, 0.0)
    }

    pub fn translate_z(z: f64) -> Self {
        Self::translate(0.0, 0.0, z)
    }

    #[rustfmt::skip]
    pub fn scale(x: f64, y: f64, z: f64) -> Self {
        Self::from_rows([
            [x,   0.0, 0.0, 0.0],
            [0.0, y,   0.0, 0.0],
            [0.0, 0.0, z,   0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale_x(x: f64) -> Self {
        Self::scale(x, 1.0, 1.0)
    }

    pub fn scale_y(y: f64) -> Self {
        Self::scale(1.0, y, 1.0)
    }

    pub fn scale_z(z: f64) -> Self {
        Self::scale(1.0, 1.0, z)
    }

    /// Mirror the selected axes
    pub fn invert_axes(x: bool, y: bool, z: bool) -> Self {
        let flip = |on: bool| if on { -1.0 } else { 1.0 };
        Self::scale(flip(x), flip(y), flip(z))
    }

    #[rustfmt::skip]
    pub fn rotate_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c,   -s,  0.0],
            [0.0, s,   c,   0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    #[rustfmt::skip]
    pub fn rotate_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c,   0.0, s,   0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s,  0.0, c,   0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    #[rustfmt::skip]
    pub fn rotate_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c,   -s,  0.0, 0.0],
            [s,   c,   0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Fused yaw-pitch-roll rotation: X is applied first, then Y, then Z.
    #[rustfmt::skip]
    pub fn rotate_xyz(x: f64, y: f64, z: f64) -> Self {
        let (sin_x, cos_x) = x.sin_cos();
        let (sin_y, cos_y) = y.sin_cos();
        let (sin_z, cos_z) = z.sin_cos();
        Self::from_rows([
            [cos_y * cos_z, sin_x * sin_y * cos_z - cos_x * sin_z, cos_x * sin_y * cos_z + sin_x * sin_z, 0.0],
            [cos_y * sin_z, sin_x * sin_y * sin_z + cos_x * cos_z, cos_x * sin_y * sin_z - sin_x * cos_z, 0.0],
            [-sin_y,        sin_x * cos_y,                         cos_x * cos_y,                         0.0],
            [0.0,           0.0,                                   0.0,                                   1.0],
        ])
    }

    /// Perspective projection whose `w` output equals the input `z`.
    #[rustfmt::skip]
    pub fn project(width: f64, height: f64, fov_deg: f64, near: f64, far: f64) -> Self {
        let a = height / width;
        let f = 1.0 / (fov_deg / 360.0 * PI).tan();
        let q = far / (far - near);
        Self::from_rows([
            [a * f, 0.0, 0.0, 0.0],
            [0.0,   f,   0.0, 0.0],
            [0.0,   0.0, q,   -far * near / (far - near)],
            [0.0,   0.0, 1.0, 0.0],
        ])
    }

    /// Orthonormal camera basis: (right, up, forward)
    fn basis(eye: &Vector, target: &Vector, up: &Vector) -> (Vector, Vector, Vector) {
        let forward = target.subtract(eye).normalize();
        let up = up.subtract(&forward.scale(up.dot(&forward))).normalize();
        let right = up.cross(&forward);
        (right, up, forward)
    }

    /// Place an object at `eye` facing `target`
    #[rustfmt::skip]
    pub fn point_at(eye: &Vector, target: &Vector, up: &Vector) -> Self {
        let (r, u, f) = Self::basis(eye, target, up);
        Self::from_rows([
            [r.x(), u.x(), f.x(), eye.x()],
            [r.y(), u.y(), f.y(), eye.y()],
            [r.z(), u.z(), f.z(), eye.z()],
            [0.0,   0.0,   0.0,   1.0],
        ])
    }

    /// World-to-view transform; the inverse of [`Matrix::point_at`].
    #[rustfmt::skip]
    pub fn look_at(eye: &Vector, target: &Vector, up: &Vector) -> Self {
        let (r, u, f) = Self::basis(eye, target, up);
        Self::from_rows([
            [r.x(), r.y(), r.z(), -eye.dot(&r)],
            [u.x(), u.y(), u.z(), -eye.dot(&u)],
            [f.x(), f.y(), f.z(), -eye.dot(&f)],
            [0.0,   0.0,   0.0,   1.0],
        ])
    }

    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Self(self.0 * other.0)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl AbsDiffEq for Matrix {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.0.abs_diff_eq(&other.0, epsilon)
    }
}

impl RelativeEq for Matrix {
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.0.relative_eq(&other.0, epsilon, max_relative)
    }
}

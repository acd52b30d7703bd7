/// Homogeneous 4-component vectors
use std::fmt;
use std::ops::{Add, Mul, Sub};

use approx::{AbsDiffEq, RelativeEq};
use nalgebra::Vector4;

use crate::matrix::Matrix;

/// A point (`w = 1`) or direction (`w = 0`) in homogeneous coordinates.
///
/// Every operation returns a new value. Only the three spatial components
/// take part in `dot`, `cross` and `length`; `w` is carried through from the
/// left-hand operand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector(Vector4<f64>);

impl Vector {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self(Vector4::new(x, y, z, w))
    }

    pub fn point(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 1.0)
    }

    pub fn direction(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 0.0)
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn w(&self) -> f64 {
        self.0.w
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.0.xyz().dot(&other.0.xyz())
    }

    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit-length copy. A zero vector yields NaN components.
    pub fn normalize(&self) -> Vector {
        let l = self.length();
        Self::new(self.x() / l, self.y() / l, self.z() / l, self.w())
    }

    pub fn cross(&self, other: &Vector) -> Vector {
        let c = self.0.xyz().cross(&other.0.xyz());
        Self::new(c.x, c.y, c.z, self.w())
    }

    pub fn add(&self, other: &Vector) -> Vector {
        Self::new(
            self.x() + other.x(),
            self.y() + other.y(),
            self.z() + other.z(),
            self.w(),
        )
    }

    pub fn subtract(&self, other: &Vector) -> Vector {
        Self::new(
            self.x() - other.x(),
            self.y() - other.y(),
            self.z() - other.z(),
            self.w(),
        )
    }

    pub fn scale(&self, factor: f64) -> Vector {
        Self::new(self.x() * factor, self.y() * factor, self.z() * factor, self.w())
    }

    /// Divide the spatial components by `divisor` and store it as `w`.
    ///
    /// A zero divisor is replaced by 1 so a perspective divide at `w == 0`
    /// leaves the vector finite.
    pub fn divide(&self, divisor: f64) -> Vector {
        let divisor = if divisor == 0.0 { 1.0 } else { divisor };
        Self::new(
            self.x() / divisor,
            self.y() / divisor,
            self.z() / divisor,
            divisor,
        )
    }

    /// Component i of the result is `Σj self[j] * m[i][j]`.
    pub fn apply_matrix(&self, m: &Matrix) -> Vector {
        Self(m.as_inner() * self.0)
    }

    pub fn centroid(a: &Vector, b: &Vector, c: &Vector) -> Vector {
        Self::new(
            (a.x() + b.x() + c.x()) / 3.0,
            (a.y() + b.y() + c.y()) / 3.0,
            (a.z() + b.z() + c.z()) / 3.0,
            a.w(),
        )
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::add(&self, &rhs)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        self.subtract(&rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scale(rhs)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ {:+8.3} ]  [ {:+8.3} ]  [ {:+8.3} ]  [ {:+8.3} ]",
            self.x(),
            self.y(),
            self.z(),
            self.w()
        )
    }
}

impl AbsDiffEq for Vector {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        f64::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.0.abs_diff_eq(&other.0, epsilon)
    }
}

impl RelativeEq for Vector {
    fn default_max_relative() -> f64 {
        f64::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f64, max_relative: f64) -> bool {
        self.0.relative_eq(&other.0, epsilon, max_relative)
    }
}

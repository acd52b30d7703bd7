/// Accumulated model rotation
use crate::matrix::{deg_to_rad, Matrix};

/// Rotation state around three axes (in degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Rotate by delta amounts (in degrees), wrapping each axis into [0, 360)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x = (self.x + dx).rem_euclid(360.0);
        self.y = (self.y + dy).rem_euclid(360.0);
        self.z = (self.z + dz).rem_euclid(360.0);
    }

    pub fn matrix(&self) -> Matrix {
        Matrix::rotate_xyz(deg_to_rad(self.x), deg_to_rad(self.y), deg_to_rad(self.z))
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(10.0, 20.0, 30.0);
        assert_relative_eq!(state.x, 10.0);
        assert_relative_eq!(state.y, 20.0);
        assert_relative_eq!(state.z, 30.0);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut state = RotationState::new(350.0, 5.0, 0.0);
        state.rotate(20.0, -10.0, 0.0);
        assert_relative_eq!(state.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(state.y, 355.0, epsilon = 1e-9);
    }

    #[test]
    fn test_identity_rotation() {
        assert_eq!(RotationState::zero().matrix(), Matrix::identity());
    }
}

/// Static model transform.
///
/// A 4x4 model matrix plus an identity flag. The translation, rotation and
/// scaling setters right-compose onto the current matrix, so successive calls
/// accumulate: `set_translation` then `set_rotation` rotates the object about
/// its translated origin.

use glam::{Mat4, Vec3};
use crate::engine_warn;

/// Below this, a rotation axis or a determinant is considered zero
pub(crate) const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: Mat4,
    identity: bool,
}

impl Transform {
    pub fn new() -> Self {
        Self { matrix: Mat4::IDENTITY, identity: true }
    }

    /// Transform starting from an arbitrary matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix, identity: false }
    }

    // ===== GETTERS =====

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// True until the first setter call (or after `reset`)
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Translation part of the matrix
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    // ===== SETTERS =====

    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        self.compose(Mat4::from_translation(Vec3::new(x, y, z)));
    }

    /// Rotate by `angle` radians about `axis` (normalized here)
    ///
    /// A zero-length axis leaves the matrix unchanged.
    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        let length = axis.length();
        if length < EPSILON || !length.is_finite() {
            engine_warn!("vista3d::Transform", "Rotation about a degenerate axis {:?} ignored", axis);
            return;
        }
        self.compose(Mat4::from_axis_angle(axis / length, angle));
    }

    pub fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        self.compose(Mat4::from_scale(Vec3::new(x, y, z)));
    }

    /// Replace the whole matrix
    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        self.identity = false;
    }

    pub fn reset(&mut self) {
        self.matrix = Mat4::IDENTITY;
        self.identity = true;
    }

    fn compose(&mut self, m: Mat4) {
        self.matrix *= m;
        self.identity = false;
    }

    // ===== DERIVED =====

    /// Inverse matrix; identity when the matrix is singular
    pub fn inverse(&self) -> Mat4 {
        if self.identity {
            return Mat4::IDENTITY;
        }
        if self.matrix.determinant().abs() < EPSILON {
            return Mat4::IDENTITY;
        }
        self.matrix.inverse()
    }

    /// Bring a world-space point into model space
    pub fn inverse_point(&self, point: Vec3) -> Vec3 {
        if self.identity {
            return point;
        }
        self.inverse().transform_point3(point)
    }

    /// This matrix composed with `other` (`self * other`)
    pub fn accumulate(&self, other: &Mat4) -> Mat4 {
        if self.identity {
            *other
        } else {
            self.matrix * *other
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;

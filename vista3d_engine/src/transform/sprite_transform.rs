/// Camera-facing (spherical) sprite transform.
///
/// Setters only touch the base matrix. `update` turns the object around its
/// own center so that its local +Y axis points at the camera eye:
///
/// ```text
/// look  = normalize(eye - center)
/// left  = normalize(look x Z)        (X when look is vertical)
/// up    = left x look
/// R     = [left | look | up]
/// M     = T(center) * R * T(-center) * base
/// ```
///
/// When the eye sits on the center the rotation falls back to identity.

use glam::{Mat3, Mat4, Vec3};
use crate::transform::transform::{Transform, EPSILON};

/// Rotation taking local +Y to `look` and keeping local +Z as close to
/// world +Z as possible
pub(crate) fn look_rotation(look: Vec3) -> Mat3 {
    let length = look.length();
    if length < EPSILON || !length.is_finite() {
        return Mat3::IDENTITY;
    }
    let look = look / length;
    let left = look.cross(Vec3::Z);
    let left = if left.length() < EPSILON { Vec3::X } else { left.normalize() };
    let up = left.cross(look);
    Mat3::from_cols(left, look, up)
}

/// `T(center) * rotation * T(-center) * base`
pub(crate) fn rotate_about(center: Vec3, rotation: Mat3, base: &Mat4) -> Mat4 {
    Mat4::from_translation(center)
        * Mat4::from_mat3(rotation)
        * Mat4::from_translation(-center)
        * *base
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteTransform {
    base: Transform,
    matrix: Mat4,
    last_eye: Option<Vec3>,
}

impl SpriteTransform {
    pub fn new() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }

    /// Sprite transform over a base matrix (translation and scale)
    pub fn from_matrix(base: Mat4) -> Self {
        Self { base: Transform::from_matrix(base), matrix: base, last_eye: None }
    }

    pub fn base(&self) -> &Transform {
        &self.base
    }

    /// Effective matrix computed by the last `update`
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Center the sprite turns around (base translation)
    pub fn center(&self) -> Vec3 {
        self.base.translation()
    }

    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        self.base.set_translation(x, y, z);
        self.invalidate();
    }

    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        self.base.set_rotation(angle, axis);
        self.invalidate();
    }

    pub fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        self.base.set_scaling(x, y, z);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.matrix = *self.base.matrix();
        self.last_eye = None;
    }

    /// Face the eye position
    pub fn update_from_eye(&mut self, eye: Vec3) {
        let center = self.center();
        let rotation = look_rotation(eye - center);
        self.matrix = rotate_about(center, rotation, self.base.matrix());
        self.last_eye = Some(eye);
    }

    /// True when the matrix was not computed for this eye position
    pub fn is_stale(&self, eye: Vec3) -> bool {
        self.last_eye != Some(eye)
    }
}

impl Default for SpriteTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "sprite_transform_tests.rs"]
mod tests;

/// Axis-aligned (cylindrical) billboard transform.
///
/// Like `SpriteTransform` but the object only turns about the world Z axis:
/// the look direction is projected onto the XY plane first, so billboards
/// stay upright.

use glam::{Mat3, Mat4, Vec3};
use crate::transform::sprite_transform::rotate_about;
use crate::transform::transform::{Transform, EPSILON};

/// Rotation about Z taking local +Y to the XY projection of `look`
pub(crate) fn upright_rotation(look: Vec3) -> Mat3 {
    let flat = Vec3::new(look.x, look.y, 0.0);
    let length = flat.length();
    if length < EPSILON || !length.is_finite() {
        return Mat3::IDENTITY;
    }
    let flat = flat / length;
    Mat3::from_cols(flat.cross(Vec3::Z), flat, Vec3::Z)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillboardTransform {
    base: Transform,
    matrix: Mat4,
    last_eye: Option<Vec3>,
}

impl BillboardTransform {
    pub fn new() -> Self {
        Self::from_matrix(Mat4::IDENTITY)
    }

    pub fn from_matrix(base: Mat4) -> Self {
        Self { base: Transform::from_matrix(base), matrix: base, last_eye: None }
    }

    pub fn base(&self) -> &Transform {
        &self.base
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

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

    pub fn update_from_eye(&mut self, eye: Vec3) {
        let center = self.center();
        let rotation = upright_rotation(eye - center);
        self.matrix = rotate_about(center, rotation, self.base.matrix());
        self.last_eye = Some(eye);
    }

    pub fn is_stale(&self, eye: Vec3) -> bool {
        self.last_eye != Some(eye)
    }
}

impl Default for BillboardTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "billboard_transform_tests.rs"]
mod tests;

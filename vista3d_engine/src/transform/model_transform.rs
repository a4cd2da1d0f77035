/// Transform selection by composition.
///
/// Drawables own a `ModelTransform`; the variant decides whether the model
/// matrix follows the camera. Everything the frame loop needs goes through
/// the `Transformable` trait.

use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::graphics::{GraphicsContext, UniformValue};
use crate::shader::{Shader, U_MODEL_MATRIX};
use crate::transform::billboard_transform::BillboardTransform;
use crate::transform::sprite_transform::SpriteTransform;
use crate::transform::transform::Transform;

/// Common interface of the model transforms
pub trait Transformable {
    /// Matrix uploaded as the model matrix
    fn matrix(&self) -> &Mat4;

    fn set_translation(&mut self, x: f32, y: f32, z: f32);

    fn set_rotation(&mut self, angle: f32, axis: Vec3);

    fn set_scaling(&mut self, x: f32, y: f32, z: f32);

    /// Per-frame camera update; static transforms ignore it
    fn update(&mut self, _camera: &Camera) {}

    /// True when `update` must run before drawing with this camera
    fn needs_update(&self, _camera: &Camera) -> bool {
        false
    }

    /// Upload the model matrix; false when the shader has no model matrix
    fn bind(&self, ctx: &mut GraphicsContext, shader: &Shader) -> bool {
        shader.upload(ctx, U_MODEL_MATRIX, &UniformValue::Mat4(*self.matrix()))
    }
}

impl Transformable for Transform {
    fn matrix(&self) -> &Mat4 {
        Transform::matrix(self)
    }

    fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        Transform::set_translation(self, x, y, z);
    }

    fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        Transform::set_rotation(self, angle, axis);
    }

    fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        Transform::set_scaling(self, x, y, z);
    }
}

impl Transformable for SpriteTransform {
    fn matrix(&self) -> &Mat4 {
        SpriteTransform::matrix(self)
    }

    fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        SpriteTransform::set_translation(self, x, y, z);
    }

    fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        SpriteTransform::set_rotation(self, angle, axis);
    }

    fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        SpriteTransform::set_scaling(self, x, y, z);
    }

    fn update(&mut self, camera: &Camera) {
        self.update_from_eye(camera.eye());
    }

    fn needs_update(&self, camera: &Camera) -> bool {
        self.is_stale(camera.eye())
    }
}

impl Transformable for BillboardTransform {
    fn matrix(&self) -> &Mat4 {
        BillboardTransform::matrix(self)
    }

    fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        BillboardTransform::set_translation(self, x, y, z);
    }

    fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        BillboardTransform::set_rotation(self, angle, axis);
    }

    fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        BillboardTransform::set_scaling(self, x, y, z);
    }

    fn update(&mut self, camera: &Camera) {
        self.update_from_eye(camera.eye());
    }

    fn needs_update(&self, camera: &Camera) -> bool {
        self.is_stale(camera.eye())
    }
}

// ===== MODEL TRANSFORM =====

#[derive(Debug, Clone, PartialEq)]
pub enum ModelTransform {
    Static(Transform),
    Sprite(SpriteTransform),
    Billboard(BillboardTransform),
}

impl ModelTransform {
    fn inner(&self) -> &dyn Transformable {
        match self {
            ModelTransform::Static(t) => t,
            ModelTransform::Sprite(t) => t,
            ModelTransform::Billboard(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Transformable {
        match self {
            ModelTransform::Static(t) => t,
            ModelTransform::Sprite(t) => t,
            ModelTransform::Billboard(t) => t,
        }
    }

    pub fn is_camera_facing(&self) -> bool {
        !matches!(self, ModelTransform::Static(_))
    }

    /// Matrix the setters have built, without any camera rotation
    pub fn base_matrix(&self) -> Mat4 {
        match self {
            ModelTransform::Static(t) => *t.matrix(),
            ModelTransform::Sprite(t) => *t.base().matrix(),
            ModelTransform::Billboard(t) => *t.base().matrix(),
        }
    }

    /// Same placement, facing the camera
    pub fn to_sprite(&self) -> ModelTransform {
        match self {
            ModelTransform::Sprite(_) => self.clone(),
            _ => ModelTransform::Sprite(SpriteTransform::from_matrix(self.base_matrix())),
        }
    }

    /// Same placement, camera independent
    pub fn to_static(&self) -> ModelTransform {
        match self {
            ModelTransform::Static(_) => self.clone(),
            _ => ModelTransform::Static(Transform::from_matrix(self.base_matrix())),
        }
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        ModelTransform::Static(Transform::new())
    }
}

impl From<Transform> for ModelTransform {
    fn from(t: Transform) -> Self {
        ModelTransform::Static(t)
    }
}

impl From<SpriteTransform> for ModelTransform {
    fn from(t: SpriteTransform) -> Self {
        ModelTransform::Sprite(t)
    }
}

impl From<BillboardTransform> for ModelTransform {
    fn from(t: BillboardTransform) -> Self {
        ModelTransform::Billboard(t)
    }
}

impl Transformable for ModelTransform {
    fn matrix(&self) -> &Mat4 {
        self.inner().matrix()
    }

    fn set_translation(&mut self, x: f32, y: f32, z: f32) {
        self.inner_mut().set_translation(x, y, z);
    }

    fn set_rotation(&mut self, angle: f32, axis: Vec3) {
        self.inner_mut().set_rotation(angle, axis);
    }

    fn set_scaling(&mut self, x: f32, y: f32, z: f32) {
        self.inner_mut().set_scaling(x, y, z);
    }

    fn update(&mut self, camera: &Camera) {
        self.inner_mut().update(camera);
    }

    fn needs_update(&self, camera: &Camera) -> bool {
        self.inner().needs_update(camera)
    }
}

#[cfg(test)]
#[path = "model_transform_tests.rs"]
mod tests;

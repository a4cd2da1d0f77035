/// Text label: a textured quad showing a rasterized string.
///
/// The text bitmap is produced by a caller-supplied rasterizer and cached
/// in the texture cache under `label:<text>`, so labels with the same text
/// share one texture. The quad stands upright (XZ plane) and can be
/// switched to face the camera.

use glam::{Vec3, Vec4};
use std::f32::consts::FRAC_PI_2;
use crate::camera::Camera;
use crate::drawable::drawable::{DrawOutcome, Drawable};
use crate::graphics::GraphicsContext;
use crate::material::{Material, ParamValue};
use crate::resource::{MeshData, ResourceManager, TextureData};
use crate::shader::builtin;
use crate::transform::{ModelTransform, Transform};

/// Cache key of a label's text texture
pub fn label_texture_key(text: &str) -> String {
    format!("label:{}", text)
}

/// Key of the quad mesh shared by all labels
pub const LABEL_MESH: &str = "quad";

#[derive(Debug, Clone, PartialEq)]
pub struct LabelOptions {
    /// Text color (multiplied with the bitmap coverage)
    pub color: [f32; 4],
    /// World-space height of the quad
    pub height: f32,
    pub face_camera: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self { color: [0.0, 0.0, 0.0, 1.0], height: 1.0, face_camera: false }
    }
}

pub struct Label {
    text: String,
    options: LabelOptions,
    position: Vec3,
    aspect: f32,
    drawable: Drawable,
}

impl Label {
    /// Create a label for `text`
    ///
    /// `rasterize` runs only when no texture for this text is cached yet.
    pub fn new<F>(
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        text: &str,
        options: LabelOptions,
        rasterize: F,
    ) -> Self
    where
        F: FnOnce(&str) -> TextureData,
    {
        let key = label_texture_key(text);
        let texture = match resources.textures().find(&key) {
            Some(handle) => handle,
            None => {
                let data = rasterize(text);
                resources.create_texture(ctx, &key, data.desc, data.pixels.as_deref())
            }
        };
        let aspect = resources
            .textures()
            .get(texture)
            .filter(|t| t.height() > 0)
            .map_or(1.0, |t| t.width() as f32 / t.height() as f32);

        let mesh = resources.create_mesh(ctx, LABEL_MESH, &MeshData::quad());
        let shader = resources.get_shader(ctx, builtin::LABEL, &[] as &[&str]);

        let mut material = Material::new(&key);
        if let Some(compiled) = resources.shaders().shader(shader) {
            material.attach_shader(shader, compiled);
        }
        material.set_transparent(true);
        material.set_parameter("uTexture0", ParamValue::Texture(texture));
        material.set_parameter("uColor", ParamValue::Vec4(Vec4::from_array(options.color)));

        let transform = placement(Vec3::ZERO, aspect, &options);
        Self {
            text: text.to_string(),
            options,
            position: Vec3::ZERO,
            aspect,
            drawable: Drawable::new(&key, mesh, material, transform),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    pub fn drawable_mut(&mut self) -> &mut Drawable {
        &mut self.drawable
    }

    pub fn is_face_camera(&self) -> bool {
        self.options.face_camera
    }

    /// Move the label's center to `position` (world space)
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.drawable.set_transform(placement(position, self.aspect, &self.options));
    }

    /// Switch between a fixed and a camera-facing quad, keeping the placement
    pub fn set_face_camera(&mut self, enabled: bool) {
        if self.options.face_camera == enabled {
            return;
        }
        self.options.face_camera = enabled;
        let transform = if enabled {
            self.drawable.transform().to_sprite()
        } else {
            self.drawable.transform().to_static()
        };
        self.drawable.set_transform(transform);
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.options.color = color;
        self.drawable
            .material_mut()
            .set_parameter("uColor", ParamValue::Vec4(Vec4::from_array(color)));
    }

    pub fn draw(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        camera: &Camera,
    ) -> DrawOutcome {
        self.drawable.draw(ctx, resources, camera)
    }

    pub fn destroy(&mut self) {
        self.drawable.destroy();
    }
}

/// Upright quad of the label's size centered on `position`
fn placement(position: Vec3, aspect: f32, options: &LabelOptions) -> ModelTransform {
    let half = options.height * 0.5;
    let mut transform = Transform::new();
    transform.set_translation(position.x, position.y, position.z);
    transform.set_scaling(half * aspect, 1.0, half);
    transform.set_rotation(FRAC_PI_2, Vec3::X);

    let transform = ModelTransform::from(transform);
    if options.face_camera {
        transform.to_sprite()
    } else {
        transform
    }
}

#[cfg(test)]
#[path = "label_tests.rs"]
mod tests;

/// Point sprite: a single point drawn with a fixed pixel size.
///
/// The look is a shader permutation of the builtin `sprite` template:
/// `TEXTURE` samples a texture over the point, `DISC` cuts the point to a
/// circle, `SQUARE` keeps it square. Changing the look switches to another
/// permutation and rebuilds the material, keeping the parameter values.

use glam::{Vec3, Vec4};
use crate::camera::Camera;
use crate::drawable::drawable::{DrawOutcome, Drawable};
use crate::graphics::GraphicsContext;
use crate::material::{Material, ParamValue};
use crate::resource::{MeshData, ResourceManager, TextureHandle};
use crate::shader::builtin;
use crate::transform::{ModelTransform, Transform};

/// Key of the point mesh shared by all sprites
pub const SPRITE_MESH: &str = "point";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpriteShape {
    #[default]
    Square,
    Disc,
}

impl SpriteShape {
    pub fn flag(self) -> &'static str {
        match self {
            SpriteShape::Square => "SQUARE",
            SpriteShape::Disc => "DISC",
        }
    }
}

pub struct Sprite {
    size: f32,
    shape: SpriteShape,
    color: [f32; 4],
    texture: Option<TextureHandle>,
    drawable: Drawable,
}

impl Sprite {
    /// Red square sprite of `size` pixels at the origin
    pub fn new(ctx: &mut GraphicsContext, resources: &mut ResourceManager, name: &str, size: f32) -> Self {
        let mesh = resources.create_mesh(ctx, SPRITE_MESH, &MeshData::point());
        let mut sprite = Self {
            size,
            shape: SpriteShape::default(),
            color: [1.0, 0.0, 0.0, 1.0],
            texture: None,
            drawable: Drawable::new(name, mesh, Material::new(name), ModelTransform::default()),
        };
        sprite.rebuild_material(ctx, resources);
        sprite
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn shape(&self) -> SpriteShape {
        self.shape
    }

    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    pub fn drawable_mut(&mut self) -> &mut Drawable {
        &mut self.drawable
    }

    /// Shader flags of the current look
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = vec![self.shape.flag()];
        if self.texture.is_some() {
            flags.push("TEXTURE");
        }
        flags
    }

    pub fn set_position(&mut self, position: Vec3) {
        let mut transform = Transform::new();
        transform.set_translation(position.x, position.y, position.z);
        self.drawable.set_transform(ModelTransform::from(transform));
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        self.drawable.material_mut().set_parameter("uPointSize", ParamValue::Float(size));
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
        self.drawable
            .material_mut()
            .set_parameter("uColor", ParamValue::Vec4(Vec4::from_array(color)));
    }

    pub fn set_shape(&mut self, ctx: &mut GraphicsContext, resources: &mut ResourceManager, shape: SpriteShape) {
        if self.shape != shape {
            self.shape = shape;
            self.rebuild_material(ctx, resources);
        }
    }

    /// Sample `texture` over the point (tinted by the color), or stop
    /// texturing with `None`
    pub fn set_texture(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        texture: Option<TextureHandle>,
    ) {
        let permutation_changed = self.texture.is_some() != texture.is_some();
        self.texture = texture;
        if permutation_changed {
            self.rebuild_material(ctx, resources);
        } else if let Some(handle) = texture {
            self.drawable.material_mut().set_parameter("uTexture0", ParamValue::Texture(handle));
        }
    }

    fn rebuild_material(&mut self, ctx: &mut GraphicsContext, resources: &mut ResourceManager) {
        let shader = resources.get_shader(ctx, builtin::SPRITE, &self.flags());

        let mut material = Material::new(self.drawable.name());
        if let Some(compiled) = resources.shaders().shader(shader) {
            material.attach_shader(shader, compiled);
        }
        material.set_parameter("uPointSize", ParamValue::Float(self.size));
        material.set_parameter("uColor", ParamValue::Vec4(Vec4::from_array(self.color)));
        if let Some(texture) = self.texture {
            material.set_parameter("uTexture0", ParamValue::Texture(texture));
        }
        self.drawable.set_material(material);
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

#[cfg(test)]
#[path = "sprite_tests.rs"]
mod tests;

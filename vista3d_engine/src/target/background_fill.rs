/// Full-viewport background image.
///
/// Draws a texture over the whole target with "cover" fitting: the image
/// keeps its aspect ratio and is cropped along the axis where it overflows.
/// The crop scale depends on the target size, so it is cached and only
/// recomputed when the target's generation changes.

use glam::Vec2;
use crate::drawable::{DrawOutcome, SkipReason};
use crate::graphics::{GraphicsContext, UniformValue};
use crate::resource::{MeshData, MeshHandle, Resource, ResourceManager, TextureHandle};
use crate::shader::{builtin, ShaderHandle};
use crate::target::render_target::RenderTarget;

/// Key of the position-only quad used by full-screen passes
pub const FILL_MESH: &str = "solid_quad";

const TEXTURE_UNIT: u32 = 0;

/// Texture coordinate scale for covering a `target` sized viewport with an
/// `image` sized texture
pub fn cover_scale(image: (u32, u32), target: (u32, u32)) -> Vec2 {
    if image.0 == 0 || image.1 == 0 || target.0 == 0 || target.1 == 0 {
        return Vec2::ONE;
    }
    let image_aspect = image.0 as f32 / image.1 as f32;
    let target_aspect = target.0 as f32 / target.1 as f32;
    if target_aspect > image_aspect {
        Vec2::new(1.0, image_aspect / target_aspect)
    } else {
        Vec2::new(target_aspect / image_aspect, 1.0)
    }
}

pub struct BackgroundFill {
    texture: TextureHandle,
    mesh: MeshHandle,
    shader: ShaderHandle,
    scale: Vec2,
    /// Target generation `scale` was computed for
    fitted_generation: Option<u64>,
}

impl BackgroundFill {
    pub fn new(ctx: &mut GraphicsContext, resources: &mut ResourceManager, texture: TextureHandle) -> Self {
        let mesh = resources.create_mesh(ctx, FILL_MESH, &MeshData::solid_quad());
        let shader = resources.get_shader(ctx, builtin::BLIT, &[] as &[&str]);
        Self {
            texture,
            mesh,
            shader,
            scale: Vec2::ONE,
            fitted_generation: None,
        }
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn set_texture(&mut self, texture: TextureHandle) {
        self.texture = texture;
        self.fitted_generation = None;
    }

    /// Current crop scale
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Recompute the crop scale if `target` was resized since the last fit
    ///
    /// Returns true when the scale was recomputed. A texture that is not
    /// ready yet leaves the fit pending.
    pub fn fit(&mut self, target: &RenderTarget, resources: &ResourceManager) -> bool {
        if self.fitted_generation == Some(target.generation()) {
            return false;
        }
        let Some(texture) = resources.textures().get(self.texture).filter(|t| t.is_ready()) else {
            return false;
        };
        self.scale = cover_scale((texture.width(), texture.height()), (target.width(), target.height()));
        self.fitted_generation = Some(target.generation());
        true
    }

    /// Draw the image over `target`, which must be bound
    ///
    /// Depth writes are off during the fill and restored to the target's
    /// setting afterwards.
    pub fn draw(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        target: &RenderTarget,
    ) -> DrawOutcome {
        if !resources.textures().is_ready(self.texture) {
            return DrawOutcome::Skipped(SkipReason::TextureNotReady);
        }
        self.fit(target, resources);

        let Some(mesh) = resources.meshes.get(self.mesh).filter(|m| m.is_ready()) else {
            return DrawOutcome::Skipped(SkipReason::MeshNotReady);
        };
        let Some(shader) = resources.shaders.shader(self.shader).filter(|s| s.is_ready()) else {
            return DrawOutcome::Skipped(SkipReason::ShaderNotReady);
        };
        let Some(texture) = resources.textures.get(self.texture) else {
            return DrawOutcome::Skipped(SkipReason::TextureNotReady);
        };

        shader.bind(ctx);
        texture.bind(ctx, TEXTURE_UNIT);
        shader.upload(ctx, "uTexture0", &UniformValue::Sampler(TEXTURE_UNIT as i32));
        shader.upload(ctx, "uScale", &UniformValue::Vec2(self.scale));

        ctx.depth_mask(false);
        mesh.bind(ctx);
        mesh.draw(ctx);
        ctx.depth_mask(target.options().depth_mask);
        DrawOutcome::Drawn
    }
}

#[cfg(test)]
#[path = "background_fill_tests.rs"]
mod tests;

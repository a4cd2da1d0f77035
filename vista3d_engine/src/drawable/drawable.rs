/// Drawable: the unit submitted to a draw call.
///
/// A drawable composes a cached mesh, an owned material and an owned model
/// transform. Mesh, shader and textures stay owned by the resource manager;
/// `destroy` only drops this drawable's references to them.

use crate::camera::Camera;
use crate::graphics::GraphicsContext;
use crate::material::Material;
use crate::resource::{MeshHandle, Resource, ResourceManager};
use crate::transform::{ModelTransform, Transformable};

/// Why a drawable was not drawn this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Hidden,
    Destroyed,
    MeshNotReady,
    NoShader,
    ShaderNotReady,
    TextureNotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawOutcome {
    Drawn,
    Skipped(SkipReason),
}

impl DrawOutcome {
    pub fn is_drawn(&self) -> bool {
        *self == DrawOutcome::Drawn
    }
}

pub struct Drawable {
    name: String,
    mesh: Option<MeshHandle>,
    material: Material,
    transform: ModelTransform,
    visible: bool,
}

impl Drawable {
    pub fn new(name: &str, mesh: MeshHandle, material: Material, transform: ModelTransform) -> Self {
        Self {
            name: name.to_string(),
            mesh: Some(mesh),
            material,
            transform,
            visible: true,
        }
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mesh handle, `None` after `destroy`
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn transform(&self) -> &ModelTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut ModelTransform {
        &mut self.transform
    }

    pub fn set_transform(&mut self, transform: ModelTransform) {
        self.transform = transform;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_destroyed(&self) -> bool {
        self.mesh.is_none()
    }

    // ===== FRAME =====

    /// Per-frame camera update of camera-facing transforms
    pub fn update(&mut self, camera: &Camera) {
        self.transform.update(camera);
    }

    /// Submit one draw call
    ///
    /// Binds the material's shader, uploads camera, model matrix and
    /// material parameters, then draws the mesh. Camera-facing transforms
    /// not yet updated for this camera position are updated first.
    pub fn draw(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        camera: &Camera,
    ) -> DrawOutcome {
        if !self.visible {
            return DrawOutcome::Skipped(SkipReason::Hidden);
        }
        let Some(mesh_handle) = self.mesh else {
            return DrawOutcome::Skipped(SkipReason::Destroyed);
        };
        let Some(mesh) = resources.meshes.get(mesh_handle).filter(|m| m.is_ready()) else {
            return DrawOutcome::Skipped(SkipReason::MeshNotReady);
        };
        let Some(shader_handle) = self.material.shader() else {
            return DrawOutcome::Skipped(SkipReason::NoShader);
        };
        let Some(shader) = resources.shaders.shader_mut(shader_handle).filter(|s| s.is_ready()) else {
            return DrawOutcome::Skipped(SkipReason::ShaderNotReady);
        };

        if self.transform.needs_update(camera) {
            self.transform.update(camera);
        }

        shader.bind(ctx);
        shader.bind_camera(ctx, camera);
        self.transform.bind(ctx, shader);
        self.material.upload(ctx, shader, &resources.textures);

        mesh.bind(ctx);
        mesh.draw(ctx);
        DrawOutcome::Drawn
    }

    /// Drop the references to cached resources
    pub fn destroy(&mut self) {
        self.mesh = None;
        self.material = Material::new(&self.name);
        self.transform = ModelTransform::default();
    }
}

#[cfg(test)]
#[path = "drawable_tests.rs"]
mod tests;

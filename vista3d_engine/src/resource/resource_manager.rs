/// Central resource manager.
///
/// Owns one cache per resource kind plus the shader template library.
/// Resources are shared by name: asking twice for the same name returns
/// the same handle. Nothing is evicted implicitly; callers destroy what
/// they created. Creation failures never reach the frame loop: the entry
/// exists and stays not-ready, with a warning logged.

use crate::graphics::{GraphicsContext, ProfilingCounters, TextureDesc};
use crate::resource::framebuffer::{Framebuffer, FramebufferHandle};
use crate::resource::mesh::{Mesh, MeshData, MeshHandle};
use crate::resource::resource_cache::{LoadTicket, Resource, ResourceCache};
use crate::resource::texture::{Texture, TextureData, TextureHandle};
use crate::shader::{ShaderHandle, ShaderLibrary, ShaderPermutationCache};
use crate::{engine_info, engine_warn};

pub struct ResourceManager {
    pub(crate) textures: ResourceCache<Texture>,
    pub(crate) meshes: ResourceCache<Mesh>,
    pub(crate) framebuffers: ResourceCache<Framebuffer>,
    pub(crate) shaders: ShaderPermutationCache,
    pub(crate) library: ShaderLibrary,
}

impl ResourceManager {
    /// Create a manager with the builtin shader library
    pub fn new() -> Self {
        Self::with_library(ShaderLibrary::with_builtins())
    }

    pub fn with_library(library: ShaderLibrary) -> Self {
        Self {
            textures: ResourceCache::new("Texture"),
            meshes: ResourceCache::new("Mesh"),
            framebuffers: ResourceCache::new("Framebuffer"),
            shaders: ShaderPermutationCache::new(),
            library,
        }
    }

    // ===== CACHE ACCESS =====

    pub fn textures(&self) -> &ResourceCache<Texture> {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut ResourceCache<Texture> {
        &mut self.textures
    }

    pub fn meshes(&self) -> &ResourceCache<Mesh> {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut ResourceCache<Mesh> {
        &mut self.meshes
    }

    pub fn framebuffers(&self) -> &ResourceCache<Framebuffer> {
        &self.framebuffers
    }

    pub fn shaders(&self) -> &ShaderPermutationCache {
        &self.shaders
    }

    pub fn shaders_mut(&mut self) -> &mut ShaderPermutationCache {
        &mut self.shaders
    }

    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ShaderLibrary {
        &mut self.library
    }

    // ===== TEXTURES =====

    /// Texture `name`, uploaded from `pixels` on first request
    pub fn create_texture(
        &mut self,
        ctx: &mut GraphicsContext,
        name: &str,
        desc: TextureDesc,
        pixels: Option<&[u8]>,
    ) -> TextureHandle {
        self.textures
            .get_or_create(name, || Texture::create_or_pending(ctx, name, desc, pixels))
    }

    /// Texture `name` loaded asynchronously
    ///
    /// The ticket is returned only to the first requester, who must
    /// complete or fail it. `desc` describes the placeholder until then.
    pub fn load_texture(
        &mut self,
        name: &str,
        desc: TextureDesc,
    ) -> (TextureHandle, Option<LoadTicket<TextureData>>) {
        self.textures.get_or_create_async(name, || Texture::pending(desc))
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.contains(name)
    }

    // ===== MESHES =====

    /// Mesh `name`, uploaded from `data` on first request
    pub fn create_mesh(&mut self, ctx: &mut GraphicsContext, name: &str, data: &MeshData) -> MeshHandle {
        self.meshes.get_or_create(name, || match Mesh::create(ctx, data) {
            Ok(mesh) => mesh,
            Err(err) => {
                engine_warn!("vista3d::ResourceManager", "Mesh '{}' not created: {}", name, err);
                Mesh::pending()
            }
        })
    }

    /// Mesh `name` loaded asynchronously
    pub fn load_mesh(&mut self, name: &str) -> (MeshHandle, Option<LoadTicket<MeshData>>) {
        self.meshes.get_or_create_async(name, Mesh::pending)
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains(name)
    }

    // ===== FRAMEBUFFERS =====

    /// Framebuffer `name` over the given attachments
    pub fn create_framebuffer(
        &mut self,
        ctx: &mut GraphicsContext,
        name: &str,
        color: TextureHandle,
        depth: Option<TextureHandle>,
    ) -> FramebufferHandle {
        let textures = &self.textures;
        self.framebuffers.get_or_create(name, || {
            match Framebuffer::create(ctx, textures, color, depth) {
                Ok(framebuffer) => framebuffer,
                Err(err) => {
                    engine_warn!("vista3d::ResourceManager",
                        "Framebuffer '{}' not created: {}", name, err);
                    Framebuffer::pending(color, depth)
                }
            }
        })
    }

    pub fn has_framebuffer(&self, name: &str) -> bool {
        self.framebuffers.contains(name)
    }

    /// Release every framebuffer and its attachments' storage
    ///
    /// Used while the surface is in the background; `restore` reallocates.
    pub fn discard(&mut self, ctx: &mut GraphicsContext) {
        let textures = &mut self.textures;
        for (_, _, framebuffer) in self.framebuffers.iter_mut() {
            framebuffer.discard(ctx, textures);
        }
    }

    pub fn restore(&mut self, ctx: &mut GraphicsContext) {
        let textures = &mut self.textures;
        for (_, name, framebuffer) in self.framebuffers.iter_mut() {
            if let Err(err) = framebuffer.restore(ctx, textures) {
                engine_warn!("vista3d::ResourceManager", "Framebuffer '{}' not restored: {}", name, err);
            }
        }
    }

    // ===== SHADERS =====

    /// Shader permutation of builtin or registered template `base`
    pub fn get_shader<S: AsRef<str>>(&mut self, ctx: &mut GraphicsContext, base: &str, flags: &[S]) -> ShaderHandle {
        self.shaders.get(ctx, &self.library, base, flags)
    }

    pub fn has_shader<S: AsRef<str>>(&self, base: &str, flags: &[S]) -> bool {
        self.shaders.find(base, flags).is_some()
    }

    // ===== FRAME =====

    /// Apply finished asynchronous loads; returns the number of resources
    /// that became ready
    ///
    /// Shaders waiting for a template delivered by `ShaderLibrary::finish_load`
    /// are compiled here too.
    pub fn process_completions(&mut self, ctx: &mut GraphicsContext) -> usize {
        self.textures.process_completions(ctx)
            + self.meshes.process_completions(ctx)
            + self.shaders.compile_pending(ctx, &self.library)
    }

    /// Write memory statistics of ready resources into the cumulative counters
    pub fn update_memory_stats(&self, counters: &mut ProfilingCounters) {
        let mut texture_bytes = 0u64;
        let mut texture_count = 0u32;
        for (_, _, texture) in self.textures.iter().filter(|(_, _, t)| t.is_ready()) {
            texture_bytes += texture.desc().byte_size();
            texture_count += 1;
        }
        let mut mesh_bytes = 0u64;
        let mut mesh_count = 0u32;
        for (_, _, mesh) in self.meshes.iter().filter(|(_, _, m)| m.is_ready()) {
            mesh_bytes += mesh.byte_size();
            mesh_count += 1;
        }

        counters.texture_kbytes = texture_bytes as f64 / 1024.0;
        counters.texture_count = texture_count;
        counters.mesh_kbytes = mesh_bytes as f64 / 1024.0;
        counters.mesh_count = mesh_count;
        counters.framebuffer_count = self.framebuffers.iter().filter(|(_, _, f)| f.is_ready()).count() as u32;
        counters.shader_count = self.shaders.ready_count() as u32;
    }

    /// Release every resource
    pub fn destroy_all(&mut self, ctx: &mut GraphicsContext) {
        // Framebuffers reference textures
        self.framebuffers.destroy_all(ctx);
        self.textures.destroy_all(ctx);
        self.meshes.destroy_all(ctx);
        self.shaders.destroy_all(ctx);
        engine_info!("vista3d::ResourceManager", "All resources destroyed");
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;

//! Resource management module
//!
//! Named-key caches for GPU resources and the manager owning them.

mod resource_manager;
pub mod framebuffer;
pub mod mesh;
pub mod resource_cache;
pub mod texture;

pub use resource_manager::ResourceManager;
pub use framebuffer::{clamp_framebuffer_size, Framebuffer, FramebufferHandle, MAX_FRAMEBUFFER_SIZE};
pub use mesh::{builtin_layout, Mesh, MeshData, MeshHandle, MeshIndices, BUILTIN_ATTRIBUTES};
pub use resource_cache::{LoadTicket, Resource, ResourceCache, ResourceHandle, ResourceKey};
pub use texture::{Texture, TextureData, TextureHandle};

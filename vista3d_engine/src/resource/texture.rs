/// Cached 2D texture resource.
///
/// A texture is either created synchronously from pixel data, or inserted
/// pending and completed later from a `TextureData` payload. Render-target
/// textures have no pixel data and can be resized, discarded (GPU object
/// released, description kept) and restored.

use crate::error::Result;
use crate::graphics::{GraphicsContext, TextureDesc, TextureId};
use crate::resource::resource_cache::{Resource, ResourceHandle};
use crate::engine_warn;

/// Handle to a texture in the resource manager
pub type TextureHandle = ResourceHandle<Texture>;

/// Payload of an asynchronous texture load
#[derive(Debug, Clone)]
pub struct TextureData {
    pub desc: TextureDesc,
    pub pixels: Option<Vec<u8>>,
}

#[derive(Debug)]
pub struct Texture {
    desc: TextureDesc,
    id: Option<TextureId>,
}

impl Texture {
    /// Create and upload a texture
    pub fn create(ctx: &mut GraphicsContext, desc: TextureDesc, pixels: Option<&[u8]>) -> Result<Self> {
        let id = ctx.create_texture(&desc, pixels)?;
        Ok(Self { desc, id: Some(id) })
    }

    /// Not-ready placeholder, completed by a later upload
    pub fn pending(desc: TextureDesc) -> Self {
        Self { desc, id: None }
    }

    /// Create a texture, degrading to a not-ready one on failure
    pub(crate) fn create_or_pending(
        ctx: &mut GraphicsContext,
        name: &str,
        desc: TextureDesc,
        pixels: Option<&[u8]>,
    ) -> Self {
        match Self::create(ctx, desc.clone(), pixels) {
            Ok(texture) => texture,
            Err(err) => {
                engine_warn!("vista3d::Texture", "Texture '{}' not created: {}", name, err);
                Self::pending(desc)
            }
        }
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    /// GPU object, `None` while not ready
    pub fn id(&self) -> Option<TextureId> {
        self.id
    }

    /// Bind to a texture unit; false (nothing bound) when not ready
    pub fn bind(&self, ctx: &mut GraphicsContext, unit: u32) -> bool {
        match self.id {
            Some(id) => {
                ctx.bind_texture(unit, Some(id));
                true
            }
            None => false,
        }
    }

    /// Reallocate storage at a new size (content is lost)
    ///
    /// No-op when the size is unchanged, so textures shared by several
    /// framebuffers are reallocated once. On failure the texture keeps its
    /// previous storage and size.
    pub fn resize(&mut self, ctx: &mut GraphicsContext, width: u32, height: u32) -> Result<()> {
        if self.has_size(width, height) {
            return Ok(());
        }
        let id = self.allocate(ctx, width, height)?;
        self.replace(ctx, id, width, height);
        Ok(())
    }

    /// Ready with storage of exactly this size
    pub(crate) fn has_size(&self, width: u32, height: u32) -> bool {
        self.id.is_some() && self.desc.width == width && self.desc.height == height
    }

    /// New empty storage matching this texture at another size
    pub(crate) fn allocate(&self, ctx: &mut GraphicsContext, width: u32, height: u32) -> Result<TextureId> {
        let desc = TextureDesc { width, height, ..self.desc.clone() };
        ctx.create_texture(&desc, None)
    }

    /// Swap in storage from `allocate`, releasing the old one
    pub(crate) fn replace(&mut self, ctx: &mut GraphicsContext, id: TextureId, width: u32, height: u32) {
        self.release(ctx);
        self.desc.width = width;
        self.desc.height = height;
        self.id = Some(id);
    }

    /// Release the GPU object, keeping the description for `restore`
    pub fn discard(&mut self, ctx: &mut GraphicsContext) {
        self.release(ctx);
    }

    /// Recreate an empty GPU object after `discard`
    pub fn restore(&mut self, ctx: &mut GraphicsContext) -> Result<()> {
        if self.id.is_none() {
            self.id = Some(ctx.create_texture(&self.desc, None)?);
        }
        Ok(())
    }
}

impl Resource for Texture {
    type Payload = TextureData;

    fn is_ready(&self) -> bool {
        self.id.is_some()
    }

    fn complete(&mut self, ctx: &mut GraphicsContext, payload: TextureData) -> Result<()> {
        let id = ctx.create_texture(&payload.desc, payload.pixels.as_deref())?;
        self.desc = payload.desc;
        self.id = Some(id);
        Ok(())
    }

    fn release(&mut self, ctx: &mut GraphicsContext) {
        if let Some(id) = self.id.take() {
            ctx.delete_texture(id);
        }
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;

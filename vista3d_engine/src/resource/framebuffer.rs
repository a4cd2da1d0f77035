/// Cached framebuffer resource.
///
/// A framebuffer attaches one color texture and an optional depth texture,
/// both living in the texture cache (and possibly shared by several
/// framebuffers). Resizing reallocates the attachments and rebuilds the
/// framebuffer object.

use std::convert::Infallible;
use crate::error::{Error, Result};
use crate::graphics::{FramebufferId, GraphicsContext, TextureId};
use crate::resource::resource_cache::{Resource, ResourceCache, ResourceHandle};
use crate::resource::texture::{Texture, TextureHandle};

/// Handle to a framebuffer in the resource manager
pub type FramebufferHandle = ResourceHandle<Framebuffer>;

/// Largest framebuffer dimension
pub const MAX_FRAMEBUFFER_SIZE: u32 = 4096;

/// Clamp a size to `MAX_FRAMEBUFFER_SIZE`, preserving the aspect ratio
pub fn clamp_framebuffer_size(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_FRAMEBUFFER_SIZE && height <= MAX_FRAMEBUFFER_SIZE {
        return (width, height);
    }
    let (w, h) = (width as u64, height as u64);
    let max = MAX_FRAMEBUFFER_SIZE as u64;
    if width >= height {
        (MAX_FRAMEBUFFER_SIZE, (h * max / w) as u32)
    } else {
        ((w * max / h) as u32, MAX_FRAMEBUFFER_SIZE)
    }
}

#[derive(Debug)]
pub struct Framebuffer {
    color: TextureHandle,
    depth: Option<TextureHandle>,
    id: Option<FramebufferId>,
}

fn texture_id(textures: &ResourceCache<Texture>, handle: TextureHandle) -> Result<TextureId> {
    textures
        .get(handle)
        .and_then(Texture::id)
        .ok_or_else(|| Error::InvalidResource("framebuffer attachment is not ready".to_string()))
}

/// Attachment storage at the new size, allocating it into `fresh` if needed
fn resized_attachment(
    ctx: &mut GraphicsContext,
    textures: &ResourceCache<Texture>,
    handle: TextureHandle,
    width: u32,
    height: u32,
    fresh: &mut Vec<(TextureHandle, TextureId)>,
) -> Result<TextureId> {
    let texture = textures
        .get(handle)
        .ok_or_else(|| Error::InvalidResource("framebuffer attachment destroyed".to_string()))?;
    if texture.has_size(width, height) {
        return texture_id(textures, handle);
    }
    let id = texture.allocate(ctx, width, height)?;
    fresh.push((handle, id));
    Ok(id)
}

impl Framebuffer {
    /// Build a framebuffer over ready attachments
    pub fn create(
        ctx: &mut GraphicsContext,
        textures: &ResourceCache<Texture>,
        color: TextureHandle,
        depth: Option<TextureHandle>,
    ) -> Result<Self> {
        let mut framebuffer = Self { color, depth, id: None };
        framebuffer.attach(ctx, textures)?;
        Ok(framebuffer)
    }

    /// Not-ready framebuffer, built later by `restore` or `resize`
    pub fn pending(color: TextureHandle, depth: Option<TextureHandle>) -> Self {
        Self { color, depth, id: None }
    }

    fn attach(&mut self, ctx: &mut GraphicsContext, textures: &ResourceCache<Texture>) -> Result<()> {
        let color = texture_id(textures, self.color)?;
        let depth = match self.depth {
            Some(handle) => Some(texture_id(textures, handle)?),
            None => None,
        };
        self.id = Some(ctx.create_framebuffer(color, depth)?);
        Ok(())
    }

    fn detach(&mut self, ctx: &mut GraphicsContext) {
        if let Some(id) = self.id.take() {
            ctx.delete_framebuffer(id);
        }
    }

    pub fn id(&self) -> Option<FramebufferId> {
        self.id
    }

    pub fn color_buffer(&self) -> TextureHandle {
        self.color
    }

    pub fn depth_buffer(&self) -> Option<TextureHandle> {
        self.depth
    }

    /// Size of the color attachment
    pub fn size(&self, textures: &ResourceCache<Texture>) -> Option<(u32, u32)> {
        textures.get(self.color).map(|t| (t.width(), t.height()))
    }

    /// Bind for drawing; false when not ready
    pub fn bind(&self, ctx: &mut GraphicsContext) -> bool {
        match self.id {
            Some(id) => {
                ctx.bind_framebuffer(Some(id));
                true
            }
            None => false,
        }
    }

    /// Resize the attachments (clamped to `MAX_FRAMEBUFFER_SIZE`)
    ///
    /// Shared attachments already at the requested size are kept as is, but
    /// the framebuffer object is always rebuilt since another framebuffer
    /// may have reallocated them. New storage and the new framebuffer object
    /// are built before anything is released: on failure the framebuffer
    /// and its attachments are left as they were.
    pub fn resize(
        &mut self,
        ctx: &mut GraphicsContext,
        textures: &mut ResourceCache<Texture>,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (width, height) = clamp_framebuffer_size(width, height);
        let mut fresh: Vec<(TextureHandle, TextureId)> = Vec::with_capacity(2);

        let built = self.build_resized(ctx, textures, width, height, &mut fresh);
        let id = match built {
            Ok(id) => id,
            Err(err) => {
                for (_, texture) in fresh {
                    ctx.delete_texture(texture);
                }
                return Err(err);
            }
        };

        self.detach(ctx);
        for (handle, texture) in fresh {
            if let Some(attachment) = textures.get_mut(handle) {
                attachment.replace(ctx, texture, width, height);
            }
        }
        self.id = Some(id);
        Ok(())
    }

    fn build_resized(
        &self,
        ctx: &mut GraphicsContext,
        textures: &ResourceCache<Texture>,
        width: u32,
        height: u32,
        fresh: &mut Vec<(TextureHandle, TextureId)>,
    ) -> Result<FramebufferId> {
        let color = resized_attachment(ctx, textures, self.color, width, height, fresh)?;
        let depth = match self.depth {
            Some(handle) => Some(resized_attachment(ctx, textures, handle, width, height, fresh)?),
            None => None,
        };
        ctx.create_framebuffer(color, depth)
    }

    /// Release the framebuffer object and the attachments' storage
    pub fn discard(&mut self, ctx: &mut GraphicsContext, textures: &mut ResourceCache<Texture>) {
        if self.id.is_none() {
            return;
        }
        self.detach(ctx);
        for handle in std::iter::once(self.color).chain(self.depth) {
            if let Some(texture) = textures.get_mut(handle) {
                texture.discard(ctx);
            }
        }
    }

    /// Reallocate what `discard` released
    pub fn restore(&mut self, ctx: &mut GraphicsContext, textures: &mut ResourceCache<Texture>) -> Result<()> {
        if self.id.is_some() {
            return Ok(());
        }
        for handle in std::iter::once(self.color).chain(self.depth) {
            if let Some(texture) = textures.get_mut(handle) {
                texture.restore(ctx)?;
            }
        }
        self.attach(ctx, textures)
    }
}

impl Resource for Framebuffer {
    /// Framebuffers are only created synchronously
    type Payload = Infallible;

    fn is_ready(&self) -> bool {
        self.id.is_some()
    }

    fn complete(&mut self, _ctx: &mut GraphicsContext, payload: Infallible) -> Result<()> {
        match payload {}
    }

    fn release(&mut self, ctx: &mut GraphicsContext) {
        self.detach(ctx);
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;

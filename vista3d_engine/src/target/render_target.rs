/// Render target: where a pass draws, and the state it draws with.
///
/// The `default` target is the screen. Other targets render into a cached
/// framebuffer whose attachments live in the texture cache. Attachments are
/// private to the target (`<name>-cbuf`, `<name>-dbuf`) unless a buffer id
/// is given in the options, in which case targets of the same size and
/// format asking for the same id share one texture.
///
/// The generation counter moves on every resize, so anything caching
/// values derived from the target size can tell when to recompute them.

use crate::error::Result;
use crate::engine_warn;
use crate::graphics::{
    ClearMask, DepthFunc, GraphicsContext, RenderState, TextureDesc, TextureFilter, TextureFormat,
    TextureWrap,
};
use crate::resource::{clamp_framebuffer_size, FramebufferHandle, ResourceManager, TextureHandle};

/// Name of the screen target
pub const DEFAULT_TARGET: &str = "default";

// ===== OPTIONS =====

/// State applied when a target is bound
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetOptions {
    pub clear_color: [f32; 4],
    pub color_mask: [bool; 4],
    pub depth_test: bool,
    pub depth_mask: bool,
    pub depth_func: DepthFunc,
    /// Depth the depth buffer is cleared to, `None` to keep its content
    pub clear_depth: Option<f32>,
    pub blend: bool,
    pub stencil_test: bool,

    pub color_format: TextureFormat,
    /// `None` renders without a depth attachment
    pub depth_format: Option<TextureFormat>,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    /// Share the color attachment with other targets using the same id
    pub color_buffer: Option<u32>,
    /// Share the depth attachment with other targets using the same id
    pub depth_buffer: Option<u32>,
}

impl Default for RenderTargetOptions {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 1.0, 1.0, 0.0],
            color_mask: [true; 4],
            depth_test: true,
            depth_mask: true,
            depth_func: DepthFunc::Less,
            clear_depth: Some(1.0),
            blend: false,
            stencil_test: false,
            color_format: TextureFormat::Rgba8,
            depth_format: Some(TextureFormat::Depth24Stencil8),
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            color_buffer: None,
            depth_buffer: None,
        }
    }
}

impl RenderTargetOptions {
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_blend(mut self, enabled: bool) -> Self {
        self.blend = enabled;
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_depth_mask(mut self, enabled: bool) -> Self {
        self.depth_mask = enabled;
        self
    }

    pub fn with_depth_func(mut self, func: DepthFunc) -> Self {
        self.depth_func = func;
        self
    }

    pub fn with_clear_depth(mut self, depth: Option<f32>) -> Self {
        self.clear_depth = depth;
        self
    }

    pub fn with_stencil_test(mut self, enabled: bool) -> Self {
        self.stencil_test = enabled;
        self
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }

    pub fn with_depth_format(mut self, format: Option<TextureFormat>) -> Self {
        self.depth_format = format;
        self
    }

    pub fn with_shared_color_buffer(mut self, id: u32) -> Self {
        self.color_buffer = Some(id);
        self
    }

    pub fn with_shared_depth_buffer(mut self, id: u32) -> Self {
        self.depth_buffer = Some(id);
        self
    }

    /// Depth attachment format, forced to depth-stencil when stencil testing
    fn effective_depth_format(&self) -> Option<TextureFormat> {
        if self.stencil_test {
            Some(TextureFormat::Depth24Stencil8)
        } else {
            self.depth_format
        }
    }
}

/// Texture cache key of a color attachment
pub fn color_buffer_key(target: &str, shared: Option<u32>, width: u32, height: u32, format: TextureFormat) -> String {
    match shared {
        Some(id) => format!("c{}-{}x{}-{}", id, width, height, format.tag()),
        None => format!("{}-cbuf", target),
    }
}

/// Texture cache key of a depth attachment
pub fn depth_buffer_key(target: &str, shared: Option<u32>, width: u32, height: u32, format: TextureFormat) -> String {
    match shared {
        Some(id) => format!("d{}-{}x{}-{}", id, width, height, format.tag()),
        None => format!("{}-dbuf", target),
    }
}

// ===== RENDER TARGET =====

#[derive(Debug)]
pub struct RenderTarget {
    name: String,
    options: RenderTargetOptions,
    /// `None` for the screen
    framebuffer: Option<FramebufferHandle>,
    width: u32,
    height: u32,
    generation: u64,
}

impl RenderTarget {
    /// The screen target
    pub fn screen(width: u32, height: u32) -> Self {
        Self {
            name: DEFAULT_TARGET.to_string(),
            options: RenderTargetOptions::default(),
            framebuffer: None,
            width,
            height,
            generation: 0,
        }
    }

    /// Offscreen target of the given size (clamped to the framebuffer limit)
    ///
    /// The target is created even when its attachments cannot be; it then
    /// stays not ready and `bind` refuses it.
    pub fn create(
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        name: &str,
        width: u32,
        height: u32,
        options: RenderTargetOptions,
    ) -> Self {
        let (width, height) = clamp_framebuffer_size(width, height);

        let color_key = color_buffer_key(name, options.color_buffer, width, height, options.color_format);
        let color_desc = Self::attachment_desc(&options, options.color_format, width, height);
        let color = resources.create_texture(ctx, &color_key, color_desc, None);

        let depth = options.effective_depth_format().map(|format| {
            let key = depth_buffer_key(name, options.depth_buffer, width, height, format);
            resources.create_texture(ctx, &key, Self::attachment_desc(&options, format, width, height), None)
        });

        let framebuffer = resources.create_framebuffer(ctx, name, color, depth);
        if !resources.framebuffers().is_ready(framebuffer) {
            engine_warn!("vista3d::RenderTarget",
                "Render target '{}' ({}x{}) is not ready", name, width, height);
        }

        Self {
            name: name.to_string(),
            options,
            framebuffer: Some(framebuffer),
            width,
            height,
            generation: 0,
        }
    }

    fn attachment_desc(options: &RenderTargetOptions, format: TextureFormat, width: u32, height: u32) -> TextureDesc {
        TextureDesc { width, height, format, filter: options.filter, wrap: options.wrap }
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &RenderTargetOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RenderTargetOptions {
        &mut self.options
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.options.clear_color = color;
    }

    pub fn is_screen(&self) -> bool {
        self.framebuffer.is_none()
    }

    pub fn framebuffer(&self) -> Option<FramebufferHandle> {
        self.framebuffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bumped on every size change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ready(&self, resources: &ResourceManager) -> bool {
        match self.framebuffer {
            Some(handle) => resources.framebuffers().is_ready(handle),
            None => true,
        }
    }

    pub fn color_buffer(&self, resources: &ResourceManager) -> Option<TextureHandle> {
        let handle = self.framebuffer?;
        resources.framebuffers().get(handle).map(|f| f.color_buffer())
    }

    pub fn depth_buffer(&self, resources: &ResourceManager) -> Option<TextureHandle> {
        let handle = self.framebuffer?;
        resources.framebuffers().get(handle).and_then(|f| f.depth_buffer())
    }

    // ===== FRAME =====

    /// Make this target current, apply its state and clear it
    ///
    /// Returns false, leaving the state untouched, when the framebuffer is
    /// not ready.
    pub fn bind(&self, ctx: &mut GraphicsContext, resources: &ResourceManager) -> bool {
        match self.framebuffer {
            Some(handle) => {
                let bound = resources.framebuffers().get(handle).is_some_and(|f| f.bind(ctx));
                if !bound {
                    engine_warn!("vista3d::RenderTarget",
                        "Render target '{}' is not ready", self.name);
                    return false;
                }
            }
            None => ctx.bind_framebuffer(None),
        }
        ctx.set_viewport(0, 0, self.width, self.height);

        let options = &self.options;
        ctx.set_enabled(RenderState::Blend, options.blend);
        ctx.clear_color(options.clear_color);
        ctx.color_mask(options.color_mask);
        ctx.set_enabled(RenderState::DepthTest, options.depth_test);
        if options.depth_test {
            ctx.depth_func(options.depth_func);
        }
        ctx.depth_mask(options.depth_mask);
        ctx.set_enabled(RenderState::StencilTest, options.stencil_test);

        let mut mask = ClearMask::COLOR;
        if let Some(depth) = options.clear_depth {
            ctx.clear_depth(depth);
            mask |= ClearMask::DEPTH;
        }
        if options.stencil_test {
            mask |= ClearMask::STENCIL;
        }
        ctx.clear(mask);
        true
    }

    /// Follow a viewport size change
    ///
    /// Offscreen attachments are reallocated (clamped to the framebuffer
    /// limit). The generation moves only when the size actually changes;
    /// a failed resize keeps the previous size and attachments.
    pub fn resize(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (width, height) = match self.framebuffer {
            Some(_) => clamp_framebuffer_size(width, height),
            None => (width, height),
        };
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }

        if let Some(handle) = self.framebuffer {
            if let Some(framebuffer) = resources.framebuffers.get_mut(handle) {
                framebuffer.resize(ctx, &mut resources.textures, width, height)?;
            }
        }
        self.width = width;
        self.height = height;
        self.generation += 1;
        Ok(())
    }

    /// Destroy the framebuffer and the attachments private to this target
    ///
    /// Shared attachments stay cached for the other targets using them.
    /// The screen target has nothing to destroy.
    pub fn destroy(self, ctx: &mut GraphicsContext, resources: &mut ResourceManager) {
        let Some(handle) = self.framebuffer else {
            return;
        };
        let attachments = resources
            .framebuffers()
            .get(handle)
            .map(|f| (f.color_buffer(), f.depth_buffer()));
        resources.framebuffers.destroy(ctx, handle);

        if let Some((color, depth)) = attachments {
            if self.options.color_buffer.is_none() {
                resources.textures.destroy(ctx, color);
            }
            if let (Some(depth), None) = (depth, self.options.depth_buffer) {
                resources.textures.destroy(ctx, depth);
            }
        }
    }
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;

//! Graphics context configuration

use crate::graphics::capabilities::ApiVersion;
use crate::graphics::graphics_api::SurfaceRequest;

/// Browser/driver family, selects the GPU sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformFamily {
    /// Chromium-based: `finish` does not block, a one-pixel readback does
    Chromium,
    #[default]
    Other,
}

/// Options used to create a `GraphicsContext`
#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    /// Request a depth buffer on the surface
    pub depth: bool,
    /// Request an alpha channel on the surface
    pub alpha: bool,
    /// Request multisampled antialiasing
    pub antialias: bool,
    /// Request a stencil buffer on the surface
    pub stencil: bool,
    /// Keep the drawing buffer between frames
    pub preserve_drawing_buffer: bool,
    /// Use vertex array objects when available
    pub vao: bool,
    /// Use instanced drawing when available
    pub instancing: bool,
    /// Prefer API version 2, falling back to version 1
    pub webgl2: bool,
    /// Platform family (GPU sync strategy)
    pub platform: PlatformFamily,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            depth: true,
            alpha: false,
            antialias: true,
            stencil: false,
            preserve_drawing_buffer: false,
            vao: true,
            instancing: false,
            webgl2: true,
            platform: PlatformFamily::Other,
        }
    }
}

impl ContextOptions {
    pub fn with_webgl2(mut self, enabled: bool) -> Self {
        self.webgl2 = enabled;
        self
    }

    pub fn with_instancing(mut self, enabled: bool) -> Self {
        self.instancing = enabled;
        self
    }

    pub fn with_vao(mut self, enabled: bool) -> Self {
        self.vao = enabled;
        self
    }

    pub fn with_stencil(mut self, enabled: bool) -> Self {
        self.stencil = enabled;
        self
    }

    pub fn with_platform(mut self, platform: PlatformFamily) -> Self {
        self.platform = platform;
        self
    }

    /// Preferred API version
    pub fn preferred_version(&self) -> ApiVersion {
        if self.webgl2 { ApiVersion::V2 } else { ApiVersion::V1 }
    }

    pub(crate) fn surface_request(&self, version: ApiVersion) -> SurfaceRequest {
        SurfaceRequest {
            version,
            depth: self.depth,
            alpha: self.alpha,
            antialias: self.antialias,
            stencil: self.stencil,
            preserve_drawing_buffer: self.preserve_drawing_buffer,
        }
    }
}

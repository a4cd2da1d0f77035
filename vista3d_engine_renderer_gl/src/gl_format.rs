/// Engine enum to GL constant conversions.
///
/// Pure functions, usable without a GL context. Texture formats depend on
/// the API version: version 1 (GLES 2 / WebGL 1) only takes unsized
/// internal formats, version 2 requires sized ones.

use vista3d_engine::vista3d::graphics::{
    ApiVersion, BufferTarget, ClearMask, DepthFunc, IndexType, PrimitiveMode, RenderState,
    TextureFilter, TextureFormat, TextureWrap, UniformType,
};

/// `tex_image_2d` parameters of a texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTextureFormat {
    pub internal_format: i32,
    pub format: u32,
    pub ty: u32,
}

pub fn texture_format_to_gl(format: TextureFormat, version: ApiVersion) -> GlTextureFormat {
    let (sized, format_enum, ty) = match format {
        TextureFormat::Rgba8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba32F => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
        TextureFormat::Depth16 => (glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT),
        TextureFormat::Depth24Stencil8 => (glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8),
    };
    let internal_format = match version {
        ApiVersion::V1 => format_enum,
        ApiVersion::V2 => sized,
    };
    GlTextureFormat { internal_format: internal_format as i32, format: format_enum, ty }
}

/// Framebuffer attachment point of a depth format
pub fn depth_attachment_to_gl(format: TextureFormat) -> u32 {
    match format {
        TextureFormat::Depth24Stencil8 => glow::DEPTH_STENCIL_ATTACHMENT,
        _ => glow::DEPTH_ATTACHMENT,
    }
}

pub fn texture_filter_to_gl(filter: TextureFilter) -> i32 {
    (match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
    }) as i32
}

pub fn texture_wrap_to_gl(wrap: TextureWrap) -> i32 {
    (match wrap {
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        TextureWrap::Repeat => glow::REPEAT,
    }) as i32
}

pub fn primitive_mode_to_gl(mode: PrimitiveMode) -> u32 {
    match mode {
        PrimitiveMode::Points => glow::POINTS,
        PrimitiveMode::Lines => glow::LINES,
        PrimitiveMode::LineStrip => glow::LINE_STRIP,
        PrimitiveMode::Triangles => glow::TRIANGLES,
        PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
    }
}

pub fn index_type_to_gl(index_type: IndexType) -> u32 {
    match index_type {
        IndexType::U16 => glow::UNSIGNED_SHORT,
        IndexType::U32 => glow::UNSIGNED_INT,
    }
}

pub fn buffer_target_to_gl(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub fn depth_func_to_gl(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Never => glow::NEVER,
        DepthFunc::Less => glow::LESS,
        DepthFunc::Equal => glow::EQUAL,
        DepthFunc::LessEqual => glow::LEQUAL,
        DepthFunc::Greater => glow::GREATER,
        DepthFunc::NotEqual => glow::NOTEQUAL,
        DepthFunc::GreaterEqual => glow::GEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

pub fn render_state_to_gl(state: RenderState) -> u32 {
    match state {
        RenderState::DepthTest => glow::DEPTH_TEST,
        RenderState::Blend => glow::BLEND,
        RenderState::StencilTest => glow::STENCIL_TEST,
        RenderState::CullFace => glow::CULL_FACE,
        RenderState::ScissorTest => glow::SCISSOR_TEST,
    }
}

pub fn clear_mask_to_gl(mask: ClearMask) -> u32 {
    let mut bits = 0;
    if mask.contains(ClearMask::COLOR) {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(ClearMask::DEPTH) {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    if mask.contains(ClearMask::STENCIL) {
        bits |= glow::STENCIL_BUFFER_BIT;
    }
    bits
}

/// Engine uniform type of an active uniform's GL type; `None` for types
/// the engine does not drive
pub fn uniform_type_from_gl(gl_type: u32) -> Option<UniformType> {
    Some(match gl_type {
        glow::FLOAT => UniformType::Float,
        glow::FLOAT_VEC2 => UniformType::Vec2,
        glow::FLOAT_VEC3 => UniformType::Vec3,
        glow::FLOAT_VEC4 => UniformType::Vec4,
        glow::INT => UniformType::Int,
        glow::INT_VEC2 => UniformType::IVec2,
        glow::INT_VEC3 => UniformType::IVec3,
        glow::INT_VEC4 => UniformType::IVec4,
        glow::BOOL => UniformType::Bool,
        glow::FLOAT_MAT3 => UniformType::Mat3,
        glow::FLOAT_MAT4 => UniformType::Mat4,
        glow::SAMPLER_2D => UniformType::Sampler2D,
        glow::SAMPLER_CUBE => UniformType::SamplerCube,
        _ => return None,
    })
}

/// Uniform name without the `[0]` suffix GL reports for arrays
pub fn uniform_base_name(name: &str) -> &str {
    name.strip_suffix("[0]").unwrap_or(name)
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;

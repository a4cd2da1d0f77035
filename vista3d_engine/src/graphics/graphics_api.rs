/// Raw graphics API trait and the plain data types that cross it.
///
/// `GraphicsApi` is what a backend (GL, GLES, WebGL) implements. It is never
/// called directly by engine code: the `GraphicsContext` decorator owns the
/// single instance and forwards to it, counting state changes on the way.
///
/// Object handles are opaque integers. The backend maps them to its native
/// objects.

use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::graphics::capabilities::ApiVersion;

/// Result type of raw backend calls (driver message on failure)
pub type ApiResult<T> = std::result::Result<T, String>;

// ===== HANDLES =====

/// Linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// 2D texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Framebuffer object (never the default framebuffer, which is `None`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Vertex or index buffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

// ===== DRAW TYPES =====

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    /// Number of primitives assembled from `vertex_count` vertices
    pub fn primitive_count(self, vertex_count: u32) -> u32 {
        match self {
            PrimitiveMode::Points => vertex_count,
            PrimitiveMode::Lines => vertex_count / 2,
            PrimitiveMode::LineStrip => vertex_count.saturating_sub(1),
            PrimitiveMode::Triangles => vertex_count / 3,
            PrimitiveMode::TriangleStrip | PrimitiveMode::TriangleFan => {
                vertex_count.saturating_sub(2)
            }
        }
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Fixed-function state toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    DepthTest,
    Blend,
    StencilTest,
    CullFace,
    ScissorTest,
}

bitflags! {
    /// Buffers cleared by `clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ===== OBJECT DESCRIPTIONS =====

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Texel format of a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba32F,
    Depth16,
    Depth24Stencil8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba32F => 16,
            TextureFormat::Depth16 => 2,
            TextureFormat::Depth24Stencil8 => 4,
        }
    }

    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth16 | TextureFormat::Depth24Stencil8)
    }

    /// Short tag used in shared buffer keys
    pub fn tag(self) -> &'static str {
        match self {
            TextureFormat::Rgba8 => "rgba8",
            TextureFormat::Rgba32F => "rgba32f",
            TextureFormat::Depth16 => "d16",
            TextureFormat::Depth24Stencil8 => "d24s8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    ClampToEdge,
    Repeat,
}

/// 2D texture creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl TextureDesc {
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgba8,
            filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
        }
    }

    /// Size of level 0 in bytes
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}

/// One float vertex attribute inside an interleaved vertex buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub offset: u32,
}

/// Interleaved float vertex layout
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

/// Surface parameters requested at context creation
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRequest {
    pub version: ApiVersion,
    pub depth: bool,
    pub alpha: bool,
    pub antialias: bool,
    pub stencil: bool,
    pub preserve_drawing_buffer: bool,
}

// ===== UNIFORMS =====

/// GLSL type of an active uniform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Bool,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
}

impl UniformType {
    pub fn is_sampler(self) -> bool {
        matches!(self, UniformType::Sampler2D | UniformType::SamplerCube)
    }

    fn float_components(self) -> Option<usize> {
        match self {
            UniformType::Float => Some(1),
            UniformType::Vec2 => Some(2),
            UniformType::Vec3 => Some(3),
            UniformType::Vec4 => Some(4),
            UniformType::Mat3 => Some(9),
            UniformType::Mat4 => Some(16),
            _ => None,
        }
    }

    /// Whether `value` can be uploaded to a uniform of this type and array size
    pub fn accepts(self, value: &UniformValue, array_size: u32) -> bool {
        match (self, value) {
            (UniformType::Float, UniformValue::Float(_))
            | (UniformType::Vec2, UniformValue::Vec2(_))
            | (UniformType::Vec3, UniformValue::Vec3(_))
            | (UniformType::Vec4, UniformValue::Vec4(_))
            | (UniformType::Int, UniformValue::Int(_))
            | (UniformType::IVec2, UniformValue::IVec2(_))
            | (UniformType::IVec3, UniformValue::IVec3(_))
            | (UniformType::IVec4, UniformValue::IVec4(_))
            | (UniformType::Bool, UniformValue::Bool(_))
            | (UniformType::Bool, UniformValue::Int(_))
            | (UniformType::Mat3, UniformValue::Mat3(_))
            | (UniformType::Mat4, UniformValue::Mat4(_)) => true,
            (ty, UniformValue::Sampler(_)) | (ty, UniformValue::Int(_)) if ty.is_sampler() => true,
            (ty, UniformValue::FloatArray(values)) => match ty.float_components() {
                Some(n) => !values.is_empty()
                    && values.len() % n == 0
                    && values.len() / n <= array_size.max(1) as usize,
                None => false,
            },
            _ => false,
        }
    }
}

/// Value uploaded to a uniform location
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    IVec4([i32; 4]),
    Bool(bool),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    /// Texture unit index for a sampler uniform
    Sampler(i32),
}

/// Active uniform discovered after linking
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedUniform {
    pub name: String,
    pub ty: UniformType,
    pub size: u32,
    /// Backend-side location slot, passed back to `upload_uniform`
    pub location: u32,
}

/// Active vertex attribute discovered after linking
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedAttribute {
    pub name: String,
    pub location: u32,
}

/// Reflection data of a linked program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramReflection {
    pub uniforms: Vec<ReflectedUniform>,
    pub attributes: Vec<ReflectedAttribute>,
}

// ===== RAW API TRAIT =====

/// Raw graphics API implemented by a backend
///
/// One instance per surface. Calls are made from the thread driving the
/// frame loop only.
pub trait GraphicsApi {
    // ===== SURFACE & DISCOVERY =====

    /// Create (or validate) the drawing surface for the requested API version
    fn create_surface(&mut self, request: &SurfaceRequest) -> ApiResult<()>;

    /// Version string reported by the driver (e.g. "WebGL 2.0", "OpenGL ES 3.0")
    fn version_string(&self) -> String;

    /// Enable an extension by name; `false` when unsupported
    fn enable_extension(&mut self, name: &str) -> bool;

    // ===== DRAW =====

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u32);

    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: u32,
    );

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32);

    // ===== STATE =====

    fn use_program(&mut self, program: Option<ProgramId>);

    fn upload_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue);

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    fn clear_color(&mut self, color: [f32; 4]);

    fn clear_depth(&mut self, depth: f32);

    fn clear(&mut self, mask: ClearMask);

    fn set_enabled(&mut self, state: RenderState, enabled: bool);

    fn depth_mask(&mut self, write: bool);

    fn depth_func(&mut self, func: DepthFunc);

    fn color_mask(&mut self, mask: [bool; 4]);

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    /// Bind buffers and attribute pointers directly (no vertex array object)
    fn bind_vertex_buffers(&mut self, vertices: BufferId, indices: Option<BufferId>, layout: &VertexLayout);

    // ===== SYNC =====

    /// Block until all submitted commands completed
    fn finish(&mut self);

    /// Blocking readback of one RGBA8 pixel of the bound framebuffer
    fn read_pixel(&mut self, x: i32, y: i32) -> [u8; 4];

    // ===== OBJECTS =====

    /// Compile and link a program; attribute names are bound to fixed locations before linking
    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attribute_locations: &[(&str, u32)],
    ) -> ApiResult<(ProgramId, ProgramReflection)>;

    fn delete_program(&mut self, program: ProgramId);

    /// May leave any texture unit unbound
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> ApiResult<TextureId>;

    fn delete_texture(&mut self, texture: TextureId);

    /// May leave the screen bound
    fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> ApiResult<FramebufferId>;

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Must keep the bound vertex array and its index buffer
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> ApiResult<BufferId>;

    fn delete_buffer(&mut self, buffer: BufferId);

    fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: Option<BufferId>,
        layout: &VertexLayout,
    ) -> ApiResult<VertexArrayId>;

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
}

#[cfg(test)]
#[path = "graphics_api_tests.rs"]
mod tests;

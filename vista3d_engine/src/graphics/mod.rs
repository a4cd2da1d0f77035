//! Graphics layer: raw API trait, capability negotiation, the instrumented
//! context and its profiling counters.

pub mod capabilities;
pub mod context_options;
pub mod graphics_api;
pub mod graphics_context;
pub mod profiling;

#[cfg(test)]
pub mod mock_graphics_api;

pub use capabilities::{ApiVersion, Capabilities, CapabilityRule, CapabilitySource, RequestedBy, CAPABILITY_TABLE};
pub use context_options::{ContextOptions, PlatformFamily};
pub use graphics_api::{
    ApiResult, BufferId, BufferTarget, ClearMask, DepthFunc, FramebufferId, GraphicsApi,
    IndexType, PrimitiveMode, ProgramId, ProgramReflection, ReflectedAttribute,
    ReflectedUniform, RenderState, SurfaceRequest, TextureDesc, TextureFilter, TextureFormat,
    TextureId, TextureWrap, UniformType, UniformValue, VertexArrayId, VertexAttribute,
    VertexLayout,
};
pub use graphics_context::{GraphicsContext, MAX_TEXTURE_UNITS};
pub use profiling::{FrameClock, ProfilingCounters};

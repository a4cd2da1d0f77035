//! Shader module: template library, preprocessor, compiled permutations
//! and the permutation cache.

pub mod preprocessor;
pub mod shader;
pub mod shader_cache;
pub mod shader_library;
pub mod shader_source;

pub use preprocessor::preprocess;
pub use shader::{
    Shader, ShaderHandle, ShaderState, RESERVED_PREFIX, U_CAMERA_POSITION, U_MODEL_MATRIX,
    U_VIEW_MATRIX, U_VP_MATRIX, WEBGL2_FLAG,
};
pub use shader_cache::{ShaderKey, ShaderPermutationCache};
pub use shader_library::{builtin, ShaderLibrary, SourceState};
pub use shader_source::{ShaderSource, ShaderSourceOptions};

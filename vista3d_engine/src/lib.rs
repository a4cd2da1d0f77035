/*!
# Vista 3D Engine

Rendering-resource core of the Vista 3D viewer.

This crate sits between a scene and a raw GL-style graphics API. The API
itself is a trait (`GraphicsApi`) implemented by backend crates; everything
above it is platform agnostic.

## Architecture

- **GraphicsContext**: owns the raw API, negotiates capabilities and counts
  every draw call and state change in `ProfilingCounters`
- **ResourceManager**: named caches of textures, meshes, framebuffers and
  shader permutations, with asynchronous loading
- **ShaderLibrary**: shader templates, `#if` flag preprocessing and the
  generated header shared by every program
- **Material**: shader-validated parameters uploaded with minimal state changes
- **Transform**: static, sprite (camera facing) and billboard (Z-axis) model matrices
- **Drawable / RenderTarget**: the units the frame loop draws and draws into
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod drawable;
pub mod graphics;
pub mod material;
pub mod resource;
pub mod shader;
pub mod target;
pub mod transform;

// Main vista3d namespace module
pub mod vista3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Graphics context and its raw API
    pub use crate::graphics::{GraphicsApi, GraphicsContext};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod graphics {
        pub use crate::graphics::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod shader {
        pub use crate::shader::*;
    }

    pub mod material {
        pub use crate::material::*;
    }

    pub mod transform {
        pub use crate::transform::*;
    }

    pub mod scene {
        pub use crate::camera::*;
        pub use crate::drawable::*;
        pub use crate::target::*;
    }
}

// Re-export math library at crate root
pub use glam;

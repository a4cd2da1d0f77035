/*!
# Vista 3D Engine - GL Renderer Backend

OpenGL ES / WebGL implementation of the Vista 3D `GraphicsApi`.

The backend wraps a `glow::Context` created by the windowing layer and maps
engine object ids to native GL objects. Both API generations are served from
the same context: a version 1 surface on a version 2 driver restricts itself
to the WebGL 1 / GLES 2 feature set.

## Example

```no_run
use vista3d_engine::vista3d::graphics::{ContextOptions, GraphicsContext};
use vista3d_engine_renderer_gl::GlGraphicsApi;

# fn run(gl: glow::Context) -> vista3d_engine::vista3d::Result<()> {
let api = GlGraphicsApi::new(gl).with_error_checks(cfg!(debug_assertions));
let _ctx = GraphicsContext::create(Box::new(api), ContextOptions::default())?;
# Ok(())
# }
```
*/

mod gl_format;
mod gl_debug;
mod gl_graphics_api;

pub use gl_graphics_api::GlGraphicsApi;

// Re-export debug utilities
pub use gl_debug::{error_count, error_count_for, print_error_stats_report, reset_error_stats};

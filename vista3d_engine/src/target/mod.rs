//! Render target management module
//!
//! A render target defines where a pass draws (screen or framebuffer) and
//! the state it draws with.

mod background_fill;
mod render_target;
mod target_manager;

pub use background_fill::{cover_scale, BackgroundFill, FILL_MESH};
pub use render_target::{color_buffer_key, depth_buffer_key, RenderTarget, RenderTargetOptions, DEFAULT_TARGET};
pub use target_manager::TargetManager;

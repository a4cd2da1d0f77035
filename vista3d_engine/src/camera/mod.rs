//! Camera module: passive camera data used when drawing.
//!
//! The engine does NOT store or manage cameras. They are owned and driven
//! by the caller and passed to `Drawable::draw` each frame.

mod camera;

pub use camera::{Camera, CameraStamp, Viewport};

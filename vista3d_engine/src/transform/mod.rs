//! Model transforms: static, camera-facing sprite, upright billboard.

mod billboard_job;
mod billboard_transform;
mod model_transform;
mod sprite_transform;
mod transform;

pub use billboard_job::BillboardJob;
pub use billboard_transform::BillboardTransform;
pub use model_transform::{ModelTransform, Transformable};
pub use sprite_transform::SpriteTransform;
pub use transform::Transform;

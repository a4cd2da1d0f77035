//! Drawables: the generic mesh + material + transform record, and the
//! label and point-sprite compositions built around it.

mod drawable;
mod label;
mod sprite;

pub use drawable::{DrawOutcome, Drawable, SkipReason};
pub use label::{label_texture_key, Label, LabelOptions, LABEL_MESH};
pub use sprite::{Sprite, SpriteShape, SPRITE_MESH};

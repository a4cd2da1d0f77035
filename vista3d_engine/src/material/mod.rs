//! Materials: named uniform bindings attached to one shader permutation.

mod material;

pub use material::{Material, ParamValue, MAX_MATERIAL_TEXTURES, TEXTURE_PARAM_PREFIX};

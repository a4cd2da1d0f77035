/// Material: a named bundle of uniform bindings for one shader.
///
/// Parameters are staged on the CPU with a dirty flag and uploaded at draw
/// time. Parameter names must be user uniforms of the attached shader:
/// attaching a shader drops staged names it does not declare and adds an
/// empty parameter for every new uniform. Sampler uniforms named
/// `uTexture0` .. `uTexture2` are bound to the texture unit of their index.
///
/// When the shader last served another material every parameter is
/// uploaded; otherwise only the dirty ones.

use std::sync::atomic::{AtomicU64, Ordering};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use crate::graphics::{GraphicsContext, UniformValue};
use crate::resource::{Resource, ResourceCache, Texture, TextureHandle};
use crate::shader::{Shader, ShaderHandle};
use crate::{engine_error, engine_warn};

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Texture units available to material textures
pub const MAX_MATERIAL_TEXTURES: u32 = 3;

/// Name prefix of texture parameters (`uTexture0`, `uTexture1`, ...)
pub const TEXTURE_PARAM_PREFIX: &str = "uTexture";

// ===== PARAMETER VALUES =====

/// A typed parameter value for the material
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    Bool(bool),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    Texture(TextureHandle),
}

impl ParamValue {
    fn to_uniform(&self, texture_unit: Option<u32>) -> UniformValue {
        match self {
            ParamValue::Float(v) => UniformValue::Float(*v),
            ParamValue::Vec2(v) => UniformValue::Vec2(*v),
            ParamValue::Vec3(v) => UniformValue::Vec3(*v),
            ParamValue::Vec4(v) => UniformValue::Vec4(*v),
            ParamValue::Int(v) => UniformValue::Int(*v),
            ParamValue::Bool(v) => UniformValue::Bool(*v),
            ParamValue::Mat3(v) => UniformValue::Mat3(*v),
            ParamValue::Mat4(v) => UniformValue::Mat4(*v),
            ParamValue::FloatArray(v) => UniformValue::FloatArray(v.clone()),
            ParamValue::Texture(_) => UniformValue::Sampler(texture_unit.unwrap_or(0) as i32),
        }
    }
}

/// Texture unit for a `uTextureN` uniform name
fn texture_unit_of(name: &str) -> Option<u32> {
    let index = name.strip_prefix(TEXTURE_PARAM_PREFIX)?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    index.parse().ok()
}

// ===== MATERIAL PARAMETER =====

#[derive(Debug, Clone)]
struct MaterialParam {
    name: String,
    value: Option<ParamValue>,
    dirty: bool,
    texture_unit: Option<u32>,
}

// ===== MATERIAL =====

#[derive(Debug)]
pub struct Material {
    id: u64,
    name: String,
    shader: Option<ShaderHandle>,
    /// Parameters were checked against the attached shader's uniforms
    validated: bool,
    params: Vec<MaterialParam>,
    param_names: FxHashMap<String, usize>,
    transparent: bool,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            shader: None,
            validated: false,
            params: Vec::new(),
            param_names: FxHashMap::default(),
            transparent: false,
        }
    }

    /// Process-unique id, used by shaders to detect material switches
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    /// Whether any parameter is bound to a texture unit
    pub fn has_texture(&self) -> bool {
        self.params.iter().any(|p| p.texture_unit.is_some())
    }

    // ===== SHADER BINDING =====

    /// Bind to a shader permutation
    ///
    /// If the shader is not ready yet, validation of the parameter names is
    /// deferred to the first upload with the ready shader.
    pub fn attach_shader(&mut self, handle: ShaderHandle, shader: &Shader) {
        self.shader = Some(handle);
        self.validated = false;
        if shader.is_ready() {
            self.validate(shader);
        }
    }

    fn validate(&mut self, shader: &Shader) {
        let staged = std::mem::take(&mut self.params);
        self.param_names.clear();

        for mut param in staged {
            if shader.user_uniform(&param.name).is_none() {
                engine_warn!("vista3d::Material",
                    "Material '{}': parameter '{}' not in shader '{}', dropped",
                    self.name, param.name, shader.key());
                continue;
            }
            if texture_unit_of(&param.name).is_some_and(|u| u >= MAX_MATERIAL_TEXTURES) {
                engine_error!("vista3d::Material",
                    "Material '{}': at most {} textures supported, '{}' dropped",
                    self.name, MAX_MATERIAL_TEXTURES, param.name);
                continue;
            }
            param.dirty = true;
            self.insert(param);
        }

        let mut new_uniforms: Vec<_> = shader
            .user_uniforms()
            .filter(|u| !self.param_names.contains_key(&u.name))
            .collect();
        new_uniforms.sort_by_key(|u| u.location);
        for uniform in new_uniforms {
            let texture_unit = texture_unit_of(&uniform.name);
            match texture_unit {
                Some(unit) if unit >= MAX_MATERIAL_TEXTURES => {
                    engine_error!("vista3d::Material",
                        "Material '{}': at most {} textures supported, '{}' ignored (shader '{}')",
                        self.name, MAX_MATERIAL_TEXTURES, uniform.name, shader.key());
                    continue;
                }
                None if uniform.ty.is_sampler() => {
                    engine_error!("vista3d::Material",
                        "Material '{}': sampler '{}' is not a uTextureN slot, ignored",
                        self.name, uniform.name);
                    continue;
                }
                _ => {}
            }
            self.insert(MaterialParam {
                name: uniform.name.clone(),
                value: None,
                dirty: true,
                texture_unit,
            });
        }

        self.validated = true;
    }

    fn insert(&mut self, param: MaterialParam) {
        self.param_names.insert(param.name.clone(), self.params.len());
        self.params.push(param);
    }

    // ===== PARAMETERS =====

    /// Stage a value
    ///
    /// Unknown names are dropped with a warning once the material is bound
    /// to a ready shader; before that they are kept until validation.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) {
        if let Some(&index) = self.param_names.get(name) {
            let param = &mut self.params[index];
            param.value = Some(value);
            param.dirty = true;
            return;
        }
        if self.validated {
            engine_warn!("vista3d::Material",
                "Material '{}': unknown parameter '{}' dropped", self.name, name);
            return;
        }
        self.insert(MaterialParam {
            name: name.to_string(),
            value: Some(value),
            dirty: true,
            texture_unit: texture_unit_of(name).filter(|u| *u < MAX_MATERIAL_TEXTURES),
        });
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        let index = self.param_names.get(name)?;
        self.params.get(*index).and_then(|p| p.value.as_ref())
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.param_names.contains_key(name)
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.param_names
            .get(name)
            .and_then(|i| self.params.get(*i))
            .is_some_and(|p| p.dirty)
    }

    pub fn texture_unit(&self, name: &str) -> Option<u32> {
        let index = self.param_names.get(name)?;
        self.params.get(*index).and_then(|p| p.texture_unit)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Copy the values of parameters both materials declare
    pub fn absorb(&mut self, other: &Material) {
        for param in &mut self.params {
            if let Some(value) = other.parameter(&param.name) {
                param.value = Some(value.clone());
                param.dirty = true;
            }
        }
        self.transparent = other.transparent;
    }

    // ===== UPLOAD =====

    /// Upload parameters to `shader` (which must be current) and bind textures
    ///
    /// Returns the number of uniform uploads. Textures are bound on every
    /// call since texture units are shared by all programs; a texture that
    /// is not ready keeps its parameter dirty.
    pub fn upload(
        &mut self,
        ctx: &mut GraphicsContext,
        shader: &mut Shader,
        textures: &ResourceCache<Texture>,
    ) -> usize {
        if !shader.is_ready() {
            return 0;
        }
        if !self.validated {
            self.validate(shader);
        }

        let full = shader.last_material() != Some(self.id);
        let mut uploads = 0;
        for param in &mut self.params {
            let Some(value) = &param.value else { continue };

            if let (ParamValue::Texture(handle), Some(unit)) = (value, param.texture_unit) {
                let bound = textures.get(*handle).is_some_and(|t| t.bind(ctx, unit));
                if !bound {
                    param.dirty = true;
                    continue;
                }
            }
            if !full && !param.dirty {
                continue;
            }
            if shader.upload(ctx, &param.name, &value.to_uniform(param.texture_unit)) {
                uploads += 1;
            }
            param.dirty = false;
        }
        shader.set_last_material(Some(self.id));
        uploads
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;

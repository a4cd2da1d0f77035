/// One compiled shader permutation.
///
/// A shader starts *pending*. It is compiled in place, under the same
/// handle, once its template is available; compilation either makes it
/// *ready* or *failed*. A failed shader is never recompiled implicitly.
///
/// After linking, active uniforms are split into reserved uniforms (`m_`
/// prefix, driven by the engine: camera and model matrices) and user
/// uniforms (driven by materials).

use std::convert::Infallible;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::camera::{Camera, CameraStamp};
use crate::error::Result;
use crate::graphics::{
    GraphicsContext, ProgramId, ReflectedAttribute, ReflectedUniform, UniformValue,
};
use crate::resource::mesh::BUILTIN_ATTRIBUTES;
use crate::resource::resource_cache::{Resource, ResourceHandle};
use crate::shader::preprocessor::preprocess;
use crate::shader::shader_cache::ShaderKey;
use crate::{engine_debug, engine_warn};

/// Handle to a shader in the permutation cache
pub type ShaderHandle = ResourceHandle<Shader>;

/// Prefix of engine-driven uniforms
pub const RESERVED_PREFIX: &str = "m_";

// Reserved uniform names
pub const U_VP_MATRIX: &str = "m_uVpMatrix";
pub const U_VIEW_MATRIX: &str = "m_uViewMatrix";
pub const U_CAMERA_POSITION: &str = "m_uCameraPosition";
pub const U_MODEL_MATRIX: &str = "m_uModelMatrix";

/// Flag added to every permutation compiled on an API version 2 context
pub const WEBGL2_FLAG: &str = "WEBGL2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderState {
    /// Waiting for its template
    Pending,
    Ready,
    /// Template or compilation error; stays failed until destroyed
    Failed,
}

#[derive(Debug)]
pub struct Shader {
    key: ShaderKey,
    state: ShaderState,
    program: Option<ProgramId>,
    reserved: FxHashMap<String, ReflectedUniform>,
    user: FxHashMap<String, ReflectedUniform>,
    attributes: Vec<ReflectedAttribute>,
    last_material: Option<u64>,
    camera_stamp: Option<CameraStamp>,
}

impl Shader {
    pub fn pending(key: ShaderKey) -> Self {
        Self {
            key,
            state: ShaderState::Pending,
            program: None,
            reserved: FxHashMap::default(),
            user: FxHashMap::default(),
            attributes: Vec::new(),
            last_material: None,
            camera_stamp: None,
        }
    }

    /// Preprocess both templates with this permutation's flags and link them
    ///
    /// Only acts on a pending shader. Errors are logged and leave the shader
    /// failed; they never propagate to the frame loop.
    pub fn compile(&mut self, ctx: &mut GraphicsContext, vertex: &str, fragment: &str) {
        if self.state != ShaderState::Pending {
            return;
        }
        match self.try_compile(ctx, vertex, fragment) {
            Ok(()) => {
                self.state = ShaderState::Ready;
                engine_debug!("vista3d::Shader", "Shader '{}' compiled", self.key);
            }
            Err(err) => self.fail(&err.to_string()),
        }
    }

    fn try_compile(&mut self, ctx: &mut GraphicsContext, vertex: &str, fragment: &str) -> Result<()> {
        let mut flags: FxHashSet<String> = self.key.flags().iter().cloned().collect();
        if ctx.is_webgl2() {
            flags.insert(WEBGL2_FLAG.to_string());
        }
        let vertex = preprocess(vertex, &flags)?;
        let fragment = preprocess(fragment, &flags)?;
        let (program, reflection) = ctx.create_program(&vertex, &fragment, BUILTIN_ATTRIBUTES)?;

        for uniform in reflection.uniforms {
            if uniform.name.starts_with(RESERVED_PREFIX) {
                self.reserved.insert(uniform.name.clone(), uniform);
            } else {
                self.user.insert(uniform.name.clone(), uniform);
            }
        }
        self.attributes = reflection.attributes;
        self.program = Some(program);
        Ok(())
    }

    /// Mark the shader failed (warning logged)
    pub fn fail(&mut self, reason: &str) {
        engine_warn!("vista3d::Shader", "Shader '{}' failed: {}", self.key, reason);
        self.state = ShaderState::Failed;
    }

    // ===== ACCESSORS =====

    pub fn key(&self) -> &ShaderKey {
        &self.key
    }

    pub fn state(&self) -> ShaderState {
        self.state
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// User uniform (material parameter) by name
    pub fn user_uniform(&self, name: &str) -> Option<&ReflectedUniform> {
        self.user.get(name)
    }

    pub fn user_uniforms(&self) -> impl Iterator<Item = &ReflectedUniform> {
        self.user.values()
    }

    pub fn reserved_uniform(&self, name: &str) -> Option<&ReflectedUniform> {
        self.reserved.get(name)
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.user.contains_key(name) || self.reserved.contains_key(name)
    }

    pub fn attributes(&self) -> &[ReflectedAttribute] {
        &self.attributes
    }

    // ===== DRAW-TIME =====

    /// Make this program current; false when not ready
    pub fn bind(&self, ctx: &mut GraphicsContext) -> bool {
        match (self.state, self.program) {
            (ShaderState::Ready, Some(program)) => {
                ctx.use_program(Some(program));
                true
            }
            _ => false,
        }
    }

    /// Upload a value to a reserved or user uniform
    ///
    /// Returns false without uploading when the shader is not ready, the
    /// uniform is not active, or the value does not match its type.
    pub fn upload(&self, ctx: &mut GraphicsContext, name: &str, value: &UniformValue) -> bool {
        let Some(program) = self.program else {
            return false;
        };
        let Some(uniform) = self.reserved.get(name).or_else(|| self.user.get(name)) else {
            return false;
        };
        if !uniform.ty.accepts(value, uniform.size) {
            engine_warn!("vista3d::Shader",
                "Shader '{}': value {:?} does not fit uniform '{}' ({:?})",
                self.key, value, name, uniform.ty);
            return false;
        }
        ctx.upload_uniform(program, uniform.location, value);
        true
    }

    /// Upload camera uniforms unless this camera state is already uploaded
    pub fn bind_camera(&mut self, ctx: &mut GraphicsContext, camera: &Camera) -> bool {
        if self.camera_stamp == Some(camera.stamp()) || self.program.is_none() {
            return false;
        }
        self.upload(ctx, U_VP_MATRIX, &UniformValue::Mat4(camera.view_projection_matrix()));
        self.upload(ctx, U_VIEW_MATRIX, &UniformValue::Mat4(*camera.view_matrix()));
        self.upload(ctx, U_CAMERA_POSITION, &UniformValue::Vec4(camera.eye().extend(1.0)));
        self.camera_stamp = Some(camera.stamp());
        true
    }

    /// Id of the material whose parameters were last uploaded
    pub fn last_material(&self) -> Option<u64> {
        self.last_material
    }

    pub fn set_last_material(&mut self, material: Option<u64>) {
        self.last_material = material;
    }
}

impl Resource for Shader {
    /// Shaders complete in place from their template, not from a payload
    type Payload = Infallible;

    fn is_ready(&self) -> bool {
        self.state == ShaderState::Ready && self.program.is_some()
    }

    fn complete(&mut self, _ctx: &mut GraphicsContext, payload: Infallible) -> Result<()> {
        match payload {}
    }

    fn release(&mut self, ctx: &mut GraphicsContext) {
        if let Some(program) = self.program.take() {
            ctx.delete_program(program);
        }
        self.reserved.clear();
        self.user.clear();
        self.last_material = None;
        self.camera_stamp = None;
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;

/// Shader permutation cache.
///
/// Shaders are cached per `ShaderKey`: a base template name plus a
/// normalized flag set (upper-cased, deduplicated, sorted), so `{a, B}`
/// and `{b, A}` share one compiled program. A miss creates a pending
/// shader and compiles it from the library template with exactly the
/// requested flags.

use std::fmt;
use crate::graphics::GraphicsContext;
use crate::resource::resource_cache::ResourceCache;
use crate::shader::shader::{Shader, ShaderHandle, ShaderState};
use crate::shader::shader_library::{ShaderLibrary, SourceState};

// ===== KEY =====

/// Normalized permutation key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    base: String,
    flags: Vec<String>,
}

impl ShaderKey {
    pub fn new<S: AsRef<str>>(base: &str, flags: &[S]) -> Self {
        let mut flags: Vec<String> = flags
            .iter()
            .map(|f| f.as_ref().trim().to_ascii_uppercase())
            .filter(|f| !f.is_empty())
            .collect();
        flags.sort();
        flags.dedup();
        Self { base: base.to_string(), flags }
    }

    /// Template name
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Normalized flags
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.binary_search_by(|f| f.as_str().cmp(flag)).is_ok()
    }

    /// Cache entry name: `base` or `base[FLAG1,FLAG2]`
    pub fn cache_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flags.is_empty() {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}[{}]", self.base, self.flags.join(","))
        }
    }
}

// ===== CACHE =====

pub struct ShaderPermutationCache {
    shaders: ResourceCache<Shader>,
}

impl ShaderPermutationCache {
    pub fn new() -> Self {
        Self { shaders: ResourceCache::new("Shader") }
    }

    /// Shader for template `base` compiled with `flags`
    ///
    /// A pending shader is compiled in place as soon as its template is
    /// loaded; until then it stays pending and the same handle is returned.
    pub fn get<S: AsRef<str>>(
        &mut self,
        ctx: &mut GraphicsContext,
        library: &ShaderLibrary,
        base: &str,
        flags: &[S],
    ) -> ShaderHandle {
        let key = ShaderKey::new(base, flags);
        let handle = self.shaders.get_or_create(&key.cache_name(), || Shader::pending(key.clone()));

        if let Some(shader) = self.shaders.get_mut(handle) {
            resolve_pending(ctx, library, shader);
        }
        handle
    }

    /// Compile every pending shader whose template has arrived since it was
    /// requested; returns the number of shaders that became ready
    ///
    /// Handles stay valid: the shaders are compiled in place.
    pub fn compile_pending(&mut self, ctx: &mut GraphicsContext, library: &ShaderLibrary) -> usize {
        let mut compiled = 0;
        for (_, _, shader) in self.shaders.iter_mut() {
            if resolve_pending(ctx, library, shader) {
                compiled += 1;
            }
        }
        compiled
    }

    /// Shader compiled from inline templates, cached under `name` and `flags`
    ///
    /// Templates are preprocessed but get no generated header.
    pub fn get_with_source<S: AsRef<str>>(
        &mut self,
        ctx: &mut GraphicsContext,
        name: &str,
        vertex: &str,
        fragment: &str,
        flags: &[S],
    ) -> ShaderHandle {
        let key = ShaderKey::new(name, flags);
        let handle = self.shaders.get_or_create(&key.cache_name(), || Shader::pending(key.clone()));
        if let Some(shader) = self.shaders.get_mut(handle) {
            shader.compile(ctx, vertex, fragment);
        }
        handle
    }

    pub fn find<S: AsRef<str>>(&self, base: &str, flags: &[S]) -> Option<ShaderHandle> {
        self.shaders.find(&ShaderKey::new(base, flags).cache_name())
    }

    pub fn shader(&self, handle: ShaderHandle) -> Option<&Shader> {
        self.shaders.get(handle)
    }

    pub fn shader_mut(&mut self, handle: ShaderHandle) -> Option<&mut Shader> {
        self.shaders.get_mut(handle)
    }

    pub fn is_ready(&self, handle: ShaderHandle) -> bool {
        self.shaders.is_ready(handle)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Number of compiled, usable shaders
    pub fn ready_count(&self) -> usize {
        self.shaders.iter().filter(|(_, _, s)| s.state() == ShaderState::Ready).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShaderHandle, &Shader)> {
        self.shaders.iter().map(|(handle, _, shader)| (handle, shader))
    }

    /// Release a permutation; a later `get` compiles it anew
    pub fn destroy(&mut self, ctx: &mut GraphicsContext, handle: ShaderHandle) -> bool {
        self.shaders.destroy(ctx, handle)
    }

    pub fn destroy_all(&mut self, ctx: &mut GraphicsContext) {
        self.shaders.destroy_all(ctx);
    }
}

/// Move a pending shader forward if its template is no longer loading;
/// returns true when it compiled
fn resolve_pending(ctx: &mut GraphicsContext, library: &ShaderLibrary, shader: &mut Shader) -> bool {
    if shader.state() != ShaderState::Pending {
        return false;
    }
    match library.state(shader.key().base()) {
        Some(SourceState::Ready(source)) => {
            shader.compile(ctx, source.vertex(), source.fragment());
            shader.state() == ShaderState::Ready
        }
        Some(SourceState::Loading) => false,
        Some(SourceState::Failed(reason)) => {
            shader.fail(reason);
            false
        }
        None => {
            let reason = format!("unknown shader source '{}'", shader.key().base());
            shader.fail(&reason);
            false
        }
    }
}

impl Default for ShaderPermutationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "shader_cache_tests.rs"]
mod tests;

/// Registry of shader templates and include chunks.
///
/// Sources are registered synchronously (`add_source`) or announced with
/// `begin_load` and delivered later with `finish_load`. While a source is
/// loading, shaders built from it stay pending.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::shader::shader_source::{ShaderSource, ShaderSourceOptions};
use crate::{engine_debug, engine_warn};

/// Availability of a registered template
#[derive(Debug, Clone)]
pub enum SourceState {
    Loading,
    Ready(ShaderSource),
    Failed(String),
}

pub struct ShaderLibrary {
    chunks: FxHashMap<String, String>,
    sources: FxHashMap<String, SourceState>,
}

impl ShaderLibrary {
    /// Empty library
    pub fn new() -> Self {
        Self { chunks: FxHashMap::default(), sources: FxHashMap::default() }
    }

    /// Library holding the templates used by the engine's drawables
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        for (name, text) in builtin::CHUNKS {
            library.add_chunk(name, text);
        }
        for (name, vertex, fragment, options) in builtin::sources() {
            // Builtin templates only include builtin chunks
            if let Err(err) = library.add_source(name, vertex, fragment, options) {
                engine_warn!("vista3d::ShaderLibrary", "Builtin shader '{}' unusable: {}", name, err);
            }
        }
        library
    }

    pub fn add_chunk(&mut self, name: &str, text: &str) {
        self.chunks.insert(name.to_string(), text.to_string());
    }

    pub fn chunk(&self, name: &str) -> Option<&str> {
        self.chunks.get(name).map(String::as_str)
    }

    /// Register (or replace) a template
    ///
    /// On failure the source is recorded as failed, so shaders waiting for
    /// it fail instead of staying pending.
    pub fn add_source(
        &mut self,
        name: &str,
        vertex: &str,
        fragment: &str,
        options: ShaderSourceOptions,
    ) -> Result<()> {
        match ShaderSource::new(name, vertex, fragment, options, &self.chunks) {
            Ok(source) => {
                self.sources.insert(name.to_string(), SourceState::Ready(source));
                engine_debug!("vista3d::ShaderLibrary", "Shader source '{}' registered", name);
                Ok(())
            }
            Err(err) => {
                self.sources.insert(name.to_string(), SourceState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    /// Announce a template that is being fetched
    pub fn begin_load(&mut self, name: &str) {
        self.sources.entry(name.to_string()).or_insert(SourceState::Loading);
    }

    /// Deliver a template announced with `begin_load`
    pub fn finish_load(
        &mut self,
        name: &str,
        vertex: &str,
        fragment: &str,
        options: ShaderSourceOptions,
    ) -> Result<()> {
        self.add_source(name, vertex, fragment, options)
    }

    /// Mark an announced template as failed to load
    pub fn fail_load(&mut self, name: &str, reason: &str) {
        engine_warn!("vista3d::ShaderLibrary", "Shader source '{}' failed to load: {}", name, reason);
        self.sources.insert(name.to_string(), SourceState::Failed(reason.to_string()));
    }

    pub fn state(&self, name: &str) -> Option<&SourceState> {
        self.sources.get(name)
    }

    /// The template, when loaded
    pub fn source(&self, name: &str) -> Option<&ShaderSource> {
        match self.sources.get(name) {
            Some(SourceState::Ready(source)) => Some(source),
            _ => None,
        }
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BUILTIN TEMPLATES
// ============================================================================

pub mod builtin {
    use super::ShaderSourceOptions;

    pub const COLOR: &str = "color";
    pub const TEXTURE: &str = "texture";
    pub const SPRITE: &str = "sprite";
    pub const LABEL: &str = "label";
    pub const BLIT: &str = "blit";

    pub(super) const CHUNKS: &[(&str, &str)] = &[
        ("point_shape.inc", "\
#if DISC
    vec2 m_d = gl_PointCoord - vec2(0.5);
    if (dot(m_d, m_d) > 0.25) {
        discard;
    }
#endif
"),
        ("alpha_test.inc", "\
#if ALPHA_TEST
    if (m_fragColor.a < 0.01) {
        discard;
    }
#endif
"),
    ];

    const COLOR_VS: &str = "\
attribute vec3 m_aPosition;
void main() {
    vec4 worldPosition = m_uModelMatrix * vec4(m_aPosition, 1.0);
    gl_Position = m_uVpMatrix * worldPosition;
}
";

    const COLOR_FS: &str = "\
uniform vec4 uColor;
void main() {
    m_fragColor = uColor;
}
";

    const TEXTURE_VS: &str = "\
attribute vec3 m_aPosition;
attribute vec2 m_aTexCoord;
varying vec2 m_vTexCoord;
void main() {
    vec4 worldPosition = m_uModelMatrix * vec4(m_aPosition, 1.0);
    gl_Position = m_uVpMatrix * worldPosition;
#include <varying.inc>
}
";

    const TEXTURE_FS: &str = "\
uniform sampler2D uTexture0;
uniform float uOpacity;
varying vec2 m_vTexCoord;
void main() {
    vec4 color = texture2D(uTexture0, m_vTexCoord);
    m_fragColor = vec4(color.rgb, color.a * uOpacity);
#include <alpha_test.inc>
}
";

    const SPRITE_VS: &str = "\
attribute vec3 m_aPosition;
uniform float uPointSize;
void main() {
    vec4 worldPosition = m_uModelMatrix * vec4(m_aPosition, 1.0);
    gl_Position = m_uVpMatrix * worldPosition;
    gl_PointSize = uPointSize;
}
";

    const SPRITE_FS: &str = "\
uniform vec4 uColor;
#if TEXTURE
uniform sampler2D uTexture0;
#endif
void main() {
#include <point_shape.inc>
#if TEXTURE
    m_fragColor = texture2D(uTexture0, gl_PointCoord) * uColor;
#else
    m_fragColor = uColor;
#endif
}
";

    const LABEL_FS: &str = "\
uniform sampler2D uTexture0;
uniform vec4 uColor;
varying vec2 m_vTexCoord;
void main() {
    float coverage = texture2D(uTexture0, m_vTexCoord).a;
    if (coverage < 0.01) {
        discard;
    }
    m_fragColor = vec4(uColor.rgb, uColor.a * coverage);
}
";

    const BLIT_VS: &str = "\
attribute vec3 m_aPosition;
uniform vec2 uScale;
varying vec2 m_vTexCoord;
void main() {
    m_vTexCoord = (m_aPosition.xy * uScale) * 0.5 + 0.5;
    gl_Position = vec4(m_aPosition.xy, 0.0, 1.0);
}
";

    const BLIT_FS: &str = "\
uniform sampler2D uTexture0;
varying vec2 m_vTexCoord;
void main() {
    m_fragColor = texture2D(uTexture0, m_vTexCoord);
}
";

    pub(super) fn sources() -> [(&'static str, &'static str, &'static str, ShaderSourceOptions); 5] {
        let transformed = ShaderSourceOptions::transformed();
        [
            (COLOR, COLOR_VS, COLOR_FS, transformed),
            (TEXTURE, TEXTURE_VS, TEXTURE_FS, transformed.with_uv()),
            (SPRITE, SPRITE_VS, SPRITE_FS, transformed),
            (LABEL, TEXTURE_VS, LABEL_FS, transformed.with_uv()),
            (BLIT, BLIT_VS, BLIT_FS, ShaderSourceOptions::default()),
        ]
    }
}

#[cfg(test)]
#[path = "shader_library_tests.rs"]
mod tests;

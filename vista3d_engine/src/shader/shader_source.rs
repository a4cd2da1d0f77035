/// Shader templates.
///
/// A `ShaderSource` holds the vertex and fragment templates of one shader
/// family after `#include` resolution and header generation. The result
/// still contains `#if` blocks; they are resolved per permutation when a
/// `Shader` is compiled with a flag set.

use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

/// Declarations generated in front of a template
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderSourceOptions {
    /// `highp` instead of `mediump` float precision
    pub high_precision: bool,
    /// Declare `m_uVpMatrix` and `m_uCameraPosition`
    pub vp_matrix: bool,
    /// Declare `m_uViewMatrix` and `m_uCameraPosition`
    pub view_matrix: bool,
    /// Declare `m_uModelMatrix`
    pub model_matrix: bool,
    // Varyings written by `#include <varying.inc>`
    pub position: bool,
    pub normal: bool,
    pub uv: bool,
    pub color: bool,
}

impl ShaderSourceOptions {
    /// Camera and model matrices, the common case for scene geometry
    pub fn transformed() -> Self {
        Self { vp_matrix: true, model_matrix: true, ..Default::default() }
    }

    pub fn with_uv(mut self) -> Self {
        self.uv = true;
        self
    }

    pub fn with_color(mut self) -> Self {
        self.color = true;
        self
    }

    pub fn with_high_precision(mut self) -> Self {
        self.high_precision = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Vertex,
    Fragment,
}

/// Vertex and fragment templates of one shader family
#[derive(Debug, Clone)]
pub struct ShaderSource {
    name: String,
    vertex: String,
    fragment: String,
    options: ShaderSourceOptions,
}

impl ShaderSource {
    /// Resolve includes and prepend the generated header
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` when an `#include` names an unknown
    /// chunk or is malformed.
    pub fn new(
        name: &str,
        vertex: &str,
        fragment: &str,
        options: ShaderSourceOptions,
        chunks: &FxHashMap<String, String>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            vertex: dissolve(name, vertex, Stage::Vertex, &options, chunks)?,
            fragment: dissolve(name, fragment, Stage::Fragment, &options, chunks)?,
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex template (still containing `#if` blocks)
    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    /// Fragment template (still containing `#if` blocks)
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn options(&self) -> &ShaderSourceOptions {
        &self.options
    }
}

fn header(stage: Stage, options: &ShaderSourceOptions) -> String {
    let mut header = String::from("#if WEBGL2\n#version 300 es\n");
    match stage {
        Stage::Vertex => header.push_str("#define attribute in\n#define varying out\n"),
        Stage::Fragment => header.push_str(
            "#define varying in\n#define texture2D texture\nout vec4 m_fragColor;\n#else\n#define m_fragColor gl_FragColor\n",
        ),
    }
    header.push_str("#endif\n");

    let precision = if options.high_precision { "highp" } else { "mediump" };
    header.push_str(&format!("precision {} float;\nprecision {} sampler2D;\n", precision, precision));

    if options.vp_matrix {
        header.push_str("uniform mat4 m_uVpMatrix;\n");
    }
    if options.view_matrix {
        header.push_str("uniform mat4 m_uViewMatrix;\n");
    }
    if options.vp_matrix || options.view_matrix {
        header.push_str("uniform vec4 m_uCameraPosition;\n");
    }
    if stage == Stage::Vertex && options.model_matrix {
        header.push_str("uniform mat4 m_uModelMatrix;\n");
    }
    header
}

/// Assignments expanded from `<varying.inc>` (vertex stage only)
fn varying_assignments(stage: Stage, options: &ShaderSourceOptions) -> String {
    let mut body = String::new();
    if stage != Stage::Vertex {
        return body;
    }
    if options.normal {
        body.push_str("    m_vNormal = normal.xyz;\n");
    }
    if options.position {
        body.push_str("    m_vVertex = worldPosition.xyz;\n");
    }
    if options.uv {
        body.push_str("    m_vTexCoord = m_aTexCoord;\n");
    }
    if options.color {
        body.push_str("    m_vColor = m_aColor;\n");
    }
    body
}

fn include_target(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("#include")?;
    let rest = rest.trim();
    rest.strip_prefix('<')?.strip_suffix('>')
}

fn dissolve(
    name: &str,
    template: &str,
    stage: Stage,
    options: &ShaderSourceOptions,
    chunks: &FxHashMap<String, String>,
) -> Result<String> {
    let mut out = header(stage, options);
    for line in template.lines() {
        if !line.trim_start().starts_with("#include") {
            out.push_str(line);
            out.push('\n');
            continue;
        }
        let target = include_target(line).ok_or_else(|| {
            Error::InvalidResource(format!("shader '{}': malformed include '{}'", name, line.trim()))
        })?;
        if target == "varying.inc" {
            out.push_str(&varying_assignments(stage, options));
            continue;
        }
        let chunk = chunks.get(target).ok_or_else(|| {
            Error::InvalidResource(format!("shader '{}': cannot resolve #include <{}>", name, target))
        })?;
        out.push_str(chunk);
        if !chunk.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "shader_source_tests.rs"]
mod tests;

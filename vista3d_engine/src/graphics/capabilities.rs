/// API version detection and table-driven capability negotiation.
///
/// Each row of `CAPABILITY_TABLE` says which capability it grants, for which
/// API version, whether the context options must ask for it, which already
/// granted capabilities exclude it, and where it comes from: core API or a
/// list of extension groups. Every group must resolve, candidates within a
/// group are tried in order. Rows are evaluated top to bottom.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use crate::graphics::context_options::ContextOptions;
use crate::graphics::graphics_api::GraphicsApi;
use crate::engine_warn;

// ===== API VERSION =====

/// Major graphics API generation (WebGL 1 / GLES 2 vs WebGL 2 / GLES 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    /// Detect the active version from a driver version string
    ///
    /// Returns `None` for an empty or unparseable string.
    pub fn detect(version: &str) -> Option<ApiVersion> {
        let version = version.trim();
        if version.contains("WebGL 2") || version.contains("OpenGL ES 3") {
            return Some(ApiVersion::V2);
        }
        if version.contains("WebGL 1") || version.contains("OpenGL ES 2") {
            return Some(ApiVersion::V1);
        }
        let major: u32 = version
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())?
            .parse()
            .ok()?;
        Some(if major >= 3 { ApiVersion::V2 } else { ApiVersion::V1 })
    }

    pub fn number(self) -> u32 {
        match self {
            ApiVersion::V1 => 1,
            ApiVersion::V2 => 2,
        }
    }
}

// ===== CAPABILITY FLAGS =====

bitflags! {
    /// Optional features negotiated at context creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        const INSTANCING = 1 << 0;
        const VERTEX_ARRAY_OBJECT = 1 << 1;
        const FLOAT_TEXTURE = 1 << 2;
        const FLOAT_TEXTURE_LINEAR = 1 << 3;
        const DEPTH_TEXTURE = 1 << 4;
        const UINT_INDEX = 1 << 5;
    }
}

// ===== RESOLUTION TABLE =====

/// Context option a rule depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedBy {
    Instancing,
    VertexArrayObject,
}

impl RequestedBy {
    fn is_requested(self, options: &ContextOptions) -> bool {
        match self {
            RequestedBy::Instancing => options.instancing,
            RequestedBy::VertexArrayObject => options.vao,
        }
    }
}

/// Where a capability comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySource {
    /// Part of the core API, no query needed
    Core,
    /// Extension groups: all groups must resolve, any candidate within a group
    Extensions(&'static [&'static [&'static str]]),
}

/// One row of the resolution table
#[derive(Debug, Clone, Copy)]
pub struct CapabilityRule {
    pub capability: Capabilities,
    pub version: ApiVersion,
    pub requested_by: Option<RequestedBy>,
    pub excluded_by: Capabilities,
    pub source: CapabilitySource,
}

pub const CAPABILITY_TABLE: &[CapabilityRule] = &[
    // ----- API version 2 -----
    CapabilityRule {
        capability: Capabilities::INSTANCING,
        version: ApiVersion::V2,
        requested_by: Some(RequestedBy::Instancing),
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Core,
    },
    CapabilityRule {
        capability: Capabilities::VERTEX_ARRAY_OBJECT,
        version: ApiVersion::V2,
        requested_by: Some(RequestedBy::VertexArrayObject),
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Core,
    },
    CapabilityRule {
        capability: Capabilities::FLOAT_TEXTURE,
        version: ApiVersion::V2,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&["EXT_color_buffer_float"]]),
    },
    CapabilityRule {
        capability: Capabilities::FLOAT_TEXTURE_LINEAR,
        version: ApiVersion::V2,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&["OES_texture_float_linear"]]),
    },
    CapabilityRule {
        capability: Capabilities::DEPTH_TEXTURE,
        version: ApiVersion::V2,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Core,
    },
    CapabilityRule {
        capability: Capabilities::UINT_INDEX,
        version: ApiVersion::V2,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Core,
    },
    // ----- API version 1 -----
    CapabilityRule {
        capability: Capabilities::INSTANCING,
        version: ApiVersion::V1,
        requested_by: Some(RequestedBy::Instancing),
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&["ANGLE_instanced_arrays"]]),
    },
    // Instanced attribute divisors and the VAO extension do not mix on v1.
    CapabilityRule {
        capability: Capabilities::VERTEX_ARRAY_OBJECT,
        version: ApiVersion::V1,
        requested_by: Some(RequestedBy::VertexArrayObject),
        excluded_by: Capabilities::INSTANCING,
        source: CapabilitySource::Extensions(&[&["OES_vertex_array_object"]]),
    },
    CapabilityRule {
        capability: Capabilities::FLOAT_TEXTURE,
        version: ApiVersion::V1,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[
            &["OES_texture_float", "WEBGL_color_buffer_float"],
            &["OES_texture_float_linear"],
        ]),
    },
    CapabilityRule {
        capability: Capabilities::FLOAT_TEXTURE_LINEAR,
        version: ApiVersion::V1,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&["OES_texture_float_linear"]]),
    },
    CapabilityRule {
        capability: Capabilities::DEPTH_TEXTURE,
        version: ApiVersion::V1,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&[
            "WEBGL_depth_texture",
            "WEBKIT_WEBGL_depth_texture",
            "MOZ_WEBGL_depth_texture",
        ]]),
    },
    CapabilityRule {
        capability: Capabilities::UINT_INDEX,
        version: ApiVersion::V1,
        requested_by: None,
        excluded_by: Capabilities::empty(),
        source: CapabilitySource::Extensions(&[&["OES_element_index_uint"]]),
    },
];

// ===== NEGOTIATION =====

/// Outcome of capability negotiation
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedCapabilities {
    pub flags: Capabilities,
    /// Extensions enabled on the raw API, in query order
    pub extensions: Vec<&'static str>,
}

/// Walk `table` for `version` and enable what the platform supports
///
/// A missing extension is not an error: the capability flag stays false and
/// the matching code paths are skipped at draw time.
pub fn negotiate(
    api: &mut dyn GraphicsApi,
    version: ApiVersion,
    options: &ContextOptions,
    table: &[CapabilityRule],
) -> NegotiatedCapabilities {
    let mut flags = Capabilities::empty();
    let mut extensions = Vec::new();
    let mut queried: FxHashMap<&'static str, bool> = FxHashMap::default();

    for rule in table.iter().filter(|rule| rule.version == version) {
        if let Some(request) = rule.requested_by {
            if !request.is_requested(options) {
                continue;
            }
        }
        if flags.intersects(rule.excluded_by) {
            if rule.requested_by.is_some() {
                engine_warn!("vista3d::GraphicsContext",
                    "{:?} disabled: incompatible with granted {:?}",
                    rule.capability, flags & rule.excluded_by);
            }
            continue;
        }

        let granted = match rule.source {
            CapabilitySource::Core => true,
            CapabilitySource::Extensions(groups) => groups.iter().all(|group| {
                group.iter().any(|&name| {
                    *queried.entry(name).or_insert_with(|| {
                        let supported = api.enable_extension(name);
                        if supported {
                            extensions.push(name);
                        }
                        supported
                    })
                })
            }),
        };

        if granted {
            flags |= rule.capability;
        }
    }

    NegotiatedCapabilities { flags, extensions }
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;

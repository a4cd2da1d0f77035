//! Unit tests for version detection and the capability table

use super::*;

#[test]
fn test_detect_webgl_versions() {
    assert_eq!(ApiVersion::detect("WebGL 2.0 (OpenGL ES 3.0 Chromium)"), Some(ApiVersion::V2));
    assert_eq!(ApiVersion::detect("WebGL 1.0"), Some(ApiVersion::V1));
}

#[test]
fn test_detect_gles_versions() {
    assert_eq!(ApiVersion::detect("OpenGL ES 3.2 Mesa 23.1"), Some(ApiVersion::V2));
    assert_eq!(ApiVersion::detect("OpenGL ES 2.0"), Some(ApiVersion::V1));
}

#[test]
fn test_detect_desktop_versions() {
    assert_eq!(ApiVersion::detect("4.6.0 NVIDIA 535.54"), Some(ApiVersion::V2));
    assert_eq!(ApiVersion::detect("2.1 Mesa"), Some(ApiVersion::V1));
}

#[test]
fn test_detect_unparseable() {
    assert_eq!(ApiVersion::detect(""), None);
    assert_eq!(ApiVersion::detect("unknown"), None);
}

#[test]
fn test_table_covers_every_capability_for_both_versions() {
    let all = [
        Capabilities::INSTANCING,
        Capabilities::VERTEX_ARRAY_OBJECT,
        Capabilities::FLOAT_TEXTURE,
        Capabilities::FLOAT_TEXTURE_LINEAR,
        Capabilities::DEPTH_TEXTURE,
        Capabilities::UINT_INDEX,
    ];
    for version in [ApiVersion::V1, ApiVersion::V2] {
        for capability in all {
            assert!(
                CAPABILITY_TABLE.iter().any(|r| r.version == version && r.capability == capability),
                "missing {:?} for {:?}", capability, version
            );
        }
    }
}

#[test]
fn test_instancing_rule_precedes_vao_rule_on_v1() {
    let position = |cap| {
        CAPABILITY_TABLE
            .iter()
            .position(|r| r.version == ApiVersion::V1 && r.capability == cap)
            .unwrap()
    };
    assert!(position(Capabilities::INSTANCING) < position(Capabilities::VERTEX_ARRAY_OBJECT));
}

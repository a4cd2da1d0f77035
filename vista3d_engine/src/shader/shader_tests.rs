//! Unit tests for Shader
//!
//! Compilation states, reflection split and uniform uploads against the mock API.

use super::*;
use glam::{Mat4, Vec3, Vec4};
use crate::camera::Viewport;
use crate::graphics::mock_graphics_api::{
    count_calls, create_mock_context, create_mock_context_with, MockGraphicsApi,
};
use crate::graphics::ContextOptions;

const VS: &str = "\
uniform mat4 m_uVpMatrix;
uniform mat4 m_uModelMatrix;
uniform vec4 m_uCameraPosition;
attribute vec3 m_aPosition;
void main() {}
";

const FS: &str = "\
uniform vec4 uColor;
#if TEXTURE
uniform sampler2D uTexture0;
#endif
void main() {}
";

fn test_camera() -> Camera {
    Camera::looking_at(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO, Vec3::Z, Mat4::IDENTITY, Viewport::new(64, 64))
}

#[test]
fn test_pending_until_compiled() {
    let shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    assert_eq!(shader.state(), ShaderState::Pending);
    assert!(!shader.is_ready());
}

#[test]
fn test_compile_splits_reserved_and_user_uniforms() {
    let (mut ctx, _) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("color", &["TEXTURE"]));

    shader.compile(&mut ctx, VS, FS);

    assert!(shader.is_ready());
    assert!(shader.reserved_uniform(U_VP_MATRIX).is_some());
    assert!(shader.reserved_uniform(U_MODEL_MATRIX).is_some());
    assert!(shader.user_uniform("uColor").is_some());
    assert!(shader.user_uniform("uTexture0").is_some());
    assert!(shader.user_uniform(U_VP_MATRIX).is_none());
    assert_eq!(shader.user_uniforms().count(), 2);
    assert_eq!(shader.attributes()[0].name, "m_aPosition");
}

#[test]
fn test_flags_select_blocks() {
    let (mut ctx, _) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    shader.compile(&mut ctx, VS, FS);
    assert!(shader.user_uniform("uTexture0").is_none());
}

#[test]
fn test_webgl2_flag_added_on_v2_context() {
    let (mut ctx, _) = create_mock_context();
    let fs = "#if WEBGL2\nuniform float uV2;\n#endif\nvoid main() {}\n";
    let mut shader = Shader::pending(ShaderKey::new("sample", &[] as &[&str]));
    shader.compile(&mut ctx, VS, fs);
    assert!(shader.user_uniform("uV2").is_some());
    // The key itself does not carry the flag
    assert!(!shader.key().has_flag(WEBGL2_FLAG));
}

#[test]
fn test_webgl2_flag_absent_on_v1_context() {
    let (mut ctx, _) = create_mock_context_with(
        MockGraphicsApi::webgl1(&[]),
        ContextOptions::default().with_webgl2(false),
    );
    let fs = "#if WEBGL2\nuniform float uV2;\n#endif\nvoid main() {}\n";
    let mut shader = Shader::pending(ShaderKey::new("sample", &[] as &[&str]));
    shader.compile(&mut ctx, VS, fs);
    assert!(shader.is_ready());
    assert!(shader.user_uniform("uV2").is_none());
}

#[test]
fn test_compile_failure_marks_failed() {
    let (mut ctx, _) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("broken", &[] as &[&str]));

    shader.compile(&mut ctx, VS, "#error nope\n");

    assert_eq!(shader.state(), ShaderState::Failed);
    assert!(!shader.is_ready());
    assert!(!shader.bind(&mut ctx));
}

#[test]
fn test_preprocess_failure_marks_failed() {
    let (mut ctx, log) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("broken", &[] as &[&str]));

    shader.compile(&mut ctx, VS, "#if A\n");

    assert_eq!(shader.state(), ShaderState::Failed);
    assert_eq!(count_calls(&log, "create_program"), 0);
}

#[test]
fn test_failed_shader_not_recompiled() {
    let (mut ctx, log) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("broken", &[] as &[&str]));
    shader.compile(&mut ctx, VS, "#error nope\n");
    shader.compile(&mut ctx, VS, FS);

    assert_eq!(shader.state(), ShaderState::Failed);
    assert_eq!(count_calls(&log, "create_program"), 1);
}

#[test]
fn test_upload_checks_type_and_presence() {
    let (mut ctx, log) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    shader.compile(&mut ctx, VS, FS);

    assert!(shader.upload(&mut ctx, "uColor", &UniformValue::Vec4(Vec4::ONE)));
    assert!(!shader.upload(&mut ctx, "uColor", &UniformValue::Float(1.0)));
    assert!(!shader.upload(&mut ctx, "uMissing", &UniformValue::Float(1.0)));
    assert_eq!(count_calls(&log, "upload_uniform"), 1);
    assert_eq!(ctx.counters().uniform_syncs_per_frame, 1);
}

#[test]
fn test_bind_camera_elided_for_same_stamp() {
    let (mut ctx, log) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    shader.compile(&mut ctx, VS, FS);
    let mut camera = test_camera();

    assert!(shader.bind_camera(&mut ctx, &camera));
    let uploads = count_calls(&log, "upload_uniform");
    // VP matrix and camera position (no view matrix in VS)
    assert_eq!(uploads, 2);

    assert!(!shader.bind_camera(&mut ctx, &camera));
    assert_eq!(count_calls(&log, "upload_uniform"), uploads);

    camera.set_eye(Vec3::ONE);
    assert!(shader.bind_camera(&mut ctx, &camera));
    assert_eq!(count_calls(&log, "upload_uniform"), uploads * 2);
}

#[test]
fn test_release_deletes_program() {
    let (mut ctx, log) = create_mock_context();
    let mut shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    shader.compile(&mut ctx, VS, FS);

    shader.release(&mut ctx);

    assert!(!shader.is_ready());
    assert_eq!(count_calls(&log, "delete_program"), 1);
}

#[test]
fn test_last_material_tracking() {
    let mut shader = Shader::pending(ShaderKey::new("color", &[] as &[&str]));
    assert_eq!(shader.last_material(), None);
    shader.set_last_material(Some(3));
    assert_eq!(shader.last_material(), Some(3));
}

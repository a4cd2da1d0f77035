use super::*;
use glam::Mat4;
use crate::camera::Viewport;
use crate::graphics::mock_graphics_api::{count_calls, create_mock_context};
use crate::graphics::TextureDesc;

fn camera() -> Camera {
    Camera::looking_at(Vec3::new(0.0, -10.0, 0.0), Vec3::ZERO, Vec3::Z, Mat4::IDENTITY, Viewport::new(640, 480))
}

#[test]
fn test_default_look_is_square() {
    let (mut ctx, log) = create_mock_context();
    let mut resources = ResourceManager::new();

    let mut sprite = Sprite::new(&mut ctx, &mut resources, "marker", 8.0);

    assert_eq!(sprite.flags(), vec!["SQUARE"]);
    assert!(resources.has_shader(builtin::SPRITE, &["SQUARE"]));
    assert_eq!(sprite.draw(&mut ctx, &mut resources, &camera()), DrawOutcome::Drawn);
    assert_eq!(count_calls(&log, "draw_elements(Points, 1)"), 1);
}

#[test]
fn test_shape_switches_permutation_and_keeps_values() {
    let (mut ctx, _) = create_mock_context();
    let mut resources = ResourceManager::new();
    let mut sprite = Sprite::new(&mut ctx, &mut resources, "marker", 8.0);
    sprite.set_color([0.0, 1.0, 0.0, 1.0]);

    sprite.set_shape(&mut ctx, &mut resources, SpriteShape::Disc);

    assert_eq!(sprite.shape(), SpriteShape::Disc);
    assert!(resources.has_shader(builtin::SPRITE, &["DISC"]));
    assert_eq!(resources.shaders().len(), 2);
    let material = sprite.drawable().material();
    assert_eq!(material.parameter("uColor"), Some(&ParamValue::Vec4(Vec4::new(0.0, 1.0, 0.0, 1.0))));
    assert_eq!(material.parameter("uPointSize"), Some(&ParamValue::Float(8.0)));
}

#[test]
fn test_texture_toggles_flag() {
    let (mut ctx, _) = create_mock_context();
    let mut resources = ResourceManager::new();
    let texture = resources.create_texture(&mut ctx, "dot", TextureDesc::rgba8(4, 4), None);
    let mut sprite = Sprite::new(&mut ctx, &mut resources, "marker", 8.0);

    sprite.set_texture(&mut ctx, &mut resources, Some(texture));
    assert_eq!(sprite.flags(), vec!["SQUARE", "TEXTURE"]);
    assert!(sprite.drawable().material().has_parameter("uTexture0"));
    assert_eq!(sprite.draw(&mut ctx, &mut resources, &camera()), DrawOutcome::Drawn);

    sprite.set_texture(&mut ctx, &mut resources, None);
    assert_eq!(sprite.flags(), vec!["SQUARE"]);
    assert!(!sprite.drawable().material().has_parameter("uTexture0"));
}

#[test]
fn test_size_and_position() {
    let (mut ctx, _) = create_mock_context();
    let mut resources = ResourceManager::new();
    let mut sprite = Sprite::new(&mut ctx, &mut resources, "marker", 8.0);

    sprite.set_size(16.0);
    sprite.set_position(Vec3::new(1.0, 2.0, 3.0));

    assert_eq!(sprite.size(), 16.0);
    assert_eq!(sprite.drawable().material().parameter("uPointSize"), Some(&ParamValue::Float(16.0)));
    assert_eq!(sprite.drawable().transform().base_matrix().w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
}

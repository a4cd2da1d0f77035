use super::*;
use crate::graphics::mock_graphics_api::{count_calls, create_mock_context, create_mock_context_with, MockGraphicsApi};
use crate::graphics::{ContextOptions, TextureFormat};

#[test]
fn test_create_uploads_pixels() {
    let (mut ctx, log) = create_mock_context();
    let texture = Texture::create(&mut ctx, TextureDesc::rgba8(2, 2), Some(&[255u8; 16][..])).unwrap();

    assert!(texture.is_ready());
    assert_eq!((texture.width(), texture.height()), (2, 2));
    assert_eq!(count_calls(&log, "create_texture"), 1);
}

#[test]
fn test_create_rejects_bad_pixel_size() {
    let (mut ctx, _) = create_mock_context();
    assert!(Texture::create(&mut ctx, TextureDesc::rgba8(2, 2), Some(&[0u8; 3][..])).is_err());
}

#[test]
fn test_float_texture_needs_capability() {
    let (mut ctx, _) = create_mock_context_with(
        MockGraphicsApi::webgl1(&[]),
        ContextOptions::default().with_webgl2(false),
    );
    let mut desc = TextureDesc::rgba8(4, 4);
    desc.format = TextureFormat::Rgba32F;

    let texture = Texture::create_or_pending(&mut ctx, "hdr", desc, None);
    assert!(!texture.is_ready());
}

#[test]
fn test_bind_requires_ready() {
    let (mut ctx, log) = create_mock_context();
    let pending = Texture::pending(TextureDesc::rgba8(1, 1));
    assert!(!pending.bind(&mut ctx, 0));

    let ready = Texture::create(&mut ctx, TextureDesc::rgba8(1, 1), None).unwrap();
    assert!(ready.bind(&mut ctx, 2));
    assert_eq!(count_calls(&log, "bind_texture(2"), 1);
}

#[test]
fn test_complete_from_payload() {
    let (mut ctx, _) = create_mock_context();
    let mut texture = Texture::pending(TextureDesc::rgba8(1, 1));

    texture
        .complete(&mut ctx, TextureData { desc: TextureDesc::rgba8(8, 4), pixels: None })
        .unwrap();

    assert!(texture.is_ready());
    assert_eq!(texture.width(), 8);
    assert_eq!(texture.desc().byte_size(), 8 * 4 * 4);
}

#[test]
fn test_resize_same_size_is_noop() {
    let (mut ctx, log) = create_mock_context();
    let mut texture = Texture::create(&mut ctx, TextureDesc::rgba8(16, 16), None).unwrap();

    texture.resize(&mut ctx, 16, 16).unwrap();
    assert_eq!(count_calls(&log, "create_texture"), 1);

    texture.resize(&mut ctx, 32, 8).unwrap();
    assert_eq!(count_calls(&log, "create_texture"), 2);
    assert_eq!(count_calls(&log, "delete_texture"), 1);
    assert_eq!((texture.width(), texture.height()), (32, 8));
}

#[test]
fn test_discard_and_restore() {
    let (mut ctx, log) = create_mock_context();
    let mut texture = Texture::create(&mut ctx, TextureDesc::rgba8(4, 4), None).unwrap();

    texture.discard(&mut ctx);
    assert!(!texture.is_ready());
    assert_eq!(texture.width(), 4);

    texture.restore(&mut ctx).unwrap();
    assert!(texture.is_ready());
    assert_eq!(count_calls(&log, "create_texture"), 2);
}

#[test]
fn test_release_is_idempotent() {
    let (mut ctx, log) = create_mock_context();
    let mut texture = Texture::create(&mut ctx, TextureDesc::rgba8(1, 1), None).unwrap();
    texture.release(&mut ctx);
    texture.release(&mut ctx);
    assert_eq!(count_calls(&log, "delete_texture"), 1);
}

//! Integration tests for frame profiling
//!
//! Per-frame counter reset and the FPS clock, driven through the public
//! context API. No GPU required.
//!
//! Run with: cargo test --test profiling_integration_tests

mod common;

use common::{create_context, create_context_with, count, RecordingApi};
use vista3d_engine::vista3d::graphics::{ApiVersion, ContextOptions, PlatformFamily, RenderState};
use vista3d_engine::vista3d::resource::{MeshData, ResourceManager};

#[test]
fn test_integration_fps_at_ten_frames_per_second() {
    let (mut ctx, _) = create_context();

    for frame in 0..30 {
        ctx.reset_at(frame as f64 * 100.0);
    }

    assert!((ctx.counters().fps - 10.0).abs() < 1e-9);
    assert_eq!(ctx.frame_number(), 30);
}

#[test]
fn test_integration_reset_keeps_cumulative_counters() {
    let (mut ctx, _) = create_context();
    let mut resources = ResourceManager::new();
    let quad = resources.create_mesh(&mut ctx, "quad", &MeshData::quad());
    resources.update_memory_stats(ctx.counters_mut());

    for frame in 0..5 {
        ctx.reset_at(frame as f64 * 16.0);
        let mesh = resources.meshes().get(quad).unwrap();
        mesh.bind(&mut ctx);
        mesh.draw(&mut ctx);
        ctx.set_enabled(RenderState::Blend, true);
        assert_eq!(ctx.counters().draw_calls_per_frame, 1);
        assert_eq!(ctx.counters().other_state_changes_per_frame, 1);
    }

    ctx.reset_at(100.0);
    assert_eq!(ctx.counters().draw_calls_per_frame, 0);
    assert_eq!(ctx.counters().draw_primitives_per_frame, 0);
    assert_eq!(ctx.counters().mesh_count, 1);
}

#[test]
fn test_integration_version_fallback() {
    let (ctx, calls) = create_context_with(RecordingApi::new(ApiVersion::V1, &[]), ContextOptions::default());

    assert_eq!(ctx.version(), ApiVersion::V1);
    assert!(!ctx.is_webgl2());
    assert_eq!(count(&calls, "create_surface"), 2);
}

#[test]
fn test_integration_gpu_sync_by_platform() {
    let (mut chromium, calls) = create_context_with(
        RecordingApi::new(ApiVersion::V2, &[]),
        ContextOptions::default().with_platform(PlatformFamily::Chromium),
    );
    chromium.sync_gpu();
    assert_eq!(count(&calls, "read_pixel"), 1);

    let (mut other, calls) = create_context();
    other.sync_gpu();
    assert_eq!(count(&calls, "finish"), 1);
}

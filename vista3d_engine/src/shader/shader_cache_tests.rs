//! Unit tests for ShaderKey and ShaderPermutationCache

use super::*;
use crate::graphics::mock_graphics_api::{count_calls, create_mock_context};
use crate::shader::shader_library::builtin;
use crate::shader::shader_source::ShaderSourceOptions;

const NO_FLAGS: &[&str] = &[];

// ============================================================================
// KEY NORMALIZATION
// ============================================================================

#[test]
fn test_key_flags_are_order_free() {
    assert_eq!(ShaderKey::new("sprite", &["DISC", "TEXTURE"]), ShaderKey::new("sprite", &["TEXTURE", "DISC"]));
}

#[test]
fn test_key_flags_case_folded_and_deduplicated() {
    let key = ShaderKey::new("sprite", &["b", "A", "B", " a "]);
    assert_eq!(key.flags(), &["A".to_string(), "B".to_string()]);
    assert_eq!(key, ShaderKey::new("sprite", &["A", "B"]));
    assert!(key.has_flag("A"));
    assert!(!key.has_flag("C"));
}

#[test]
fn test_key_base_distinguishes() {
    assert_ne!(ShaderKey::new("sprite", NO_FLAGS), ShaderKey::new("label", NO_FLAGS));
    assert_ne!(ShaderKey::new("sprite", NO_FLAGS), ShaderKey::new("sprite", &["DISC"]));
}

#[test]
fn test_key_display() {
    assert_eq!(ShaderKey::new("color", NO_FLAGS).to_string(), "color");
    assert_eq!(ShaderKey::new("sprite", &["texture", "disc"]).to_string(), "sprite[DISC,TEXTURE]");
}

// ============================================================================
// PERMUTATION CACHE
// ============================================================================

#[test]
fn test_equal_flag_sets_share_one_program() {
    let (mut ctx, log) = create_mock_context();
    let library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();

    let a = cache.get(&mut ctx, &library, builtin::SPRITE, &["A", "B"]);
    let b = cache.get(&mut ctx, &library, builtin::SPRITE, &["b", "A"]);

    assert_eq!(a, b);
    assert!(cache.is_ready(a));
    assert_eq!(count_calls(&log, "create_program"), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_distinct_flags_compile_distinct_programs() {
    let (mut ctx, log) = create_mock_context();
    let library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();

    let plain = cache.get(&mut ctx, &library, builtin::SPRITE, NO_FLAGS);
    let textured = cache.get(&mut ctx, &library, builtin::SPRITE, &["TEXTURE"]);

    assert_ne!(plain, textured);
    assert_eq!(count_calls(&log, "create_program"), 2);
    assert!(cache.shader(textured).unwrap().user_uniform("uTexture0").is_some());
    assert!(cache.shader(plain).unwrap().user_uniform("uTexture0").is_none());
}

#[test]
fn test_pending_source_compiles_in_place() {
    let (mut ctx, log) = create_mock_context();
    let mut library = ShaderLibrary::new();
    let mut cache = ShaderPermutationCache::new();
    library.begin_load("terrain");

    let first = cache.get(&mut ctx, &library, "terrain", NO_FLAGS);
    assert_eq!(cache.shader(first).unwrap().state(), ShaderState::Pending);
    assert_eq!(count_calls(&log, "create_program"), 0);

    library
        .finish_load("terrain", "void main() {}", "uniform vec4 uColor;\nvoid main() {}",
            ShaderSourceOptions::default())
        .unwrap();
    let second = cache.get(&mut ctx, &library, "terrain", NO_FLAGS);

    assert_eq!(first, second);
    assert!(cache.is_ready(second));
    assert_eq!(count_calls(&log, "create_program"), 1);
}

#[test]
fn test_compile_pending_after_source_arrives() {
    let (mut ctx, log) = create_mock_context();
    let mut library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();
    library.begin_load("terrain");
    let plain = cache.get(&mut ctx, &library, "terrain", NO_FLAGS);
    let fog = cache.get(&mut ctx, &library, "terrain", &["FOG"]);
    let color = cache.get(&mut ctx, &library, builtin::COLOR, NO_FLAGS);
    assert_eq!(count_calls(&log, "create_program"), 1);

    // Still loading: nothing to do
    assert_eq!(cache.compile_pending(&mut ctx, &library), 0);

    library
        .finish_load("terrain", "void main() {}", "uniform vec4 uColor;\nvoid main() {}",
            ShaderSourceOptions::default())
        .unwrap();
    assert_eq!(cache.compile_pending(&mut ctx, &library), 2);

    assert!(cache.is_ready(plain) && cache.is_ready(fog) && cache.is_ready(color));
    assert_eq!(count_calls(&log, "create_program"), 3);
    assert_eq!(cache.compile_pending(&mut ctx, &library), 0);
}

#[test]
fn test_compile_pending_fails_on_failed_load() {
    let (mut ctx, log) = create_mock_context();
    let mut library = ShaderLibrary::new();
    let mut cache = ShaderPermutationCache::new();
    library.begin_load("terrain");
    let h = cache.get(&mut ctx, &library, "terrain", NO_FLAGS);

    library.fail_load("terrain", "404");

    assert_eq!(cache.compile_pending(&mut ctx, &library), 0);
    assert_eq!(cache.shader(h).unwrap().state(), ShaderState::Failed);
    assert_eq!(count_calls(&log, "create_program"), 0);
}

#[test]
fn test_unknown_source_fails() {
    let (mut ctx, _) = create_mock_context();
    let library = ShaderLibrary::new();
    let mut cache = ShaderPermutationCache::new();

    let h = cache.get(&mut ctx, &library, "nothing", NO_FLAGS);
    assert_eq!(cache.shader(h).unwrap().state(), ShaderState::Failed);
}

#[test]
fn test_failed_permutation_not_retried() {
    let (mut ctx, log) = create_mock_context();
    let mut library = ShaderLibrary::new();
    library.add_source("bad", "void main() {}", "#error\n", ShaderSourceOptions::default()).unwrap();
    let mut cache = ShaderPermutationCache::new();

    let a = cache.get(&mut ctx, &library, "bad", NO_FLAGS);
    let b = cache.get(&mut ctx, &library, "bad", NO_FLAGS);

    assert_eq!(a, b);
    assert!(!cache.is_ready(a));
    assert_eq!(count_calls(&log, "create_program(failed)"), 1);
    assert_eq!(cache.ready_count(), 0);
}

#[test]
fn test_destroy_then_get_recompiles() {
    let (mut ctx, log) = create_mock_context();
    let library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();

    let old = cache.get(&mut ctx, &library, builtin::COLOR, NO_FLAGS);
    assert!(cache.destroy(&mut ctx, old));
    let new = cache.get(&mut ctx, &library, builtin::COLOR, NO_FLAGS);

    assert_ne!(old, new);
    assert!(cache.shader(old).is_none());
    assert_eq!(count_calls(&log, "create_program"), 2);
    assert_eq!(count_calls(&log, "delete_program"), 1);
}

#[test]
fn test_get_with_source() {
    let (mut ctx, _) = create_mock_context();
    let mut cache = ShaderPermutationCache::new();

    let h = cache.get_with_source(&mut ctx, "inline", "void main() {}",
        "uniform float uAlpha;\nvoid main() {}", NO_FLAGS);

    assert!(cache.is_ready(h));
    assert_eq!(cache.find("inline", NO_FLAGS), Some(h));
    assert!(cache.shader(h).unwrap().user_uniform("uAlpha").is_some());
}

#[test]
fn test_builtins_compile() {
    let (mut ctx, _) = create_mock_context();
    let library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();

    for name in [builtin::COLOR, builtin::TEXTURE, builtin::SPRITE, builtin::LABEL, builtin::BLIT] {
        let h = cache.get(&mut ctx, &library, name, NO_FLAGS);
        assert!(cache.is_ready(h), "builtin {} not ready", name);
    }
    assert_eq!(cache.ready_count(), 5);
}

#[test]
fn test_destroy_all() {
    let (mut ctx, _) = create_mock_context();
    let library = ShaderLibrary::with_builtins();
    let mut cache = ShaderPermutationCache::new();
    cache.get(&mut ctx, &library, builtin::COLOR, NO_FLAGS);
    cache.get(&mut ctx, &library, builtin::LABEL, NO_FLAGS);

    cache.destroy_all(&mut ctx);
    assert!(cache.is_empty());
}

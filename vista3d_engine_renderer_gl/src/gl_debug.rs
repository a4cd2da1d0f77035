/// GL error tracking - checks `glGetError` after backend calls and keeps
/// per-error statistics with a colored report.
///
/// Checking is opt-in (`GlGraphicsApi::with_error_checks`): `glGetError`
/// stalls the pipeline on most drivers.

use colored::*;
use glow::HasContext;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use vista3d_engine::engine_error;

/// Global error counter
static ERROR_COUNT: AtomicU32 = AtomicU32::new(0);

/// Errors grouped by (operation, GL error name)
static ERROR_TRACKER: Mutex<Option<FxHashMap<(String, &'static str), u32>>> = Mutex::new(None);

/// Name of a GL error code
pub fn error_name(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "GL_UNKNOWN_ERROR",
    }
}

/// Record one error raised by `operation`
pub fn record_error(operation: &str, code: u32) {
    let name = error_name(code);
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut tracker) = ERROR_TRACKER.lock() {
        *tracker
            .get_or_insert_with(FxHashMap::default)
            .entry((operation.to_string(), name))
            .or_insert(0) += 1;
    }
    engine_error!("vista3d::GlGraphicsApi", "{} raised {} (0x{:04X})", operation, name, code);
}

/// Drain the GL error queue after `operation`; returns the number of errors
pub fn check_errors(gl: &glow::Context, operation: &str) -> u32 {
    let mut count = 0;
    loop {
        let code = unsafe { gl.get_error() };
        if code == glow::NO_ERROR {
            return count;
        }
        record_error(operation, code);
        count += 1;
        // CONTEXT_LOST repeats forever
        if code == glow::CONTEXT_LOST {
            return count;
        }
    }
}

/// Total errors recorded since the last reset
pub fn error_count() -> u32 {
    ERROR_COUNT.load(Ordering::Relaxed)
}

/// Errors recorded for one operation
pub fn error_count_for(operation: &str) -> u32 {
    ERROR_TRACKER
        .lock()
        .ok()
        .and_then(|tracker| {
            tracker.as_ref().map(|t| {
                t.iter()
                    .filter(|((op, _), _)| op == operation)
                    .map(|(_, count)| *count)
                    .sum()
            })
        })
        .unwrap_or(0)
}

pub fn reset_error_stats() {
    ERROR_COUNT.store(0, Ordering::Relaxed);
    if let Ok(mut tracker) = ERROR_TRACKER.lock() {
        *tracker = None;
    }
}

/// Print the GL error statistics report
pub fn print_error_stats_report() {
    let total = error_count();
    if total == 0 {
        println!("\n{}", "✓ No GL errors".green().bold());
        return;
    }

    println!("\n{}", "=== GL Error Report ===".bright_blue().bold());
    if let Ok(tracker) = ERROR_TRACKER.lock() {
        if let Some(tracker) = tracker.as_ref() {
            let mut rows: Vec<_> = tracker.iter().collect();
            rows.sort_by(|a, b| b.1.cmp(a.1));
            for ((operation, name), count) in rows {
                println!("  {} {} x{}", name.red().bold(), operation, count);
            }
        }
    }
    println!("  {} {}", "Total:".white().bold(), total);
    println!("{}\n", "=======================".bright_blue().bold());
}

/// Frame profiling counters and the FPS clock.
///
/// Fields ending in `_per_frame` are zeroed by `GraphicsContext::reset` once
/// per frame. Memory and resource counts are cumulative and only move when
/// resources are created or destroyed.

use std::fmt;

/// Number of frame timestamps kept
pub const FRAME_RING_SIZE: usize = 20;
/// FPS is averaged over this many frames
pub const FPS_WINDOW: usize = 10;
/// FPS is recomputed every this many frames
pub const FPS_UPDATE_INTERVAL: u64 = 30;

// ===== COUNTERS =====

/// Frame statistics gathered by the instrumented graphics context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilingCounters {
    // ----- per frame -----
    pub draw_calls_per_frame: u32,
    pub draw_primitives_per_frame: u64,
    pub shader_state_changes_per_frame: u32,
    pub uniform_syncs_per_frame: u32,
    pub texture_state_changes_per_frame: u32,
    pub framebuffer_state_changes_per_frame: u32,
    pub depth_state_changes_per_frame: u32,
    pub other_state_changes_per_frame: u32,
    pub clears_per_frame: u32,
    pub clipping_culled_vertices_per_frame: u64,
    pub bim_culled_vertices_per_frame: u64,
    pub frustum_culled_vertices_per_frame: u64,
    pub zero_area_culled_vertices_per_frame: u64,

    // ----- cumulative -----
    pub texture_kbytes: f64,
    pub texture_count: u32,
    pub mesh_kbytes: f64,
    pub mesh_count: u32,
    pub framebuffer_count: u32,
    pub shader_count: u32,

    pub fps: f64,
}

impl ProfilingCounters {
    /// Zero every per-frame counter, leaving cumulative counters and FPS intact
    pub fn reset_per_frame(&mut self) {
        self.draw_calls_per_frame = 0;
        self.draw_primitives_per_frame = 0;
        self.shader_state_changes_per_frame = 0;
        self.uniform_syncs_per_frame = 0;
        self.texture_state_changes_per_frame = 0;
        self.framebuffer_state_changes_per_frame = 0;
        self.depth_state_changes_per_frame = 0;
        self.other_state_changes_per_frame = 0;
        self.clears_per_frame = 0;
        self.clipping_culled_vertices_per_frame = 0;
        self.bim_culled_vertices_per_frame = 0;
        self.frustum_culled_vertices_per_frame = 0;
        self.zero_area_culled_vertices_per_frame = 0;
    }

    pub fn state_changes_per_frame(&self) -> u32 {
        self.shader_state_changes_per_frame
            + self.texture_state_changes_per_frame
            + self.framebuffer_state_changes_per_frame
            + self.depth_state_changes_per_frame
            + self.other_state_changes_per_frame
    }

    pub fn culled_vertices_per_frame(&self) -> u64 {
        self.clipping_culled_vertices_per_frame
            + self.bim_culled_vertices_per_frame
            + self.frustum_culled_vertices_per_frame
            + self.zero_area_culled_vertices_per_frame
    }
}

impl fmt::Display for ProfilingCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "fps: {:.1}", self.fps)?;
        writeln!(f, "draw calls: {}", self.draw_calls_per_frame)?;
        writeln!(f, "primitives: {}", self.draw_primitives_per_frame)?;
        writeln!(
            f,
            "state changes: {} (shader {}, texture {}, framebuffer {}, depth {}, other {})",
            self.state_changes_per_frame(),
            self.shader_state_changes_per_frame,
            self.texture_state_changes_per_frame,
            self.framebuffer_state_changes_per_frame,
            self.depth_state_changes_per_frame,
            self.other_state_changes_per_frame,
        )?;
        writeln!(f, "uniform syncs: {}", self.uniform_syncs_per_frame)?;
        writeln!(f, "clears: {}", self.clears_per_frame)?;
        writeln!(
            f,
            "culled vertices: {} (clipping {}, bim {}, frustum {}, zero area {})",
            self.culled_vertices_per_frame(),
            self.clipping_culled_vertices_per_frame,
            self.bim_culled_vertices_per_frame,
            self.frustum_culled_vertices_per_frame,
            self.zero_area_culled_vertices_per_frame,
        )?;
        writeln!(f, "textures: {} ({:.1} KB)", self.texture_count, self.texture_kbytes)?;
        writeln!(f, "meshes: {} ({:.1} KB)", self.mesh_count, self.mesh_kbytes)?;
        writeln!(f, "framebuffers: {}", self.framebuffer_count)?;
        write!(f, "shaders: {}", self.shader_count)
    }
}

// ===== FRAME CLOCK =====

/// Ring of frame timestamps driving the FPS estimate
#[derive(Debug, Clone)]
pub struct FrameClock {
    timestamps: [f64; FRAME_RING_SIZE],
    slot: usize,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            timestamps: [0.0; FRAME_RING_SIZE],
            slot: 0,
            frame_count: 0,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a frame at `now_ms`
    ///
    /// Returns the new FPS value every `FPS_UPDATE_INTERVAL` frames.
    pub fn tick(&mut self, now_ms: f64) -> Option<f64> {
        self.timestamps[self.slot] = now_ms;
        let window_start = self.timestamps[(self.slot + FPS_WINDOW) % FRAME_RING_SIZE];
        self.slot = (self.slot + 1) % FRAME_RING_SIZE;
        self.frame_count += 1;

        if self.frame_count % FPS_UPDATE_INTERVAL != 0 {
            return None;
        }
        let elapsed = now_ms - window_start;
        if elapsed > 0.0 {
            Some(FPS_WINDOW as f64 / elapsed * 1000.0)
        } else {
            None
        }
    }

    /// Slot the next timestamp goes into
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Frames recorded since creation
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
#[path = "profiling_tests.rs"]
mod tests;

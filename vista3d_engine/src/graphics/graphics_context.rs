/// Instrumented graphics context.
///
/// `GraphicsContext` is a decorator around exactly one `GraphicsApi`. It
/// negotiates capabilities once at creation, forwards every call to the
/// raw API and bumps the matching `ProfilingCounters` field for each state
/// change and draw. Binds of an already bound program, texture or
/// framebuffer are elided and not counted. Backends may disturb texture and
/// framebuffer bindings while creating objects, so creating a texture or a
/// framebuffer forgets the shadowed bindings and the next bind always goes
/// through.
///
/// There is no "current context": engine code receives
/// `&mut GraphicsContext` explicitly.

use std::time::Instant;
use crate::error::{Error, Result};
use crate::graphics::capabilities::{negotiate, ApiVersion, Capabilities, CAPABILITY_TABLE};
use crate::graphics::context_options::{ContextOptions, PlatformFamily};
use crate::graphics::graphics_api::{
    BufferId, BufferTarget, ClearMask, DepthFunc, FramebufferId, GraphicsApi, IndexType,
    PrimitiveMode, ProgramId, ProgramReflection, RenderState, TextureDesc, TextureFormat,
    TextureId, UniformValue, VertexArrayId, VertexLayout,
};
use crate::graphics::profiling::{FrameClock, ProfilingCounters};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Texture units tracked for redundant-bind elision
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Last binding forwarded to the backend for one binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shadow<T> {
    Known(Option<T>),
    /// Possibly changed by the backend since the last forwarded bind
    Unknown,
}

impl<T: Copy + PartialEq> Shadow<T> {
    fn is(&self, value: Option<T>) -> bool {
        *self == Shadow::Known(value)
    }

    fn known(&self) -> Option<T> {
        match self {
            Shadow::Known(value) => *value,
            Shadow::Unknown => None,
        }
    }
}

/// Instrumented, capability-aware wrapper around the raw graphics API
pub struct GraphicsContext {
    api: Box<dyn GraphicsApi>,
    options: ContextOptions,
    version: ApiVersion,
    version_string: String,
    capabilities: Capabilities,
    extensions: Vec<&'static str>,
    counters: ProfilingCounters,
    clock: FrameClock,
    epoch: Instant,
    current_program: Option<ProgramId>,
    bound_textures: [Shadow<TextureId>; MAX_TEXTURE_UNITS],
    current_framebuffer: Shadow<FramebufferId>,
}

impl GraphicsContext {
    /// Create the context: surface, version detection, capability negotiation
    ///
    /// # Errors
    ///
    /// Returns `Error::GraphicsUnsupported` if no surface can be created for
    /// any acceptable API version, or if the driver reports no version.
    pub fn create(mut api: Box<dyn GraphicsApi>, options: ContextOptions) -> Result<Self> {
        let preferred = options.preferred_version();
        let mut attempts = vec![preferred];
        if preferred == ApiVersion::V2 {
            attempts.push(ApiVersion::V1);
        }

        let mut surface_created = false;
        let mut failures = Vec::new();
        for version in attempts {
            match api.create_surface(&options.surface_request(version)) {
                Ok(()) => {
                    surface_created = true;
                    break;
                }
                Err(msg) => {
                    engine_warn!("vista3d::GraphicsContext",
                        "API version {} surface refused: {}", version.number(), msg);
                    failures.push(msg);
                }
            }
        }
        if !surface_created {
            engine_error!("vista3d::GraphicsContext",
                "No usable graphics surface: {}", failures.join("; "));
            return Err(Error::GraphicsUnsupported(failures.join("; ")));
        }

        let version_string = api.version_string();
        let version = ApiVersion::detect(&version_string).ok_or_else(|| {
            engine_error!("vista3d::GraphicsContext",
                "Unrecognized API version string '{}'", version_string);
            Error::GraphicsUnsupported(format!("unrecognized version '{}'", version_string))
        })?;

        let negotiated = negotiate(api.as_mut(), version, &options, CAPABILITY_TABLE);

        engine_info!("vista3d::GraphicsContext",
            "Context created: '{}' (API v{}), capabilities {:?}",
            version_string, version.number(), negotiated.flags);
        if !negotiated.extensions.is_empty() {
            engine_debug!("vista3d::GraphicsContext",
                "Enabled extensions: {}", negotiated.extensions.join(", "));
        }

        Ok(Self {
            api,
            options,
            version,
            version_string,
            capabilities: negotiated.flags,
            extensions: negotiated.extensions,
            counters: ProfilingCounters::default(),
            clock: FrameClock::new(),
            epoch: Instant::now(),
            current_program: None,
            bound_textures: [Shadow::Known(None); MAX_TEXTURE_UNITS],
            current_framebuffer: Shadow::Known(None),
        })
    }

    // ===== GETTERS =====

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// True when the active API is version 2
    pub fn is_webgl2(&self) -> bool {
        self.version == ApiVersion::V2
    }

    pub fn version_string(&self) -> &str {
        &self.version_string
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn enabled_extensions(&self) -> &[&'static str] {
        &self.extensions
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn counters(&self) -> &ProfilingCounters {
        &self.counters
    }

    /// Mutable counters, for subsystems reporting culling or memory figures
    pub fn counters_mut(&mut self) -> &mut ProfilingCounters {
        &mut self.counters
    }

    /// Frames started since creation (number of `reset` calls)
    pub fn frame_number(&self) -> u64 {
        self.clock.frame_count()
    }

    // ===== FRAME =====

    /// Start a new frame using the context's monotonic clock
    pub fn reset(&mut self) {
        let now_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.reset_at(now_ms);
    }

    /// Start a new frame at an explicit timestamp in milliseconds
    ///
    /// Records the timestamp, refreshes FPS every 30 frames, then zeroes
    /// every per-frame counter.
    pub fn reset_at(&mut self, now_ms: f64) {
        if let Some(fps) = self.clock.tick(now_ms) {
            self.counters.fps = fps;
        }
        self.counters.reset_per_frame();
    }

    /// Block until the GPU drained its command queue
    pub fn sync_gpu(&mut self) {
        match self.options.platform {
            PlatformFamily::Chromium => {
                let _ = self.api.read_pixel(0, 0);
            }
            PlatformFamily::Other => self.api.finish(),
        }
    }

    // ===== DRAW (instrumented) =====

    pub fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u32) {
        self.counters.draw_calls_per_frame += 1;
        self.counters.draw_primitives_per_frame += mode.primitive_count(count) as u64;
        self.api.draw_elements(mode, count, index_type, offset);
    }

    /// Instanced indexed draw; skipped with a warning without the instancing capability
    pub fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: u32,
    ) {
        if !self.has(Capabilities::INSTANCING) {
            engine_warn!("vista3d::GraphicsContext",
                "Instanced draw skipped: instancing not available");
            return;
        }
        self.counters.draw_calls_per_frame += 1;
        self.counters.draw_primitives_per_frame +=
            mode.primitive_count(count) as u64 * instances as u64;
        self.api.draw_elements_instanced(mode, count, index_type, offset, instances);
    }

    pub fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.counters.draw_calls_per_frame += 1;
        self.counters.draw_primitives_per_frame += mode.primitive_count(count) as u64;
        self.api.draw_arrays(mode, first, count);
    }

    // ===== STATE (instrumented) =====

    pub fn use_program(&mut self, program: Option<ProgramId>) {
        if self.current_program == program {
            return;
        }
        if program.is_some() {
            self.counters.shader_state_changes_per_frame += 1;
        }
        self.current_program = program;
        self.api.use_program(program);
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn upload_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue) {
        self.counters.uniform_syncs_per_frame += 1;
        self.api.upload_uniform(program, location, value);
    }

    pub fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        if let Some(slot) = self.bound_textures.get(unit as usize) {
            if slot.is(texture) {
                return;
            }
        }
        if let Some(slot) = self.bound_textures.get_mut(unit as usize) {
            *slot = Shadow::Known(texture);
        }
        self.counters.texture_state_changes_per_frame += 1;
        self.api.bind_texture(unit, texture);
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        if self.current_framebuffer.is(framebuffer) {
            return;
        }
        self.current_framebuffer = Shadow::Known(framebuffer);
        self.counters.framebuffer_state_changes_per_frame += 1;
        self.api.bind_framebuffer(framebuffer);
    }

    /// Framebuffer last bound through the context, `None` for the screen or
    /// when object creation may have changed the binding since
    pub fn current_framebuffer(&self) -> Option<FramebufferId> {
        self.current_framebuffer.known()
    }

    /// Texture last bound on `unit` through the context
    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.bound_textures.get(unit as usize).and_then(Shadow::known)
    }

    pub fn clear(&mut self, mask: ClearMask) {
        self.counters.clears_per_frame += 1;
        self.api.clear(mask);
    }

    pub fn set_enabled(&mut self, state: RenderState, enabled: bool) {
        match state {
            RenderState::DepthTest => self.counters.depth_state_changes_per_frame += 1,
            _ => self.counters.other_state_changes_per_frame += 1,
        }
        self.api.set_enabled(state, enabled);
    }

    pub fn depth_mask(&mut self, write: bool) {
        self.counters.depth_state_changes_per_frame += 1;
        self.api.depth_mask(write);
    }

    pub fn depth_func(&mut self, func: DepthFunc) {
        self.counters.depth_state_changes_per_frame += 1;
        self.api.depth_func(func);
    }

    pub fn color_mask(&mut self, mask: [bool; 4]) {
        self.counters.other_state_changes_per_frame += 1;
        self.api.color_mask(mask);
    }

    // ===== STATE (pass-through) =====

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.api.set_viewport(x, y, width, height);
    }

    pub fn clear_color(&mut self, color: [f32; 4]) {
        self.api.clear_color(color);
    }

    pub fn clear_depth(&mut self, depth: f32) {
        self.api.clear_depth(depth);
    }

    pub fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.api.bind_vertex_array(vertex_array);
    }

    pub fn bind_vertex_buffers(&mut self, vertices: BufferId, indices: Option<BufferId>, layout: &VertexLayout) {
        self.api.bind_vertex_buffers(vertices, indices, layout);
    }

    // ===== OBJECTS =====

    pub fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attribute_locations: &[(&str, u32)],
    ) -> Result<(ProgramId, ProgramReflection)> {
        self.api
            .create_program(vertex_source, fragment_source, attribute_locations)
            .map_err(Error::BackendError)
    }

    pub fn delete_program(&mut self, program: ProgramId) {
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.api.delete_program(program);
    }

    /// Create a 2D texture, checking the format against negotiated capabilities
    pub fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> Result<TextureId> {
        if desc.format == TextureFormat::Rgba32F && !self.has(Capabilities::FLOAT_TEXTURE) {
            return Err(Error::InvalidOperation("float textures not supported".to_string()));
        }
        if desc.format.is_depth() && !self.has(Capabilities::DEPTH_TEXTURE) {
            return Err(Error::InvalidOperation("depth textures not supported".to_string()));
        }
        let texture = self.api.create_texture(desc, pixels).map_err(Error::BackendError);
        self.bound_textures = [Shadow::Unknown; MAX_TEXTURE_UNITS];
        texture
    }

    pub fn delete_texture(&mut self, texture: TextureId) {
        for slot in self.bound_textures.iter_mut() {
            if slot.is(Some(texture)) {
                *slot = Shadow::Known(None);
            }
        }
        self.api.delete_texture(texture);
    }

    pub fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> Result<FramebufferId> {
        let framebuffer = self.api.create_framebuffer(color, depth).map_err(Error::BackendError);
        self.current_framebuffer = Shadow::Unknown;
        framebuffer
    }

    pub fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.current_framebuffer.is(Some(framebuffer)) {
            self.current_framebuffer = Shadow::Known(None);
        }
        self.api.delete_framebuffer(framebuffer);
    }

    pub fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId> {
        self.api.create_buffer(target, data).map_err(Error::BackendError)
    }

    pub fn delete_buffer(&mut self, buffer: BufferId) {
        self.api.delete_buffer(buffer);
    }

    /// Create a vertex array object; requires the VAO capability
    pub fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: Option<BufferId>,
        layout: &VertexLayout,
    ) -> Result<VertexArrayId> {
        if !self.has(Capabilities::VERTEX_ARRAY_OBJECT) {
            return Err(Error::InvalidOperation("vertex array objects not available".to_string()));
        }
        self.api
            .create_vertex_array(vertices, indices, layout)
            .map_err(Error::BackendError)
    }

    pub fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.api.delete_vertex_array(vertex_array);
    }
}

#[cfg(test)]
#[path = "graphics_context_tests.rs"]
mod tests;

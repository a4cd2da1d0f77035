/// OpenGL / OpenGL ES / WebGL implementation of the raw graphics API.
///
/// Wraps a `glow::Context` created by the windowing layer. Engine object
/// ids are small integers mapped to the native GL objects here; uniform
/// locations are indices into the per-program list built at link time.

use glow::HasContext;
use rustc_hash::FxHashMap;
use vista3d_engine::vista3d::graphics::{
    ApiResult, ApiVersion, BufferId, BufferTarget, ClearMask, DepthFunc, FramebufferId,
    GraphicsApi, IndexType, PrimitiveMode, ProgramId, ProgramReflection, ReflectedAttribute,
    ReflectedUniform, RenderState, SurfaceRequest, TextureDesc, TextureFormat, TextureId,
    UniformValue, VertexArrayId, VertexLayout,
};
use vista3d_engine::{engine_debug, engine_info, engine_warn};
use crate::gl_debug;
use crate::gl_format::{
    buffer_target_to_gl, clear_mask_to_gl, depth_attachment_to_gl, depth_func_to_gl,
    index_type_to_gl, primitive_mode_to_gl, render_state_to_gl, texture_filter_to_gl,
    texture_format_to_gl, texture_wrap_to_gl, uniform_base_name, uniform_type_from_gl,
};

type GlProgram = <glow::Context as HasContext>::Program;
type GlTexture = <glow::Context as HasContext>::Texture;
type GlFramebuffer = <glow::Context as HasContext>::Framebuffer;
type GlBuffer = <glow::Context as HasContext>::Buffer;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;
type GlUniformLocation = <glow::Context as HasContext>::UniformLocation;
type GlShader = <glow::Context as HasContext>::Shader;

struct ProgramEntry {
    program: GlProgram,
    /// Indexed by `ReflectedUniform::location`
    locations: Vec<Option<GlUniformLocation>>,
}

struct TextureEntry {
    texture: GlTexture,
    format: TextureFormat,
}

/// `GraphicsApi` over glow
pub struct GlGraphicsApi {
    gl: glow::Context,
    driver_version: String,
    native_version: Option<ApiVersion>,
    version: Option<ApiVersion>,
    check_errors: bool,

    programs: FxHashMap<u32, ProgramEntry>,
    textures: FxHashMap<u32, TextureEntry>,
    framebuffers: FxHashMap<u32, GlFramebuffer>,
    buffers: FxHashMap<u32, GlBuffer>,
    vertex_arrays: FxHashMap<u32, GlVertexArray>,
    next_id: u32,

    /// Attribute arrays enabled by `bind_vertex_buffers`
    enabled_attributes: u32,
    /// Index buffer bindings are vertex array state
    bound_vertex_array: Option<GlVertexArray>,
}

impl GlGraphicsApi {
    /// Wrap a current GL context
    pub fn new(gl: glow::Context) -> Self {
        let driver_version = unsafe { gl.get_parameter_string(glow::VERSION) };
        let native_version = ApiVersion::detect(&driver_version);
        engine_info!("vista3d::GlGraphicsApi", "GL driver: '{}'", driver_version);

        Self {
            gl,
            driver_version,
            native_version,
            version: None,
            check_errors: false,
            programs: FxHashMap::default(),
            textures: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            buffers: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            next_id: 1,
            enabled_attributes: 0,
            bound_vertex_array: None,
        }
    }

    /// Check `glGetError` after every object creation and draw call
    pub fn with_error_checks(mut self, enabled: bool) -> Self {
        self.check_errors = enabled;
        self
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check(&self, operation: &str) {
        if self.check_errors {
            gl_debug::check_errors(&self.gl, operation);
        }
    }

    fn active_version(&self) -> ApiVersion {
        self.version.unwrap_or(ApiVersion::V1)
    }

    fn buffer(&self, id: BufferId) -> Option<GlBuffer> {
        self.buffers.get(&id.0).copied()
    }

    fn texture(&self, id: TextureId) -> Option<&TextureEntry> {
        self.textures.get(&id.0)
    }

    /// Bind `vertices` and set the attribute pointers of `layout`
    unsafe fn set_vertex_attributes(&self, vertices: GlBuffer, layout: &VertexLayout) -> u32 {
        let gl = &self.gl;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertices));
        let mut enabled = 0u32;
        for attribute in &layout.attributes {
            gl.enable_vertex_attrib_array(attribute.location);
            gl.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components as i32,
                glow::FLOAT,
                false,
                layout.stride as i32,
                attribute.offset as i32,
            );
            enabled |= 1 << attribute.location;
        }
        enabled
    }

    unsafe fn compile_stage(&self, stage: u32, source: &str) -> ApiResult<GlShader> {
        let gl = &self.gl;
        let shader = gl.create_shader(stage)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            let stage_name = if stage == glow::VERTEX_SHADER { "vertex" } else { "fragment" };
            return Err(format!("{} shader: {}", stage_name, log));
        }
        Ok(shader)
    }

    unsafe fn reflect(&self, program: GlProgram) -> (ProgramReflection, Vec<Option<GlUniformLocation>>) {
        let gl = &self.gl;
        let mut reflection = ProgramReflection::default();
        let mut locations = Vec::new();

        for index in 0..gl.get_active_uniforms(program) {
            let Some(active) = gl.get_active_uniform(program, index) else { continue };
            let name = uniform_base_name(&active.name);
            let Some(ty) = uniform_type_from_gl(active.utype) else {
                engine_debug!("vista3d::GlGraphicsApi",
                    "Uniform '{}' of GL type 0x{:04X} ignored", name, active.utype);
                continue;
            };
            reflection.uniforms.push(ReflectedUniform {
                name: name.to_string(),
                ty,
                size: active.size.max(1) as u32,
                location: locations.len() as u32,
            });
            locations.push(gl.get_uniform_location(program, name));
        }

        for index in 0..gl.get_active_attributes(program) {
            let Some(active) = gl.get_active_attribute(program, index) else { continue };
            if let Some(location) = gl.get_attrib_location(program, &active.name) {
                reflection.attributes.push(ReflectedAttribute { name: active.name, location });
            }
        }
        (reflection, locations)
    }
}

impl GraphicsApi for GlGraphicsApi {
    // ===== SURFACE & DISCOVERY =====

    fn create_surface(&mut self, request: &SurfaceRequest) -> ApiResult<()> {
        let native = self
            .native_version
            .ok_or_else(|| format!("unrecognized GL version '{}'", self.driver_version))?;
        if request.version > native {
            return Err(format!(
                "'{}' provides API v{} only", self.driver_version, native.number()
            ));
        }
        self.version = Some(request.version);
        engine_debug!("vista3d::GlGraphicsApi",
            "Surface accepted for API v{} (depth {}, stencil {}, antialias {})",
            request.version.number(), request.depth, request.stencil, request.antialias);
        Ok(())
    }

    fn version_string(&self) -> String {
        match (self.version, self.native_version) {
            (Some(ApiVersion::V1), Some(ApiVersion::V2)) => {
                format!("OpenGL ES 2.0 (via {})", self.driver_version)
            }
            _ => self.driver_version.clone(),
        }
    }

    fn enable_extension(&mut self, name: &str) -> bool {
        let extensions = self.gl.supported_extensions();
        extensions.contains(name) || extensions.contains(&format!("GL_{}", name))
    }

    // ===== DRAW =====

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, index_type: IndexType, offset: u32) {
        unsafe {
            self.gl.draw_elements(primitive_mode_to_gl(mode), count as i32, index_type_to_gl(index_type), offset as i32);
        }
        self.check("draw_elements");
    }

    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        index_type: IndexType,
        offset: u32,
        instances: u32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                primitive_mode_to_gl(mode),
                count as i32,
                index_type_to_gl(index_type),
                offset as i32,
                instances as i32,
            );
        }
        self.check("draw_elements_instanced");
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        unsafe {
            self.gl.draw_arrays(primitive_mode_to_gl(mode), first as i32, count as i32);
        }
        self.check("draw_arrays");
    }

    // ===== STATE =====

    fn use_program(&mut self, program: Option<ProgramId>) {
        let native = program.and_then(|p| self.programs.get(&p.0)).map(|entry| entry.program);
        unsafe { self.gl.use_program(native) };
    }

    fn upload_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue) {
        let Some(location) = self
            .programs
            .get(&program.0)
            .and_then(|entry| entry.locations.get(location as usize))
            .and_then(|l| l.as_ref())
        else {
            return;
        };
        let gl = &self.gl;
        let location = Some(location);
        unsafe {
            match value {
                UniformValue::Float(v) => gl.uniform_1_f32(location, *v),
                UniformValue::Vec2(v) => gl.uniform_2_f32(location, v.x, v.y),
                UniformValue::Vec3(v) => gl.uniform_3_f32(location, v.x, v.y, v.z),
                UniformValue::Vec4(v) => gl.uniform_4_f32(location, v.x, v.y, v.z, v.w),
                UniformValue::Int(v) | UniformValue::Sampler(v) => gl.uniform_1_i32(location, *v),
                UniformValue::IVec2(v) => gl.uniform_2_i32(location, v[0], v[1]),
                UniformValue::IVec3(v) => gl.uniform_3_i32(location, v[0], v[1], v[2]),
                UniformValue::IVec4(v) => gl.uniform_4_i32(location, v[0], v[1], v[2], v[3]),
                UniformValue::Bool(v) => gl.uniform_1_i32(location, *v as i32),
                UniformValue::Mat3(m) => gl.uniform_matrix_3_f32_slice(location, false, &m.to_cols_array()),
                UniformValue::Mat4(m) => gl.uniform_matrix_4_f32_slice(location, false, &m.to_cols_array()),
                UniformValue::FloatArray(values) => gl.uniform_1_f32_slice(location, values),
            }
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        let native = texture.and_then(|t| self.texture(t)).map(|entry| entry.texture);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native);
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        let native = framebuffer.and_then(|f| self.framebuffers.get(&f.0).copied());
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) };
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, width as i32, height as i32) };
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        unsafe { self.gl.clear_color(color[0], color[1], color[2], color[3]) };
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn clear(&mut self, mask: ClearMask) {
        unsafe { self.gl.clear(clear_mask_to_gl(mask)) };
    }

    fn set_enabled(&mut self, state: RenderState, enabled: bool) {
        let cap = render_state_to_gl(state);
        unsafe {
            if enabled {
                self.gl.enable(cap);
            } else {
                self.gl.disable(cap);
            }
        }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) };
    }

    fn depth_func(&mut self, func: DepthFunc) {
        unsafe { self.gl.depth_func(depth_func_to_gl(func)) };
    }

    fn color_mask(&mut self, mask: [bool; 4]) {
        unsafe { self.gl.color_mask(mask[0], mask[1], mask[2], mask[3]) };
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        let native = vertex_array.and_then(|v| self.vertex_arrays.get(&v.0).copied());
        unsafe { self.gl.bind_vertex_array(native) };
        self.bound_vertex_array = native;
    }

    fn bind_vertex_buffers(&mut self, vertices: BufferId, indices: Option<BufferId>, layout: &VertexLayout) {
        let Some(vertex_buffer) = self.buffer(vertices) else {
            engine_warn!("vista3d::GlGraphicsApi", "Unknown vertex buffer {}", vertices.0);
            return;
        };
        let index_buffer = indices.and_then(|i| self.buffer(i));
        unsafe {
            let enabled = self.set_vertex_attributes(vertex_buffer, layout);
            let stale = self.enabled_attributes & !enabled;
            for location in (0..32u32).filter(|l| stale & (1u32 << *l) != 0) {
                self.gl.disable_vertex_attrib_array(location);
            }
            self.enabled_attributes = enabled;
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, index_buffer);
        }
    }

    // ===== SYNC =====

    fn finish(&mut self) {
        unsafe { self.gl.finish() };
    }

    fn read_pixel(&mut self, x: i32, y: i32) -> [u8; 4] {
        let mut pixel = [0u8; 4];
        unsafe {
            self.gl.read_pixels(
                x, y, 1, 1,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixel),
            );
        }
        pixel
    }

    // ===== OBJECTS =====

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attribute_locations: &[(&str, u32)],
    ) -> ApiResult<(ProgramId, ProgramReflection)> {
        let (program, reflection, locations) = unsafe {
            let vertex = self.compile_stage(glow::VERTEX_SHADER, vertex_source)?;
            let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, fragment_source) {
                Ok(fragment) => fragment,
                Err(err) => {
                    self.gl.delete_shader(vertex);
                    return Err(err);
                }
            };

            let gl = &self.gl;
            let program = gl.create_program()?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            for (name, location) in attribute_locations {
                gl.bind_attrib_location(program, *location, name);
            }
            gl.link_program(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(format!("link: {}", log));
            }
            let (reflection, locations) = self.reflect(program);
            (program, reflection, locations)
        };
        self.check("create_program");

        let id = self.next();
        self.programs.insert(id, ProgramEntry { program, locations });
        Ok((ProgramId(id), reflection))
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(entry) = self.programs.remove(&program.0) {
            unsafe { self.gl.delete_program(entry.program) };
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> ApiResult<TextureId> {
        if let Some(pixels) = pixels {
            if pixels.len() as u64 != desc.byte_size() {
                return Err(format!("pixel data size {} != {}", pixels.len(), desc.byte_size()));
            }
        }
        let format = texture_format_to_gl(desc.format, self.active_version());
        let texture = unsafe {
            let gl = &self.gl;
            let texture = gl.create_texture()?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            let filter = texture_filter_to_gl(desc.filter);
            let wrap = texture_wrap_to_gl(desc.wrap);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format.internal_format,
                desc.width as i32,
                desc.height as i32,
                0,
                format.format,
                format.ty,
                pixels,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };
        self.check("create_texture");

        let id = self.next();
        self.textures.insert(id, TextureEntry { texture, format: desc.format });
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(entry) = self.textures.remove(&texture.0) {
            unsafe { self.gl.delete_texture(entry.texture) };
        }
    }

    fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> ApiResult<FramebufferId> {
        let color = self
            .texture(color)
            .map(|entry| entry.texture)
            .ok_or_else(|| format!("unknown color texture {}", color.0))?;
        let depth = match depth {
            Some(id) => Some(
                self.texture(id)
                    .map(|entry| (entry.texture, depth_attachment_to_gl(entry.format)))
                    .ok_or_else(|| format!("unknown depth texture {}", id.0))?,
            ),
            None => None,
        };

        let framebuffer = unsafe {
            let gl = &self.gl;
            let framebuffer = gl.create_framebuffer()?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0, glow::TEXTURE_2D, Some(color), 0);
            if let Some((texture, attachment)) = depth {
                gl.framebuffer_texture_2d(glow::FRAMEBUFFER, attachment, glow::TEXTURE_2D, Some(texture), 0);
            }
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_framebuffer(framebuffer);
                return Err(format!("framebuffer incomplete (0x{:04X})", status));
            }
            framebuffer
        };

        let id = self.next();
        self.framebuffers.insert(id, framebuffer);
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(native) = self.framebuffers.remove(&framebuffer.0) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> ApiResult<BufferId> {
        let target = buffer_target_to_gl(target);
        // Binding an index buffer would replace the one of the bound vertex array
        let restore = self.bound_vertex_array.filter(|_| target == glow::ELEMENT_ARRAY_BUFFER);
        let buffer = unsafe {
            let gl = &self.gl;
            let buffer = gl.create_buffer()?;
            if restore.is_some() {
                gl.bind_vertex_array(None);
            }
            gl.bind_buffer(target, Some(buffer));
            gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            gl.bind_buffer(target, None);
            if restore.is_some() {
                gl.bind_vertex_array(restore);
            }
            buffer
        };
        self.check("create_buffer");

        let id = self.next();
        self.buffers.insert(id, buffer);
        Ok(BufferId(id))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(native) = self.buffers.remove(&buffer.0) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: Option<BufferId>,
        layout: &VertexLayout,
    ) -> ApiResult<VertexArrayId> {
        let vertex_buffer = self
            .buffer(vertices)
            .ok_or_else(|| format!("unknown vertex buffer {}", vertices.0))?;
        let index_buffer = indices.and_then(|i| self.buffer(i));

        let vertex_array = unsafe {
            let vertex_array = self.gl.create_vertex_array()?;
            self.gl.bind_vertex_array(Some(vertex_array));
            self.set_vertex_attributes(vertex_buffer, layout);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, index_buffer);
            self.gl.bind_vertex_array(self.bound_vertex_array);
            vertex_array
        };
        self.check("create_vertex_array");

        let id = self.next();
        self.vertex_arrays.insert(id, vertex_array);
        Ok(VertexArrayId(id))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if let Some(native) = self.vertex_arrays.remove(&vertex_array.0) {
            if self.bound_vertex_array == Some(native) {
                self.bound_vertex_array = None;
            }
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }
}

impl Drop for GlGraphicsApi {
    fn drop(&mut self) {
        let leaked = self.programs.len() + self.textures.len() + self.framebuffers.len()
            + self.buffers.len() + self.vertex_arrays.len();
        if leaked > 0 {
            engine_warn!("vista3d::GlGraphicsApi",
                "{} GL objects still alive when the backend was dropped", leaked);
        }
    }
}

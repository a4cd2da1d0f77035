/// Mock graphics API for unit tests (no GPU required)
///
/// Records every raw call as a string in a shared log so tests can inspect
/// what the context forwarded after the mock was moved into it. Programs
/// fail to compile when a source contains `#error`; uniforms are reflected
/// from `uniform <type> <name>;` declarations.
///
/// Bindings are modeled like a GL driver: `bind_texture` selects the active
/// unit, and creating a texture or a framebuffer binds the new object for
/// the upload then unbinds it. Every draw snapshots the bindings it ran with.

use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::graphics::capabilities::ApiVersion;
use crate::graphics::context_options::ContextOptions;
use crate::graphics::graphics_api::{
    ApiResult, BufferId, BufferTarget, ClearMask, DepthFunc, FramebufferId, GraphicsApi,
    IndexType, PrimitiveMode, ProgramId, ProgramReflection, ReflectedAttribute,
    ReflectedUniform, RenderState, SurfaceRequest, TextureDesc, TextureId, UniformType,
    UniformValue, VertexArrayId, VertexLayout,
};
use crate::graphics::graphics_context::GraphicsContext;

/// Shared call log
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Objects bound on the mock driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingState {
    pub program: Option<u32>,
    /// Texture unit -> texture id
    pub textures: FxHashMap<u32, u32>,
    pub framebuffer: Option<u32>,
}

#[derive(Debug, Default)]
pub struct MockDriverState {
    pub bound: BindingState,
    pub active_unit: u32,
    /// Bindings in effect at each draw call, in order
    pub draws: Vec<BindingState>,
}

/// Shared driver state
pub type DriverState = Arc<Mutex<MockDriverState>>;

pub struct MockGraphicsApi {
    calls: CallLog,
    driver: DriverState,
    max_version: Option<ApiVersion>,
    active_version: ApiVersion,
    extensions: FxHashSet<String>,
    programs: FxHashMap<u32, ProgramReflection>,
    /// Live texture id -> storage size
    texture_bytes: FxHashMap<u32, u64>,
    texture_memory: Option<u64>,
    next_id: u32,
}

impl MockGraphicsApi {
    /// Version 2 driver exposing every extension the engine knows about
    pub fn new() -> Self {
        Self::with_version(Some(ApiVersion::V2), &[
            "EXT_color_buffer_float",
            "OES_texture_float_linear",
        ])
    }

    /// Driver limited to API version 1 with the given extensions
    pub fn webgl1(extensions: &[&str]) -> Self {
        Self::with_version(Some(ApiVersion::V1), extensions)
    }

    /// Driver supporting API version 2 with the given extensions
    pub fn webgl2(extensions: &[&str]) -> Self {
        Self::with_version(Some(ApiVersion::V2), extensions)
    }

    /// Driver refusing every surface
    pub fn refusing_surfaces() -> Self {
        Self::with_version(None, &[])
    }

    fn with_version(max_version: Option<ApiVersion>, extensions: &[&str]) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            driver: Arc::new(Mutex::new(MockDriverState::default())),
            max_version,
            active_version: ApiVersion::V1,
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            programs: FxHashMap::default(),
            texture_bytes: FxHashMap::default(),
            texture_memory: None,
            next_id: 1,
        }
    }

    /// Fail texture creation once live textures would exceed `bytes`
    pub fn with_texture_memory(mut self, bytes: u64) -> Self {
        self.texture_memory = Some(bytes);
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn record_draw(&self, call: String) {
        let mut driver = self.driver.lock().unwrap();
        let bound = driver.bound.clone();
        driver.draws.push(bound);
        self.record(call);
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Number of recorded calls starting with `prefix`
pub fn count_calls(log: &CallLog, prefix: &str) -> usize {
    log.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
}

/// Build a context over a default mock, returning its call log
pub fn create_mock_context() -> (GraphicsContext, CallLog) {
    create_mock_context_with(MockGraphicsApi::new(), ContextOptions::default())
}

pub fn create_mock_context_with(api: MockGraphicsApi, options: ContextOptions) -> (GraphicsContext, CallLog) {
    let log = api.call_log();
    let ctx = GraphicsContext::create(Box::new(api), options).unwrap();
    (ctx, log)
}

/// Build a context over a default mock, returning its driver state
pub fn create_mock_context_with_driver() -> (GraphicsContext, DriverState) {
    let api = MockGraphicsApi::new();
    let driver = api.driver_state();
    let ctx = GraphicsContext::create(Box::new(api), ContextOptions::default()).unwrap();
    (ctx, driver)
}

fn parse_uniform_type(token: &str) -> Option<UniformType> {
    Some(match token {
        "float" => UniformType::Float,
        "vec2" => UniformType::Vec2,
        "vec3" => UniformType::Vec3,
        "vec4" => UniformType::Vec4,
        "int" => UniformType::Int,
        "ivec2" => UniformType::IVec2,
        "ivec3" => UniformType::IVec3,
        "ivec4" => UniformType::IVec4,
        "bool" => UniformType::Bool,
        "mat3" => UniformType::Mat3,
        "mat4" => UniformType::Mat4,
        "sampler2D" => UniformType::Sampler2D,
        "samplerCube" => UniformType::SamplerCube,
        _ => return None,
    })
}

fn reflect(sources: &[&str], attribute_locations: &[(&str, u32)]) -> ProgramReflection {
    let mut reflection = ProgramReflection::default();
    for source in sources {
        for line in source.lines() {
            let tokens: Vec<&str> = line.trim().trim_end_matches(';').split_whitespace().collect();
            // uniform [precision] type name
            if tokens.first() != Some(&"uniform") || tokens.len() < 3 {
                continue;
            }
            let (ty_token, name_token) = (tokens[tokens.len() - 2], tokens[tokens.len() - 1]);
            let Some(ty) = parse_uniform_type(ty_token) else { continue };
            let (name, size) = match name_token.split_once('[') {
                Some((name, rest)) => (name, rest.trim_end_matches(']').parse().unwrap_or(1)),
                None => (name_token, 1),
            };
            if reflection.uniforms.iter().any(|u| u.name == name) {
                continue;
            }
            let location = reflection.uniforms.len() as u32;
            reflection.uniforms.push(ReflectedUniform { name: name.to_string(), ty, size, location });
        }
    }
    for (name, location) in attribute_locations {
        if sources[0].contains(name) {
            reflection.attributes.push(ReflectedAttribute { name: name.to_string(), location: *location });
        }
    }
    reflection
}

impl GraphicsApi for MockGraphicsApi {
    fn create_surface(&mut self, request: &SurfaceRequest) -> ApiResult<()> {
        self.record(format!("create_surface(v{})", request.version.number()));
        match self.max_version {
            Some(max) if request.version <= max => {
                self.active_version = request.version;
                Ok(())
            }
            _ => Err(format!("version {} unavailable", request.version.number())),
        }
    }

    fn version_string(&self) -> String {
        match self.active_version {
            ApiVersion::V1 => "WebGL 1.0 (Mock)".to_string(),
            ApiVersion::V2 => "WebGL 2.0 (Mock)".to_string(),
        }
    }

    fn enable_extension(&mut self, name: &str) -> bool {
        self.record(format!("enable_extension({})", name));
        self.extensions.contains(name)
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, _index_type: IndexType, _offset: u32) {
        self.record_draw(format!("draw_elements({:?}, {})", mode, count));
    }

    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        _index_type: IndexType,
        _offset: u32,
        instances: u32,
    ) {
        self.record_draw(format!("draw_elements_instanced({:?}, {}, {})", mode, count, instances));
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.record_draw(format!("draw_arrays({:?}, {}, {})", mode, first, count));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.driver.lock().unwrap().bound.program = program.map(|p| p.0);
        self.record(format!("use_program({:?})", program.map(|p| p.0)));
    }

    fn upload_uniform(&mut self, program: ProgramId, location: u32, value: &UniformValue) {
        let name = self
            .programs
            .get(&program.0)
            .and_then(|r| r.uniforms.iter().find(|u| u.location == location))
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("#{}", location));
        self.record(format!("upload_uniform({}, {}, {:?})", program.0, name, value));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        {
            let mut driver = self.driver.lock().unwrap();
            driver.active_unit = unit;
            match texture {
                Some(t) => driver.bound.textures.insert(unit, t.0),
                None => driver.bound.textures.remove(&unit),
            };
        }
        self.record(format!("bind_texture({}, {:?})", unit, texture.map(|t| t.0)));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.driver.lock().unwrap().bound.framebuffer = framebuffer.map(|f| f.0);
        self.record(format!("bind_framebuffer({:?})", framebuffer.map(|f| f.0)));
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record(format!("set_viewport({}, {}, {}, {})", x, y, width, height));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.record(format!("clear_color({:?})", color));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(format!("clear_depth({})", depth));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(format!("clear({:?})", mask));
    }

    fn set_enabled(&mut self, state: RenderState, enabled: bool) {
        self.record(format!("set_enabled({:?}, {})", state, enabled));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(format!("depth_mask({})", write));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.record(format!("depth_func({:?})", func));
    }

    fn color_mask(&mut self, mask: [bool; 4]) {
        self.record(format!("color_mask({:?})", mask));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.record(format!("bind_vertex_array({:?})", vertex_array.map(|v| v.0)));
    }

    fn bind_vertex_buffers(&mut self, vertices: BufferId, indices: Option<BufferId>, _layout: &VertexLayout) {
        self.record(format!("bind_vertex_buffers({}, {:?})", vertices.0, indices.map(|i| i.0)));
    }

    fn finish(&mut self) {
        self.record("finish()".to_string());
    }

    fn read_pixel(&mut self, x: i32, y: i32) -> [u8; 4] {
        self.record(format!("read_pixel({}, {})", x, y));
        [0, 0, 0, 255]
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attribute_locations: &[(&str, u32)],
    ) -> ApiResult<(ProgramId, ProgramReflection)> {
        if vertex_source.contains("#error") || fragment_source.contains("#error") {
            self.record("create_program(failed)".to_string());
            return Err("ERROR: 0:1: '#error' : mock compile failure".to_string());
        }
        let id = self.next();
        let reflection = reflect(&[vertex_source, fragment_source], attribute_locations);
        self.programs.insert(id, reflection.clone());
        self.record(format!("create_program({})", id));
        Ok((ProgramId(id), reflection))
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program.0);
        {
            let mut driver = self.driver.lock().unwrap();
            if driver.bound.program == Some(program.0) {
                driver.bound.program = None;
            }
        }
        self.record(format!("delete_program({})", program.0));
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> ApiResult<TextureId> {
        if let Some(pixels) = pixels {
            if pixels.len() as u64 != desc.byte_size() {
                return Err(format!("pixel data size {} != {}", pixels.len(), desc.byte_size()));
            }
        }
        if let Some(limit) = self.texture_memory {
            let live: u64 = self.texture_bytes.values().sum();
            if live + desc.byte_size() > limit {
                self.record(format!("out_of_memory({}x{})", desc.width, desc.height));
                return Err("GL_OUT_OF_MEMORY".to_string());
            }
        }
        let id = self.next();
        self.texture_bytes.insert(id, desc.byte_size());
        {
            // Upload through the active unit, then unbind
            let mut driver = self.driver.lock().unwrap();
            let unit = driver.active_unit;
            driver.bound.textures.remove(&unit);
        }
        self.record(format!("create_texture({}, {}x{})", id, desc.width, desc.height));
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.texture_bytes.remove(&texture.0);
        self.driver.lock().unwrap().bound.textures.retain(|_, t| *t != texture.0);
        self.record(format!("delete_texture({})", texture.0));
    }

    fn create_framebuffer(&mut self, color: TextureId, depth: Option<TextureId>) -> ApiResult<FramebufferId> {
        let id = self.next();
        // Attach through the framebuffer binding, then unbind
        self.driver.lock().unwrap().bound.framebuffer = None;
        self.record(format!("create_framebuffer({}, {}, {:?})", id, color.0, depth.map(|d| d.0)));
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        {
            let mut driver = self.driver.lock().unwrap();
            if driver.bound.framebuffer == Some(framebuffer.0) {
                driver.bound.framebuffer = None;
            }
        }
        self.record(format!("delete_framebuffer({})", framebuffer.0));
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> ApiResult<BufferId> {
        let id = self.next();
        self.record(format!("create_buffer({}, {:?}, {})", id, target, data.len()));
        Ok(BufferId(id))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.record(format!("delete_buffer({})", buffer.0));
    }

    fn create_vertex_array(
        &mut self,
        vertices: BufferId,
        indices: Option<BufferId>,
        _layout: &VertexLayout,
    ) -> ApiResult<VertexArrayId> {
        let id = self.next();
        self.record(format!("create_vertex_array({}, {}, {:?})", id, vertices.0, indices.map(|i| i.0)));
        Ok(VertexArrayId(id))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.record(format!("delete_vertex_array({})", vertex_array.0));
    }
}

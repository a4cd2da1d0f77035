#![allow(dead_code)]
//! Test utilities - recording graphics API for integration tests
//!
//! `RecordingApi` stands in for a GPU driver: it hands out object ids,
//! reflects uniforms from `uniform <type> <name>;` declarations and keeps a
//! shared log of every call. Programs whose source contains `#error` fail
//! to link.

use std::sync::{Arc, Mutex};
use vista3d_engine::vista3d::graphics::{
    ApiResult, ApiVersion, BufferId, BufferTarget, ClearMask, ContextOptions, DepthFunc,
    FramebufferId, GraphicsApi, IndexType, PrimitiveMode, ProgramId, ProgramReflection,
    ReflectedAttribute, ReflectedUniform, RenderState, SurfaceRequest, TextureDesc, TextureId,
    UniformType, UniformValue, VertexArrayId, VertexLayout,
};
use vista3d_engine::vista3d::GraphicsContext;

pub type Calls = Arc<Mutex<Vec<String>>>;

pub struct RecordingApi {
    calls: Calls,
    max_version: ApiVersion,
    extensions: Vec<&'static str>,
    version: ApiVersion,
    next_id: u32,
}

impl RecordingApi {
    pub fn new(max_version: ApiVersion, extensions: &[&'static str]) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            max_version,
            extensions: extensions.to_vec(),
            version: ApiVersion::V1,
            next_id: 1,
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Version 2 context with default options
pub fn create_context() -> (GraphicsContext, Calls) {
    create_context_with(RecordingApi::new(ApiVersion::V2, &[]), ContextOptions::default())
}

pub fn create_context_with(api: RecordingApi, options: ContextOptions) -> (GraphicsContext, Calls) {
    let calls = api.calls();
    let ctx = GraphicsContext::create(Box::new(api), options).expect("context creation");
    (ctx, calls)
}

pub fn count(calls: &Calls, prefix: &str) -> usize {
    calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
}

fn uniform_type(token: &str) -> Option<UniformType> {
    Some(match token {
        "float" => UniformType::Float,
        "vec2" => UniformType::Vec2,
        "vec3" => UniformType::Vec3,
        "vec4" => UniformType::Vec4,
        "int" => UniformType::Int,
        "bool" => UniformType::Bool,
        "mat3" => UniformType::Mat3,
        "mat4" => UniformType::Mat4,
        "sampler2D" => UniformType::Sampler2D,
        _ => return None,
    })
}

fn reflect(sources: [&str; 2], attribute_locations: &[(&str, u32)]) -> ProgramReflection {
    let mut reflection = ProgramReflection::default();
    for line in sources.iter().flat_map(|s| s.lines()) {
        let tokens: Vec<&str> = line.trim().trim_end_matches(';').split_whitespace().collect();
        if tokens.first() != Some(&"uniform") || tokens.len() < 3 {
            continue;
        }
        let name = tokens[tokens.len() - 1];
        let Some(ty) = uniform_type(tokens[tokens.len() - 2]) else { continue };
        if reflection.uniforms.iter().any(|u| u.name == name) {
            continue;
        }
        let location = reflection.uniforms.len() as u32;
        reflection.uniforms.push(ReflectedUniform { name: name.to_string(), ty, size: 1, location });
    }
    for (name, location) in attribute_locations {
        if sources[0].contains(name) {
            reflection.attributes.push(ReflectedAttribute { name: name.to_string(), location: *location });
        }
    }
    reflection
}

impl GraphicsApi for RecordingApi {
    fn create_surface(&mut self, request: &SurfaceRequest) -> ApiResult<()> {
        self.record(format!("create_surface(v{})", request.version.number()));
        if request.version.number() > self.max_version.number() {
            return Err("unsupported version".to_string());
        }
        self.version = request.version;
        Ok(())
    }

    fn version_string(&self) -> String {
        format!("WebGL {}.0 (Recording)", self.version.number())
    }

    fn enable_extension(&mut self, name: &str) -> bool {
        self.extensions.contains(&name)
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, count: u32, _index_type: IndexType, _offset: u32) {
        self.record(format!("draw_elements({:?}, {})", mode, count));
    }

    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveMode,
        count: u32,
        _index_type: IndexType,
        _offset: u32,
        instances: u32,
    ) {
        self.record(format!("draw_elements_instanced({:?}, {}, {})", mode, count, instances));
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, count: u32) {
        self.record(format!("draw_arrays({:?}, {}, {})", mode, first, count));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.record(format!("use_program({:?})", program.map(|p| p.0)));
    }

    fn upload_uniform(&mut self, program: ProgramId, location: u32, _value: &UniformValue) {
        self.record(format!("upload_uniform({}, {})", program.0, location));
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        self.record(format!("bind_texture({}, {:?})", unit, texture.map(|t| t.0)));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.record(format!("bind_framebuffer({:?})", framebuffer.map(|f| f.0)));
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record(format!("set_viewport({}, {}, {}, {})", x, y, width, height));
    }

    fn clear_color(&mut self, _color: [f32; 4]) {}

    fn clear_depth(&mut self, _depth: f32) {}

    fn clear(&mut self, mask: ClearMask) {
        self.record(format!("clear({:?})", mask));
    }

    fn set_enabled(&mut self, state: RenderState, enabled: bool) {
        self.record(format!("set_enabled({:?}, {})", state, enabled));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(format!("depth_mask({})", write));
    }

    fn depth_func(&mut self, _func: DepthFunc) {}

    fn color_mask(&mut self, _mask: [bool; 4]) {}

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.record(format!("bind_vertex_array({:?})", vertex_array.map(|v| v.0)));
    }

    fn bind_vertex_buffers(&mut self, vertices: BufferId, indices: Option<BufferId>, _layout: &VertexLayout) {
        self.record(format!("bind_vertex_buffers({}, {:?})", vertices.0, indices.map(|i| i.0)));
    }

    fn finish(&mut self) {
        self.record("finish".to_string());
    }

    fn read_pixel(&mut self, _x: i32, _y: i32) -> [u8; 4] {
        self.record("read_pixel".to_string());
        [0; 4]
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
        attribute_locations: &[(&str, u32)],
    ) -> ApiResult<(ProgramId, ProgramReflection)> {
        if vertex_source.contains("#error") || fragment_source.contains("#error") {
            return Err("link failed".to_string());
        }
        let id = self.next();
        self.record(format!("create_program({})", id));
        Ok((ProgramId(id), reflect([vertex_source, fragment_source], attribute_locations)))
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.record(format!("delete_program({})", program.0));
    }

    fn create_texture(&mut self, desc: &TextureDesc, _pixels: Option<&[u8]>) -> ApiResult<TextureId> {
        let id = self.next();
        self.record(format!("create_texture({}, {}x{})", id, desc.width, desc.height));
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.record(format!("delete_texture({})", texture.0));
    }

    fn create_framebuffer(&mut self, _color: TextureId, _depth: Option<TextureId>) -> ApiResult<FramebufferId> {
        let id = self.next();
        self.record(format!("create_framebuffer({})", id));
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.record(format!("delete_framebuffer({})", framebuffer.0));
    }

    fn create_buffer(&mut self, _target: BufferTarget, _data: &[u8]) -> ApiResult<BufferId> {
        Ok(BufferId(self.next()))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.record(format!("delete_buffer({})", buffer.0));
    }

    fn create_vertex_array(
        &mut self,
        _vertices: BufferId,
        _indices: Option<BufferId>,
        _layout: &VertexLayout,
    ) -> ApiResult<VertexArrayId> {
        Ok(VertexArrayId(self.next()))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.record(format!("delete_vertex_array({})", vertex_array.0));
    }
}

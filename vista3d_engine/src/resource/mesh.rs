/// Cached mesh resource: vertex buffer, optional index buffer and, when the
/// context supports them, a vertex array object capturing the layout.
///
/// Vertex data is interleaved `f32`. Attribute locations are fixed for the
/// whole engine (see `BUILTIN_ATTRIBUTES`) and bound at program link time.

use bytemuck::cast_slice;
use crate::error::{Error, Result};
use crate::graphics::{
    BufferId, BufferTarget, Capabilities, GraphicsContext, IndexType, PrimitiveMode,
    VertexArrayId, VertexAttribute, VertexLayout,
};
use crate::resource::resource_cache::{Resource, ResourceHandle};

/// Handle to a mesh in the resource manager
pub type MeshHandle = ResourceHandle<Mesh>;

// ===== BUILTIN ATTRIBUTES =====

pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_TEXCOORD: u32 = 4;
pub const ATTRIB_COLOR: u32 = 5;

/// Attribute names and the locations they are bound to in every program
pub const BUILTIN_ATTRIBUTES: &[(&str, u32)] = &[
    ("m_aPosition", ATTRIB_POSITION),
    ("m_aNormal0", ATTRIB_NORMAL),
    ("m_aTexCoord", ATTRIB_TEXCOORD),
    ("m_aColor", ATTRIB_COLOR),
];

/// Interleaved layout: position (3) followed by the enabled optional attributes
/// in the order normal (3), texcoord (2), color (4)
pub fn builtin_layout(normal: bool, texcoord: bool, color: bool) -> VertexLayout {
    let mut attributes = vec![VertexAttribute { location: ATTRIB_POSITION, components: 3, offset: 0 }];
    let mut offset = 12;
    for (enabled, location, components) in [
        (normal, ATTRIB_NORMAL, 3),
        (texcoord, ATTRIB_TEXCOORD, 2),
        (color, ATTRIB_COLOR, 4),
    ] {
        if enabled {
            attributes.push(VertexAttribute { location, components, offset });
            offset += components * 4;
        }
    }
    VertexLayout { stride: offset, attributes }
}

// ===== MESH DATA =====

/// Index data of a mesh
#[derive(Debug, Clone, PartialEq)]
pub enum MeshIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl MeshIndices {
    pub fn len(&self) -> usize {
        match self {
            MeshIndices::U16(v) => v.len(),
            MeshIndices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            MeshIndices::U16(_) => IndexType::U16,
            MeshIndices::U32(_) => IndexType::U32,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            MeshIndices::U16(v) => cast_slice(v),
            MeshIndices::U32(v) => cast_slice(v),
        }
    }
}

/// CPU-side mesh description, also the payload of asynchronous mesh loads
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub mode: PrimitiveMode,
    pub layout: VertexLayout,
    pub vertices: Vec<f32>,
    pub indices: Option<MeshIndices>,
}

impl MeshData {
    /// Number of vertices described by `vertices` and `layout`
    pub fn vertex_count(&self) -> u32 {
        let floats_per_vertex = (self.layout.stride / 4).max(1) as usize;
        (self.vertices.len() / floats_per_vertex) as u32
    }

    /// GPU memory used by vertex and index data
    pub fn byte_size(&self) -> u64 {
        let index_bytes = self.indices.as_ref().map_or(0, |i| i.as_bytes().len());
        (self.vertices.len() * 4 + index_bytes) as u64
    }

    /// Textured unit quad in the XY plane, [-1, 1] with texcoords [0, 1]
    pub fn quad() -> Self {
        Self {
            mode: PrimitiveMode::Triangles,
            layout: builtin_layout(false, true, false),
            vertices: vec![
                -1.0, -1.0, 0.0, 0.0, 0.0,
                 1.0, -1.0, 0.0, 1.0, 0.0,
                 1.0,  1.0, 0.0, 1.0, 1.0,
                -1.0,  1.0, 0.0, 0.0, 1.0,
            ],
            indices: Some(MeshIndices::U16(vec![0, 1, 2, 2, 3, 0])),
        }
    }

    /// Position-only quad, used for full-screen passes
    pub fn solid_quad() -> Self {
        Self {
            mode: PrimitiveMode::Triangles,
            layout: builtin_layout(false, false, false),
            vertices: vec![
                -1.0, -1.0, 0.0,
                 1.0, -1.0, 0.0,
                 1.0,  1.0, 0.0,
                -1.0,  1.0, 0.0,
            ],
            indices: Some(MeshIndices::U16(vec![0, 1, 2, 2, 3, 0])),
        }
    }

    /// Single point at the origin with a +Z normal and transparent color
    pub fn point() -> Self {
        Self {
            mode: PrimitiveMode::Points,
            layout: builtin_layout(true, false, true),
            vertices: vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            indices: Some(MeshIndices::U16(vec![0])),
        }
    }

    /// Edges of the [-1, 1] cube
    pub fn wired_cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,
            -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,
        ];
        Self {
            mode: PrimitiveMode::Lines,
            layout: builtin_layout(false, false, false),
            vertices,
            indices: Some(MeshIndices::U16(vec![
                0, 1, 1, 2, 2, 3, 3, 0,
                0, 4, 1, 5, 2, 6, 3, 7,
                4, 5, 5, 6, 6, 7, 7, 4,
            ])),
        }
    }
}

// ===== MESH =====

#[derive(Debug)]
pub struct Mesh {
    mode: PrimitiveMode,
    layout: VertexLayout,
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<BufferId>,
    vertex_array: Option<VertexArrayId>,
    index_type: Option<IndexType>,
    count: u32,
    bytes: u64,
}

impl Mesh {
    /// Upload a mesh
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` for 32-bit indices on a context
    /// without the `UINT_INDEX` capability, or the backend error on upload
    /// failure. No GPU object is leaked on failure.
    pub fn create(ctx: &mut GraphicsContext, data: &MeshData) -> Result<Self> {
        let mut mesh = Self::pending();
        mesh.upload(ctx, data)?;
        Ok(mesh)
    }

    /// Not-ready placeholder, completed by a later upload
    pub fn pending() -> Self {
        Self {
            mode: PrimitiveMode::Triangles,
            layout: VertexLayout { stride: 0, attributes: Vec::new() },
            vertex_buffer: None,
            index_buffer: None,
            vertex_array: None,
            index_type: None,
            count: 0,
            bytes: 0,
        }
    }

    fn upload(&mut self, ctx: &mut GraphicsContext, data: &MeshData) -> Result<()> {
        if let Some(MeshIndices::U32(_)) = data.indices {
            if !ctx.has(Capabilities::UINT_INDEX) {
                return Err(Error::InvalidOperation("32-bit indices not supported".to_string()));
            }
        }

        let vertex_buffer = ctx.create_buffer(BufferTarget::Vertex, cast_slice(&data.vertices))?;
        let index_buffer = match &data.indices {
            Some(indices) => match ctx.create_buffer(BufferTarget::Index, indices.as_bytes()) {
                Ok(buffer) => Some(buffer),
                Err(err) => {
                    ctx.delete_buffer(vertex_buffer);
                    return Err(err);
                }
            },
            None => None,
        };

        let vertex_array = if ctx.has(Capabilities::VERTEX_ARRAY_OBJECT) {
            match ctx.create_vertex_array(vertex_buffer, index_buffer, &data.layout) {
                Ok(vao) => Some(vao),
                Err(err) => {
                    ctx.delete_buffer(vertex_buffer);
                    if let Some(buffer) = index_buffer {
                        ctx.delete_buffer(buffer);
                    }
                    return Err(err);
                }
            }
        } else {
            None
        };

        self.mode = data.mode;
        self.layout = data.layout.clone();
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = index_buffer;
        self.vertex_array = vertex_array;
        self.index_type = data.indices.as_ref().map(MeshIndices::index_type);
        self.count = match &data.indices {
            Some(indices) => indices.len() as u32,
            None => data.vertex_count(),
        };
        self.bytes = data.byte_size();
        Ok(())
    }

    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    /// Number of indices (or vertices for non-indexed meshes)
    pub fn count(&self) -> u32 {
        self.count
    }

    /// GPU memory used by vertex and index buffers
    pub fn byte_size(&self) -> u64 {
        self.bytes
    }

    pub fn uses_vertex_array(&self) -> bool {
        self.vertex_array.is_some()
    }

    /// Bind vertex input state; false when not ready
    pub fn bind(&self, ctx: &mut GraphicsContext) -> bool {
        let Some(vertex_buffer) = self.vertex_buffer else {
            return false;
        };
        match self.vertex_array {
            Some(vao) => ctx.bind_vertex_array(Some(vao)),
            None => ctx.bind_vertex_buffers(vertex_buffer, self.index_buffer, &self.layout),
        }
        true
    }

    pub fn unbind(&self, ctx: &mut GraphicsContext) {
        if self.vertex_array.is_some() {
            ctx.bind_vertex_array(None);
        }
    }

    /// Issue the draw call for the whole mesh; `bind` must precede it
    pub fn draw(&self, ctx: &mut GraphicsContext) {
        if !self.is_ready() {
            return;
        }
        match self.index_type {
            Some(index_type) => ctx.draw_elements(self.mode, self.count, index_type, 0),
            None => ctx.draw_arrays(self.mode, 0, self.count),
        }
    }
}

impl Resource for Mesh {
    type Payload = MeshData;

    fn is_ready(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    fn complete(&mut self, ctx: &mut GraphicsContext, payload: MeshData) -> Result<()> {
        self.upload(ctx, &payload)
    }

    fn release(&mut self, ctx: &mut GraphicsContext) {
        if let Some(vao) = self.vertex_array.take() {
            ctx.delete_vertex_array(vao);
        }
        if let Some(buffer) = self.index_buffer.take() {
            ctx.delete_buffer(buffer);
        }
        if let Some(buffer) = self.vertex_buffer.take() {
            ctx.delete_buffer(buffer);
        }
        self.count = 0;
        self.bytes = 0;
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;

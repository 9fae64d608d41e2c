//! Device capabilities consumed by the bucket core
//!
//! Buckets never talk to a graphics API directly. They allocate and fill
//! uniform sets through [`RenderDevice`] and record draws through
//! [`CommandEncoder`]. Handles are plain ids so that backends can map them
//! onto whatever native objects they manage.

/// Opaque GPU buffer id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u64);

/// Opaque texture id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u64);

/// Opaque sampler id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerId(pub u64);

/// Descriptor layout id a uniform set is allocated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutId(pub u64);

/// A uniform-binding set.
///
/// Id `0` is the empty sentinel returned when allocation is not possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniformSet(pub u64);

impl UniformSet {
    /// The "nothing allocated" sentinel
    pub const EMPTY: Self = Self(0);

    /// Whether this is the empty sentinel
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// Vertex buffer plus its vertex count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBuffer {
    /// Buffer holding the vertices
    pub buffer: BufferId,
    /// Number of vertices
    pub count: u32,
}

impl VertexBuffer {
    /// Wrap a buffer id with its vertex count
    pub fn new(buffer: BufferId, count: u32) -> Self {
        Self { buffer, count }
    }
}

/// 32-bit index buffer plus its index count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBuffer {
    /// Buffer holding the indices
    pub buffer: BufferId,
    /// Number of indices
    pub count: u32,
}

impl IndexBuffer {
    /// Wrap a buffer id with its index count
    pub fn new(buffer: BufferId, count: u32) -> Self {
        Self { buffer, count }
    }
}

/// A shader pipeline reference together with the layout its sets use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pipeline {
    /// Backend pipeline id
    pub id: u64,
    /// Layout for uniform sets bound with this pipeline
    pub layout: LayoutId,
}

impl Pipeline {
    /// Create a pipeline reference
    pub fn new(id: u64, layout: LayoutId) -> Self {
        Self { id, layout }
    }
}

/// A resource written into one binding slot of a uniform set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Sampled texture using the layout's default sampler
    Texture(TextureId),
    /// Texture with an explicit sampler
    TextureSampler(TextureId, SamplerId),
    /// Uniform buffer range, offset and size in bytes
    Buffer {
        /// Source buffer
        buffer: BufferId,
        /// Byte offset of the range
        offset: u64,
        /// Byte size of the range
        size: u64,
    },
}

impl Binding {
    /// Bind a whole buffer of `size` bytes
    pub fn whole_buffer(buffer: BufferId, size: u64) -> Self {
        Self::Buffer { buffer, offset: 0, size }
    }
}

/// Resource side of the device: uniform sets and uniform buffers.
///
/// Methods take `&self`; buckets hold the device behind an `Rc` the same way
/// native wrappers hold a cloned device handle.
pub trait RenderDevice {
    /// Allocate a uniform set for `layout`, or [`UniformSet::EMPTY`]
    fn uniforms(&self, layout: LayoutId) -> UniformSet;

    /// Return a set to the device. Empty sets are ignored.
    fn release_uniforms(&self, set: UniformSet);

    /// Write `resource` into `slot` of `set`
    fn bind(&self, set: UniformSet, slot: u32, resource: Binding);

    /// Create a host-visible uniform buffer of `size` bytes
    fn create_uniform_buffer(&self, size: u64) -> BufferId;

    /// Copy `data` into `buffer` at byte `offset`
    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]);
}

/// Command side of the device: one render pass being recorded.
pub trait CommandEncoder {
    /// Bind `set` for subsequent draws with `pipeline`
    fn set_uniforms(&mut self, pipeline: &Pipeline, set: UniformSet);

    /// Upload a push-constant block for subsequent draws with `pipeline`
    fn push_constants(&mut self, pipeline: &Pipeline, data: &[u8]);

    /// Indexed draw
    fn draw_indexed(&mut self, vertices: &VertexBuffer, indices: &IndexBuffer);

    /// Non-indexed draw
    fn draw(&mut self, vertices: &VertexBuffer);
}

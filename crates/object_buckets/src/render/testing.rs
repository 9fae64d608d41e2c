//! Recording device and encoder for unit tests

use std::cell::{Cell, RefCell};

use crate::render::device::{
    Binding, BufferId, CommandEncoder, IndexBuffer, LayoutId, Pipeline, RenderDevice, UniformSet,
    VertexBuffer,
};

/// Calls seen by [`MockDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Uniforms(LayoutId),
    ReleaseUniforms(UniformSet),
    Bind { set: UniformSet, slot: u32, resource: Binding },
    CreateBuffer(u64),
    WriteBuffer { buffer: BufferId, offset: u64, data: Vec<u8> },
}

#[derive(Debug, Default)]
pub struct MockDevice {
    next_id: Cell<u64>,
    calls: RefCell<Vec<DeviceCall>>,
    /// When set, `uniforms` returns the empty sentinel
    pub exhausted: Cell<bool>,
    /// Number of upcoming `uniforms` calls that return the empty sentinel
    pub failing_uniforms: Cell<usize>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }
}

impl RenderDevice for MockDevice {
    fn uniforms(&self, layout: LayoutId) -> UniformSet {
        self.calls.borrow_mut().push(DeviceCall::Uniforms(layout));
        if self.exhausted.get() {
            return UniformSet::EMPTY;
        }
        let failing = self.failing_uniforms.get();
        if failing > 0 {
            self.failing_uniforms.set(failing - 1);
            return UniformSet::EMPTY;
        }
        UniformSet(self.next())
    }

    fn release_uniforms(&self, set: UniformSet) {
        self.calls.borrow_mut().push(DeviceCall::ReleaseUniforms(set));
    }

    fn bind(&self, set: UniformSet, slot: u32, resource: Binding) {
        self.calls.borrow_mut().push(DeviceCall::Bind { set, slot, resource });
    }

    fn create_uniform_buffer(&self, size: u64) -> BufferId {
        self.calls.borrow_mut().push(DeviceCall::CreateBuffer(size));
        BufferId(1000 + self.next())
    }

    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        self.calls.borrow_mut().push(DeviceCall::WriteBuffer { buffer, offset, data: data.to_vec() });
    }
}

/// Calls seen by [`MockEncoder`]
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderCall {
    SetUniforms { pipeline: u64, set: UniformSet },
    Push { pipeline: u64, data: Vec<u8> },
    DrawIndexed { vertices: VertexBuffer, indices: IndexBuffer },
    Draw { vertices: VertexBuffer },
}

#[derive(Debug, Default)]
pub struct MockEncoder {
    pub calls: Vec<EncoderCall>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, EncoderCall::DrawIndexed { .. } | EncoderCall::Draw { .. }))
            .count()
    }

    pub fn uniform_binds(&self) -> Vec<UniformSet> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EncoderCall::SetUniforms { set, .. } => Some(*set),
                _ => None,
            })
            .collect()
    }

    /// Push blocks decoded back into their typed form
    pub fn push_blocks(&self) -> Vec<crate::render::push_block::PushBlock> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EncoderCall::Push { data, .. } => Some(bytemuck::pod_read_unaligned(data)),
                _ => None,
            })
            .collect()
    }
}

impl CommandEncoder for MockEncoder {
    fn set_uniforms(&mut self, pipeline: &Pipeline, set: UniformSet) {
        self.calls.push(EncoderCall::SetUniforms { pipeline: pipeline.id, set });
    }

    fn push_constants(&mut self, pipeline: &Pipeline, data: &[u8]) {
        self.calls.push(EncoderCall::Push { pipeline: pipeline.id, data: data.to_vec() });
    }

    fn draw_indexed(&mut self, vertices: &VertexBuffer, indices: &IndexBuffer) {
        self.calls.push(EncoderCall::DrawIndexed { vertices: *vertices, indices: *indices });
    }

    fn draw(&mut self, vertices: &VertexBuffer) {
        self.calls.push(EncoderCall::Draw { vertices: *vertices });
    }
}

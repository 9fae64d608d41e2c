//! Command buffer recording for bucket draws

use ash::vk;

use super::device::{PipelineEntry, VulkanDevice};
use crate::render::device::{CommandEncoder, IndexBuffer, Pipeline, UniformSet, VertexBuffer};

/// Stages that read the push block
const PUSH_STAGES: vk::ShaderStageFlags =
    vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());

/// Records bucket draws into a command buffer inside an active render pass
pub struct VulkanEncoder<'a> {
    device: &'a VulkanDevice,
    command_buffer: vk::CommandBuffer,
    bound_pipeline: Option<u64>,
}

impl<'a> VulkanEncoder<'a> {
    /// Wrap a command buffer that is recording
    pub fn new(device: &'a VulkanDevice, command_buffer: vk::CommandBuffer) -> Self {
        Self { device, command_buffer, bound_pipeline: None }
    }

    /// Bind `pipeline` unless it is already bound
    fn use_pipeline(&mut self, pipeline: &Pipeline) -> Option<PipelineEntry> {
        let entry = match self.device.pipeline(pipeline) {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("Cannot record with pipeline {}: {}", pipeline.id, e);
                return None;
            }
        };

        if self.bound_pipeline != Some(pipeline.id) {
            unsafe {
                self.device.device().cmd_bind_pipeline(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    entry.pipeline,
                );
            }
            self.bound_pipeline = Some(pipeline.id);
        }
        Some(entry)
    }

    fn bind_vertices(&self, vertices: &VertexBuffer) -> bool {
        match self.device.buffer(vertices.buffer) {
            Ok(buffer) => {
                unsafe {
                    self.device.device().cmd_bind_vertex_buffers(self.command_buffer, 0, &[buffer], &[0]);
                }
                true
            }
            Err(e) => {
                log::error!("Missing vertex buffer: {e}");
                false
            }
        }
    }
}

impl CommandEncoder for VulkanEncoder<'_> {
    fn set_uniforms(&mut self, pipeline: &Pipeline, set: UniformSet) {
        let Some(entry) = self.use_pipeline(pipeline) else {
            return;
        };
        match self.device.descriptor_set(set) {
            Ok(vk_set) => unsafe {
                self.device.device().cmd_bind_descriptor_sets(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    entry.layout,
                    0,
                    &[vk_set],
                    &[],
                );
            },
            Err(e) => log::error!("Cannot bind uniform set {}: {}", set.0, e),
        }
    }

    fn push_constants(&mut self, pipeline: &Pipeline, data: &[u8]) {
        let Some(entry) = self.use_pipeline(pipeline) else {
            return;
        };
        unsafe {
            self.device.device().cmd_push_constants(self.command_buffer, entry.layout, PUSH_STAGES, 0, data);
        }
    }

    fn draw_indexed(&mut self, vertices: &VertexBuffer, indices: &IndexBuffer) {
        if !self.bind_vertices(vertices) {
            return;
        }
        let index_buffer = match self.device.buffer(indices.buffer) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::error!("Missing index buffer: {e}");
                return;
            }
        };

        let device = self.device.device();
        unsafe {
            device.cmd_bind_index_buffer(self.command_buffer, index_buffer, 0, vk::IndexType::UINT32);
            device.cmd_draw_indexed(self.command_buffer, indices.count, 1, 0, 0, 0);
        }
    }

    fn draw(&mut self, vertices: &VertexBuffer) {
        if !self.bind_vertices(vertices) {
            return;
        }
        unsafe {
            self.device.device().cmd_draw(self.command_buffer, vertices.count, 1, 0, 0);
        }
    }
}

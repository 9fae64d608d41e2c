//! Handle registry implementing [`RenderDevice`] on top of `ash`

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use ash::{vk, Device, Instance};

use super::buffer::UniformBuffer;
use super::descriptor_set::{DescriptorPool, DescriptorSetWriter};
use super::{VulkanError, VulkanResult};
use crate::render::device::{
    Binding, BufferId, LayoutId, Pipeline, RenderDevice, SamplerId, TextureId, UniformSet,
};

/// Image view plus the sampler and layout it is read with
#[derive(Debug, Clone, Copy)]
struct TextureEntry {
    view: vk::ImageView,
    sampler: vk::Sampler,
    layout: vk::ImageLayout,
}

/// Pipeline handles behind a [`Pipeline`] id
#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineEntry {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
}

enum BufferEntry {
    /// Created through [`RenderDevice::create_uniform_buffer`]
    Owned(UniformBuffer),
    /// Registered by the scene; lifetime managed elsewhere
    External(vk::Buffer),
}

impl BufferEntry {
    fn handle(&self) -> vk::Buffer {
        match self {
            Self::Owned(buffer) => buffer.handle(),
            Self::External(buffer) => *buffer,
        }
    }
}

/// Vulkan-backed [`RenderDevice`]
///
/// Every handle the buckets see is an opaque id into one of the registries
/// here. Failures are logged and reported through the empty sentinels the
/// device trait allows, never propagated into the buckets.
pub struct VulkanDevice {
    device: Device,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    pool: DescriptorPool,
    next_id: Cell<u64>,
    layouts: RefCell<HashMap<LayoutId, vk::DescriptorSetLayout>>,
    pipelines: RefCell<HashMap<u64, PipelineEntry>>,
    sets: RefCell<HashMap<UniformSet, vk::DescriptorSet>>,
    buffers: RefCell<HashMap<BufferId, BufferEntry>>,
    textures: RefCell<HashMap<TextureId, TextureEntry>>,
    samplers: RefCell<HashMap<SamplerId, vk::Sampler>>,
}

impl VulkanDevice {
    /// Wrap a logical device; `max_sets` bounds the descriptor pool
    pub fn new(
        instance: &Instance,
        physical_device: vk::PhysicalDevice,
        device: Device,
        max_sets: u32,
    ) -> VulkanResult<Self> {
        let memory_properties = unsafe { instance.get_physical_device_memory_properties(physical_device) };
        let pool = DescriptorPool::new(device.clone(), max_sets)?;

        Ok(Self {
            device,
            memory_properties,
            pool,
            next_id: Cell::new(0),
            layouts: RefCell::new(HashMap::new()),
            pipelines: RefCell::new(HashMap::new()),
            sets: RefCell::new(HashMap::new()),
            buffers: RefCell::new(HashMap::new()),
            textures: RefCell::new(HashMap::new()),
            samplers: RefCell::new(HashMap::new()),
        })
    }

    fn next(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    /// The wrapped logical device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Register a descriptor set layout owned by the caller
    pub fn register_layout(&self, layout: vk::DescriptorSetLayout) -> LayoutId {
        let id = LayoutId(self.next());
        self.layouts.borrow_mut().insert(id, layout);
        id
    }

    /// Register a graphics pipeline whose first set uses `set_layout`
    pub fn register_pipeline(
        &self,
        pipeline: vk::Pipeline,
        layout: vk::PipelineLayout,
        set_layout: LayoutId,
    ) -> Pipeline {
        let id = self.next();
        self.pipelines.borrow_mut().insert(id, PipelineEntry { pipeline, layout });
        Pipeline::new(id, set_layout)
    }

    /// Register a sampled image
    pub fn register_texture(
        &self,
        view: vk::ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
    ) -> TextureId {
        let id = TextureId(self.next());
        self.textures.borrow_mut().insert(id, TextureEntry { view, sampler, layout });
        id
    }

    /// Register a sampler for explicit texture/sampler bindings
    pub fn register_sampler(&self, sampler: vk::Sampler) -> SamplerId {
        let id = SamplerId(self.next());
        self.samplers.borrow_mut().insert(id, sampler);
        id
    }

    /// Register a vertex, index or uniform buffer owned by the caller
    pub fn register_buffer(&self, buffer: vk::Buffer) -> BufferId {
        let id = BufferId(self.next());
        self.buffers.borrow_mut().insert(id, BufferEntry::External(buffer));
        id
    }

    /// Vulkan buffer behind an id
    pub fn buffer(&self, id: BufferId) -> VulkanResult<vk::Buffer> {
        self.buffers
            .borrow()
            .get(&id)
            .map(BufferEntry::handle)
            .ok_or(VulkanError::ResourceNotFound { id: id.0 })
    }

    /// Vulkan descriptor set behind a uniform set
    pub fn descriptor_set(&self, set: UniformSet) -> VulkanResult<vk::DescriptorSet> {
        self.sets.borrow().get(&set).copied().ok_or(VulkanError::ResourceNotFound { id: set.0 })
    }

    pub(crate) fn pipeline(&self, pipeline: &Pipeline) -> VulkanResult<PipelineEntry> {
        self.pipelines
            .borrow()
            .get(&pipeline.id)
            .copied()
            .ok_or(VulkanError::ResourceNotFound { id: pipeline.id })
    }

    fn try_uniforms(&self, layout: LayoutId) -> VulkanResult<UniformSet> {
        let vk_layout =
            *self.layouts.borrow().get(&layout).ok_or(VulkanError::ResourceNotFound { id: layout.0 })?;
        let set = self.pool.allocate(vk_layout)?;
        let id = UniformSet(self.next());
        self.sets.borrow_mut().insert(id, set);
        Ok(id)
    }

    fn try_bind(&self, set: UniformSet, slot: u32, resource: Binding) -> VulkanResult<()> {
        let vk_set = self.descriptor_set(set)?;
        let writer = DescriptorSetWriter::new();
        let writer = match resource {
            Binding::Texture(texture) => {
                let entry = self.texture(texture)?;
                writer.write_image(vk_set, slot, entry.view, entry.sampler, entry.layout)
            }
            Binding::TextureSampler(texture, sampler) => {
                let entry = self.texture(texture)?;
                let sampler = *self
                    .samplers
                    .borrow()
                    .get(&sampler)
                    .ok_or(VulkanError::ResourceNotFound { id: sampler.0 })?;
                writer.write_image(vk_set, slot, entry.view, sampler, entry.layout)
            }
            Binding::Buffer { buffer, offset, size } => {
                writer.write_buffer(vk_set, slot, self.buffer(buffer)?, offset, size)
            }
        };
        writer.update(&self.device);
        Ok(())
    }

    fn texture(&self, id: TextureId) -> VulkanResult<TextureEntry> {
        self.textures.borrow().get(&id).copied().ok_or(VulkanError::ResourceNotFound { id: id.0 })
    }

    fn try_create_uniform_buffer(&self, size: u64) -> VulkanResult<BufferId> {
        let buffer = UniformBuffer::new(self.device.clone(), &self.memory_properties, size)?;
        let id = BufferId(self.next());
        self.buffers.borrow_mut().insert(id, BufferEntry::Owned(buffer));
        Ok(id)
    }

    fn try_write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> VulkanResult<()> {
        match self.buffers.borrow().get(&id) {
            Some(BufferEntry::Owned(buffer)) => buffer.write(offset, data),
            Some(BufferEntry::External(_)) => Err(VulkanError::InvalidOperation {
                reason: format!("buffer {} is not host-mapped", id.0),
            }),
            None => Err(VulkanError::ResourceNotFound { id: id.0 }),
        }
    }
}

impl RenderDevice for VulkanDevice {
    fn uniforms(&self, layout: LayoutId) -> UniformSet {
        self.try_uniforms(layout).unwrap_or_else(|e| {
            log::error!("Failed to allocate uniform set for layout {}: {}", layout.0, e);
            UniformSet::EMPTY
        })
    }

    fn release_uniforms(&self, set: UniformSet) {
        let Some(vk_set) = self.sets.borrow_mut().remove(&set) else {
            log::warn!("Released unknown uniform set {}", set.0);
            return;
        };
        if let Err(e) = self.pool.free(&[vk_set]) {
            log::error!("Failed to free uniform set {}: {}", set.0, e);
        }
    }

    fn bind(&self, set: UniformSet, slot: u32, resource: Binding) {
        if let Err(e) = self.try_bind(set, slot, resource) {
            log::error!("Failed to bind slot {} of uniform set {}: {}", slot, set.0, e);
        }
    }

    fn create_uniform_buffer(&self, size: u64) -> BufferId {
        self.try_create_uniform_buffer(size).unwrap_or_else(|e| {
            log::error!("Failed to create {size}-byte uniform buffer: {e}");
            BufferId::default()
        })
    }

    fn write_buffer(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        if let Err(e) = self.try_write_buffer(buffer, offset, data) {
            log::error!("Failed to write buffer {}: {}", buffer.0, e);
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        let sets: Vec<vk::DescriptorSet> = self.sets.get_mut().drain().map(|(_, set)| set).collect();
        if !sets.is_empty() {
            log::debug!("Freeing {} uniform sets still allocated", sets.len());
            if let Err(e) = self.pool.free(&sets) {
                log::error!("Failed to free uniform sets: {e}");
            }
        }
        // Owned uniform buffers unmap and free themselves
        self.buffers.get_mut().clear();
    }
}

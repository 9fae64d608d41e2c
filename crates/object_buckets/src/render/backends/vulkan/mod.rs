//! Vulkan backend
//!
//! Maps the handle types of [`crate::render::device`] onto Vulkan objects.
//! The scene registers externally created layouts, pipelines, images and
//! geometry buffers with a [`VulkanDevice`]; buckets then allocate descriptor
//! sets and uniform buffers through it and record draws with a
//! [`VulkanEncoder`].

#![allow(unsafe_code)]

use ash::vk;
use thiserror::Error;

/// Descriptor layouts, pools and writes
pub mod descriptor_set;

/// Host-visible uniform buffers
pub mod buffer;

/// [`RenderDevice`](crate::render::device::RenderDevice) implementation
pub mod device;

/// [`CommandEncoder`](crate::render::device::CommandEncoder) implementation
pub mod encoder;

pub use buffer::UniformBuffer;
pub use descriptor_set::{
    DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter, ObjectLayouts,
};
pub use device::VulkanDevice;
pub use encoder::VulkanEncoder;

/// Vulkan backend errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// The descriptor pool has no room for another set
    #[error("Descriptor pool exhausted ({max_sets} sets)")]
    PoolExhausted {
        /// Capacity the pool was created with
        max_sets: u32,
    },

    /// Handle was never registered with the device
    #[error("Resource not found: {id}")]
    ResourceNotFound {
        /// The unregistered handle value
        id: u64,
    },

    /// No memory type satisfies the requested properties
    #[error("No suitable memory type for {properties:?}")]
    NoMemoryType {
        /// Requested memory properties
        properties: vk::MemoryPropertyFlags,
    },

    /// Invalid operation attempted
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of why the operation is invalid
        reason: String,
    },
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

/// Map pool-allocation failures onto [`VulkanError::PoolExhausted`]
pub(crate) fn pool_error(result: vk::Result, max_sets: u32) -> VulkanError {
    match result {
        vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL => {
            VulkanError::PoolExhausted { max_sets }
        }
        other => VulkanError::Api(other),
    }
}

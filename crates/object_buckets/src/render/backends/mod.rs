//! Backend implementations of [`RenderDevice`](crate::render::device::RenderDevice)
//! and [`CommandEncoder`](crate::render::device::CommandEncoder)
//!
//! Currently only Vulkan is supported.

/// Vulkan rendering backend implementation
pub mod vulkan;

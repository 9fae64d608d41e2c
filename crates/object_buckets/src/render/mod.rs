//! Rendering core
//!
//! ```text
//! ObjectsBucket ──┬── ObjectSlot[] (free-list arena)
//!                 │       ├── Geometry (static / skinned / morph)
//!                 │       ├── Bounds + LightCache
//!                 │       └── DescriptorSetPair (when not shared)
//!                 ├── DescriptorSetPair (shared)
//!                 └── material uniform buffers [frame]
//!                         ↓
//!        RenderDevice / CommandEncoder (backends::vulkan)
//! ```

pub mod backends;
pub mod bounds;
pub mod bucket;
pub mod culling;
pub mod descriptors;
pub mod device;
pub mod lights;
pub mod material;
pub mod pipelines;
pub mod push_block;
pub mod scene;
pub mod skinning;

#[cfg(test)]
pub(crate) mod testing;

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Number of shadow cascades, each rendered with its own descriptor set
pub const SHADOW_LAYERS: usize = 2;

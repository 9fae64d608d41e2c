//! # Object Buckets
//!
//! Groups renderable objects by material and shader variant ("buckets") and
//! drives them through the main, light-accumulation and shadow passes.
//!
//! ## Features
//!
//! - **Frames in flight**: per-frame descriptor sets and uniform buffers
//! - **Shared or per-object descriptors**: chosen per bucket at creation
//! - **Two-level culling**: whole-bucket bounds first, then per object
//! - **Light batching**: fixed-size push blocks, extra lights in chunks
//! - **Vulkan backend**: `ash` implementation of the device capabilities
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use object_buckets::prelude::*;
//! # fn frame(bucket: &mut ObjectsBucket, frustum: &Frustum, encoder: &mut dyn CommandEncoder) {
//! let frame_index = 0;
//! bucket.visibility_pass(frustum);
//! bucket.per_frame_update(frame_index, 120);
//! bucket.draw(encoder, frame_index);
//! bucket.draw_light(encoder, frame_index);
//! for layer in 0..SHADOW_LAYERS {
//!     bucket.draw_shadow(encoder, frame_index, layer);
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for bucket users
pub mod prelude {
    pub use crate::{
        config::{BucketConfig, Config, ConfigError},
        foundation::math::{Mat4, Vec3},
        render::{
            bounds::Bounds,
            bucket::{BucketContext, Geometry, ObjectId, ObjectsBucket, ShaderVariant},
            culling::{CullTest, Frustum},
            device::{
                Binding, BufferId, CommandEncoder, IndexBuffer, LayoutId, Pipeline, RenderDevice,
                SamplerId, TextureId, UniformSet, VertexBuffer,
            },
            lights::{LightId, LightList, PointLight, SceneLights},
            material::{AlphaMode, Material},
            pipelines::PipelineLibrary,
            scene::SceneGlobals,
            skinning::{AnimationStorage, Pose},
            MAX_FRAMES_IN_FLIGHT, SHADOW_LAYERS,
        },
    };
}

//! Scene-wide GPU resources every bucket binds

use crate::render::device::{BufferId, SamplerId, TextureId};
use crate::render::{MAX_FRAMES_IN_FLIGHT, SHADOW_LAYERS};

/// Resources shared by all buckets of a scene.
///
/// Replaced as a whole when one of them changes (for example when the shadow
/// map is resized); see `ObjectsBucket::setup_ubo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneGlobals {
    /// Global per-frame uniform buffer for every frame in flight and shadow layer.
    /// Layer 0 doubles as the main-pass camera.
    pub frame_uniforms: [[BufferId; SHADOW_LAYERS]; MAX_FRAMES_IN_FLIGHT],
    /// Size in bytes of each global uniform buffer
    pub frame_uniform_size: u64,
    /// Shadow map sampled by the main pass
    pub shadow_map: TextureId,
    /// Comparison sampler for the shadow map
    pub shadow_sampler: SamplerId,
    /// Texture substituted for the shadow map in immediate draws
    pub fallback_texture: TextureId,
    /// Nearest-filter sampler used with the fallback texture
    pub nearest_sampler: SamplerId,
}

impl SceneGlobals {
    /// Global uniform buffer for a frame and shadow layer
    pub fn frame_uniform(&self, frame: usize, layer: usize) -> BufferId {
        self.frame_uniforms[frame][layer]
    }
}

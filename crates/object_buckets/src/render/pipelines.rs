//! Pipeline catalogue and the alpha-mode × variant selection table

use crate::render::device::Pipeline;
use crate::render::material::AlphaMode;

/// All object pipelines a scene provides
#[derive(Debug, Clone)]
pub struct PipelineLibrary {
    /// Static opaque/multiply main pass
    pub object: Pipeline,
    /// Static alpha-test main pass
    pub object_at: Pipeline,
    /// Static alpha-blended main pass
    pub object_alpha: Pipeline,
    /// Static additive main pass
    pub object_additive: Pipeline,
    /// Static light accumulation
    pub object_light: Pipeline,
    /// Static alpha-test light accumulation
    pub object_at_light: Pipeline,
    /// Static shadow pass
    pub object_shadow: Pipeline,
    /// Static alpha-test shadow pass (samples the texture)
    pub object_at_shadow: Pipeline,

    /// Skinned opaque/multiply main pass
    pub anim: Pipeline,
    /// Skinned alpha-test main pass
    pub anim_at: Pipeline,
    /// Skinned alpha-blended main pass
    pub anim_alpha: Pipeline,
    /// Skinned additive main pass
    pub anim_additive: Pipeline,
    /// Skinned light accumulation
    pub anim_light: Pipeline,
    /// Skinned alpha-test light accumulation
    pub anim_at_light: Pipeline,
    /// Skinned shadow pass
    pub anim_shadow: Pipeline,
    /// Skinned alpha-test shadow pass (samples the texture)
    pub anim_at_shadow: Pipeline,
}

/// Pipelines selected for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassPipelines {
    /// Main (forward) pass
    pub main: Option<Pipeline>,
    /// Light accumulation pass
    pub light: Option<Pipeline>,
    /// Shadow pass, rendered once per layer
    pub shadow: Option<Pipeline>,
    /// Whether the shadow pipeline samples the material texture
    pub texture_in_shadow: bool,
}

impl PipelineLibrary {
    /// Select pipelines for a material alpha mode.
    ///
    /// Additive materials are never lit nor shadowed. Transparent statics
    /// cast alpha-tested shadows but skip light accumulation.
    pub fn resolve(&self, alpha: AlphaMode, animated: bool) -> PassPipelines {
        let (main, light, shadow) = match (alpha, animated) {
            (AlphaMode::AlphaTest, true) => (Some(self.anim_at), Some(self.anim_at_light), Some(self.anim_at_shadow)),
            (AlphaMode::AlphaTest, false) => {
                (Some(self.object_at), Some(self.object_at_light), Some(self.object_at_shadow))
            }
            (AlphaMode::Transparent, true) => (Some(self.anim_alpha), None, None),
            // TODO: enable object_light here once lit transparent statics are confirmed to be wanted
            (AlphaMode::Transparent, false) => (Some(self.object_alpha), None, Some(self.object_at_shadow)),
            (AlphaMode::AdditiveLight, true) => (Some(self.anim_additive), None, None),
            (AlphaMode::AdditiveLight, false) => (Some(self.object_additive), None, None),
            (AlphaMode::Multiply | AlphaMode::Multiply2 | AlphaMode::Solid, true) => {
                (Some(self.anim), Some(self.anim_light), Some(self.anim_shadow))
            }
            (AlphaMode::Multiply | AlphaMode::Multiply2 | AlphaMode::Solid, false) => {
                (Some(self.object), Some(self.object_light), Some(self.object_shadow))
            }
            (AlphaMode::Invalid, _) => (None, None, None),
        };

        let texture_in_shadow =
            shadow.is_some() && (shadow == Some(self.object_at_shadow) || shadow == Some(self.anim_at_shadow));

        PassPipelines { main, light, shadow, texture_in_shadow }
    }
}

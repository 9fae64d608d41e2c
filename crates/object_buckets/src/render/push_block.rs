//! Per-draw push-constant block
//!
//! Carries the object transform and a fixed number of lights. Objects with
//! more lights than fit are drawn again by the light-accumulation pass,
//! one block of [`LIGHT_BLOCK`] lights per draw.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{mat4_to_cols, Mat4};
use crate::render::lights::{LightId, LightList};

/// Lights carried by one push block
pub const LIGHT_BLOCK: usize = 8;

/// One light slot; `range == 0` marks an unused slot
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct PushLight {
    /// World position
    pub position: [f32; 3],
    /// Influence radius
    pub range: f32,
    /// Linear RGB color
    pub color: [f32; 3],
    pub(crate) _padding: f32,
}

/// Push-constant block: transform + light chunk
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PushBlock {
    /// Object-to-world transform, column-major
    pub transform: [[f32; 4]; 4],
    /// Light chunk
    pub lights: [PushLight; LIGHT_BLOCK],
}

impl PushBlock {
    /// Block with a transform and no lights
    pub fn new(transform: &Mat4) -> Self {
        Self {
            transform: mat4_to_cols(transform),
            lights: [PushLight::default(); LIGHT_BLOCK],
        }
    }

    /// Fill the light slots from `ids`, taking at most [`LIGHT_BLOCK`].
    ///
    /// Remaining slots, and slots whose light no longer exists, get range 0.
    pub fn fill_lights(&mut self, ids: &[LightId], lights: &dyn LightList) {
        for (r, slot) in self.lights.iter_mut().enumerate() {
            *slot = ids
                .get(r)
                .and_then(|id| lights.light(*id))
                .map_or_else(PushLight::default, |l| PushLight {
                    position: l.position.into(),
                    range: l.range,
                    color: l.color.into(),
                    _padding: 0.0,
                });
        }
    }

    /// Raw bytes for the encoder
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

//! Object slots stored in a bucket

use crate::foundation::math::{Mat4, Vec3};
use crate::render::bounds::Bounds;
use crate::render::descriptors::DescriptorSetPair;
use crate::render::device::{CommandEncoder, IndexBuffer, VertexBuffer};
use crate::render::lights::{LightId, LightList, MAX_LIGHT};
use crate::render::MAX_FRAMES_IN_FLIGHT;

/// Geometry of one object; exactly one kind at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Geometry {
    /// Free slot
    #[default]
    None,
    /// Static vertices with indices
    Static {
        /// Vertex buffer
        vertices: VertexBuffer,
        /// Index buffer
        indices: IndexBuffer,
    },
    /// Skinned vertices with indices
    Skinned {
        /// Vertex buffer
        vertices: VertexBuffer,
        /// Index buffer
        indices: IndexBuffer,
    },
    /// CPU-deformed vertices, one buffer per frame in flight
    Morph([VertexBuffer; MAX_FRAMES_IN_FLIGHT]),
}

impl Geometry {
    /// Whether the slot holds no geometry
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the geometry is drawn with an index buffer
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Static { .. } | Self::Skinned { .. })
    }

    /// Whether the geometry is morph-animated
    pub fn is_morph(&self) -> bool {
        matches!(self, Self::Morph(_))
    }

    /// Record the draw call for this geometry kind
    pub(crate) fn issue(&self, encoder: &mut dyn CommandEncoder, frame: usize) {
        match self {
            Self::None => {}
            Self::Static { vertices, indices } | Self::Skinned { vertices, indices } => {
                encoder.draw_indexed(vertices, indices);
            }
            Self::Morph(frames) => encoder.draw(&frames[frame]),
        }
    }
}

/// Lights overlapping an object, keyed by the grid cell of its center
#[derive(Debug, Clone, Default)]
pub(crate) struct LightCache {
    key: Option<[i32; 3]>,
    ids: Vec<LightId>,
}

impl LightCache {
    pub(crate) fn ids(&self) -> &[LightId] {
        &self.ids
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn clear(&mut self) {
        self.key = None;
        self.ids.clear();
    }

    /// Re-query lights if the object entered a new cell, or always when `force`.
    /// Returns `true` when the light list was queried.
    pub(crate) fn refresh(
        &mut self,
        bounds: &Bounds,
        lights: &dyn LightList,
        cell_size: f32,
        max_lights: usize,
        force: bool,
    ) -> bool {
        let key = cell_key(&bounds.center, cell_size);
        if !force && self.key == Some(key) {
            return false;
        }
        self.key = Some(key);

        let mut found = [LightId::default(); MAX_LIGHT];
        let count = lights.query(bounds, &mut found[..max_lights.min(MAX_LIGHT)]);
        self.ids.clear();
        self.ids.extend_from_slice(&found[..count]);
        true
    }
}

/// Grid cell of a point; truncates toward zero
fn cell_key(p: &Vec3, cell_size: f32) -> [i32; 3] {
    [(p.x / cell_size) as i32, (p.y / cell_size) as i32, (p.z / cell_size) as i32]
}

/// One renderable instance
#[derive(Debug, Clone, Default)]
pub(crate) struct ObjectSlot {
    pub(crate) geometry: Geometry,
    pub(crate) bounds: Bounds,
    pub(crate) transform: Mat4,
    pub(crate) skeleton: Option<usize>,
    /// Tick at allocation; texture-frame animation runs relative to it
    pub(crate) alloc_tick: u64,
    pub(crate) lights: LightCache,
    /// Only allocated when the bucket does not share descriptors
    pub(crate) descriptors: DescriptorSetPair,
}

impl ObjectSlot {
    /// Reinitialize for a new allocation, keeping any allocated descriptors
    pub(crate) fn reset(&mut self, geometry: Geometry, bounds: Bounds, tick: u64) {
        self.geometry = geometry;
        self.bounds = bounds;
        self.transform = Mat4::identity();
        self.skeleton = None;
        self.alloc_tick = tick;
        self.lights.clear();
    }
}

//! Point lights and the scene light list
//!
//! Objects cache the ids of the lights overlapping them; the light data
//! itself is read back through [`LightList::light`] each time a push block
//! is built, so moving or recoloring a light needs no cache refresh.

use std::cell::RefCell;

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::Vec3;
use crate::render::bounds::Bounds;

/// Maximum number of lights cached per object
pub const MAX_LIGHT: usize = 64;

new_key_type! {
    /// Stable handle to a light in a [`SceneLights`] registry
    pub struct LightId;
}

/// Point light as seen by the object shaders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Influence radius; zero disables the light
    pub range: f32,
}

impl PointLight {
    /// Create a point light
    pub fn new(position: Vec3, color: Vec3, range: f32) -> Self {
        Self { position, color, range }
    }
}

/// Scene-wide light query
pub trait LightList {
    /// Write ids of lights overlapping `bounds` into `out`, returning how many
    /// were written. Never writes past `out.len()`.
    fn query(&self, bounds: &Bounds, out: &mut [LightId]) -> usize;

    /// Current data for a light, `None` once it has been removed
    fn light(&self, id: LightId) -> Option<PointLight>;
}

/// Slot-map backed light registry with a linear overlap query
#[derive(Debug, Default)]
pub struct SceneLights {
    lights: RefCell<SlotMap<LightId, PointLight>>,
}

impl SceneLights {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a light
    pub fn add(&self, light: PointLight) -> LightId {
        self.lights.borrow_mut().insert(light)
    }

    /// Replace the data of an existing light. Returns `false` for stale ids.
    pub fn update(&self, id: LightId, light: PointLight) -> bool {
        match self.lights.borrow_mut().get_mut(id) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => false,
        }
    }

    /// Remove a light
    pub fn remove(&self, id: LightId) -> Option<PointLight> {
        self.lights.borrow_mut().remove(id)
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.lights.borrow().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.lights.borrow().is_empty()
    }
}

impl LightList for SceneLights {
    fn query(&self, bounds: &Bounds, out: &mut [LightId]) -> usize {
        let lights = self.lights.borrow();
        let mut count = 0;
        for (id, light) in lights.iter() {
            if count == out.len() {
                break;
            }
            if light.range > 0.0 && bounds.intersects_sphere(&light.position, light.range) {
                out[count] = id;
                count += 1;
            }
        }
        count
    }

    fn light(&self, id: LightId) -> Option<PointLight> {
        self.lights.borrow().get(id).copied()
    }
}

//! Per-frame descriptor set pairs
//!
//! A [`DescriptorSetPair`] holds, for every frame in flight, one uniform set
//! for the main/light pipelines and one per shadow layer for the shadow
//! pipeline. Each set carries a [`BindingMask`] of slots already written in
//! the current generation, so per-draw bindings that never change within a
//! frame (the skinning range) are written once rather than once per draw.
//!
//! The mask is cleared by [`DescriptorSetPair::invalidate`] whenever the
//! geometry, the frame-in-flight assignment or a scene-wide resource changes.

use bitflags::bitflags;

use crate::render::device::{Binding, LayoutId, RenderDevice, UniformSet};
use crate::render::{MAX_FRAMES_IN_FLIGHT, SHADOW_LAYERS};

/// Binding slot of the material texture
pub const SLOT_TEXTURE: u32 = 0;
/// Binding slot of the shadow map and its sampler
pub const SLOT_SHADOW_MAP: u32 = 1;
/// Binding slot of the scene-global per-frame uniform
pub const SLOT_SCENE: u32 = 2;
/// Binding slot of the skinning matrices
pub const SLOT_SKINNING: u32 = 3;
/// Binding slot of the material-animation uniform
pub const SLOT_MATERIAL: u32 = 4;

bitflags! {
    /// Set of binding slots already written into a uniform set
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingMask: u8 {
        /// [`SLOT_TEXTURE`]
        const TEXTURE = 1 << SLOT_TEXTURE;
        /// [`SLOT_SHADOW_MAP`]
        const SHADOW_MAP = 1 << SLOT_SHADOW_MAP;
        /// [`SLOT_SCENE`]
        const SCENE = 1 << SLOT_SCENE;
        /// [`SLOT_SKINNING`]
        const SKINNING = 1 << SLOT_SKINNING;
        /// [`SLOT_MATERIAL`]
        const MATERIAL = 1 << SLOT_MATERIAL;
    }
}

impl Default for BindingMask {
    fn default() -> Self {
        Self::empty()
    }
}

impl BindingMask {
    /// Mask for a single binding slot
    pub fn from_slot(slot: u32) -> Self {
        Self::from_bits_retain(1 << slot)
    }
}

/// Which set of a pair to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    /// Main/light set
    Main,
    /// Shadow set for a layer
    Shadow(usize),
}

/// Uniform sets for every frame in flight, plus per-layer shadow sets
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetPair {
    main: [UniformSet; MAX_FRAMES_IN_FLIGHT],
    main_bound: [BindingMask; MAX_FRAMES_IN_FLIGHT],
    shadow: [[UniformSet; SHADOW_LAYERS]; MAX_FRAMES_IN_FLIGHT],
    shadow_bound: [[BindingMask; SHADOW_LAYERS]; MAX_FRAMES_IN_FLIGHT],
    allocated: bool,
}

impl DescriptorSetPair {
    /// Pair with nothing allocated
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every requested set has been allocated
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Forget every written binding so the next use rebinds from scratch
    pub fn invalidate(&mut self) {
        self.main_bound = [BindingMask::empty(); MAX_FRAMES_IN_FLIGHT];
        self.shadow_bound = [[BindingMask::empty(); SHADOW_LAYERS]; MAX_FRAMES_IN_FLIGHT];
    }

    /// Allocate sets for the layouts that exist.
    ///
    /// No-op when already allocated. Returns `true` when new sets were
    /// created and still need their common bindings. Allocation is all or
    /// nothing: if the device hands back an empty set for any frame or
    /// layer, the sets obtained so far are returned to it.
    pub fn allocate(
        &mut self,
        device: &dyn RenderDevice,
        main_layout: Option<LayoutId>,
        shadow_layout: Option<LayoutId>,
    ) -> bool {
        if self.allocated {
            return false;
        }
        if main_layout.is_none() && shadow_layout.is_none() {
            log::debug!("No uniform sets allocated (bucket has no pipelines)");
            return false;
        }

        let mut incomplete = false;
        for frame in 0..MAX_FRAMES_IN_FLIGHT {
            if let Some(layout) = main_layout {
                self.main[frame] = device.uniforms(layout);
                incomplete |= self.main[frame].is_empty();
            }
            if let Some(layout) = shadow_layout {
                for layer in 0..SHADOW_LAYERS {
                    self.shadow[frame][layer] = device.uniforms(layout);
                    incomplete |= self.shadow[frame][layer].is_empty();
                }
            }
        }

        if incomplete {
            log::debug!("Device returned empty uniform sets, releasing the partial allocation");
            self.release(device);
            return false;
        }
        self.invalidate();
        self.allocated = true;
        true
    }

    /// Return every set to the device
    pub fn release(&mut self, device: &dyn RenderDevice) {
        for frame in 0..MAX_FRAMES_IN_FLIGHT {
            let main = std::mem::take(&mut self.main[frame]);
            let shadow = std::mem::take(&mut self.shadow[frame]);
            for set in std::iter::once(main).chain(shadow) {
                if !set.is_empty() {
                    device.release_uniforms(set);
                }
            }
        }
        self.invalidate();
        self.allocated = false;
    }

    /// The set for a frame
    pub fn set(&self, frame: usize, kind: SetKind) -> UniformSet {
        match kind {
            SetKind::Main => self.main[frame],
            SetKind::Shadow(layer) => self.shadow[frame][layer],
        }
    }

    /// Slots already written into a set
    pub fn bound(&self, frame: usize, kind: SetKind) -> BindingMask {
        match kind {
            SetKind::Main => self.main_bound[frame],
            SetKind::Shadow(layer) => self.shadow_bound[frame][layer],
        }
    }

    /// Write `resource` into `slot` unless this generation already did.
    ///
    /// Returns `true` when the device was called.
    pub fn bind_once(
        &mut self,
        device: &dyn RenderDevice,
        frame: usize,
        kind: SetKind,
        slot: u32,
        resource: Binding,
    ) -> bool {
        let (set, mask) = match kind {
            SetKind::Main => (self.main[frame], &mut self.main_bound[frame]),
            SetKind::Shadow(layer) => (self.shadow[frame][layer], &mut self.shadow_bound[frame][layer]),
        };
        if set.is_empty() {
            return false;
        }

        let flag = BindingMask::from_slot(slot);
        if mask.contains(flag) {
            return false;
        }
        mask.insert(flag);
        device.bind(set, slot, resource);
        true
    }
}

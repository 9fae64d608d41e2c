//! Draw passes

use super::object::ObjectSlot;
use super::{BucketResources, Geometry, ObjectId, ObjectsBucket, ShaderVariant};
use crate::render::descriptors::{SetKind, SLOT_MATERIAL, SLOT_SCENE, SLOT_SHADOW_MAP, SLOT_SKINNING, SLOT_TEXTURE};
use crate::render::device::{Binding, CommandEncoder, Pipeline, UniformSet};
use crate::render::push_block::{PushBlock, LIGHT_BLOCK};
use crate::render::skinning::AnimationStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Main,
    Light,
    Shadow(usize),
}

impl Pass {
    fn set_kind(self) -> SetKind {
        match self {
            Self::Main | Self::Light => SetKind::Main,
            Self::Shadow(layer) => SetKind::Shadow(layer),
        }
    }
}

impl ObjectsBucket {
    /// Main pass: every visible object with its first [`LIGHT_BLOCK`] lights
    pub fn draw(&mut self, encoder: &mut dyn CommandEncoder, frame: usize) {
        if let Some(pipeline) = self.res.pipelines.main {
            self.draw_pass(encoder, frame, &pipeline, Pass::Main);
        }
    }

    /// Light accumulation: one extra draw per further block of lights
    pub fn draw_light(&mut self, encoder: &mut dyn CommandEncoder, frame: usize) {
        if let Some(pipeline) = self.res.pipelines.light {
            self.draw_pass(encoder, frame, &pipeline, Pass::Light);
        }
    }

    /// Shadow pass for one shadow layer
    pub fn draw_shadow(&mut self, encoder: &mut dyn CommandEncoder, frame: usize, layer: usize) {
        if let Some(pipeline) = self.res.pipelines.shadow {
            self.draw_pass(encoder, frame, &pipeline, Pass::Shadow(layer));
        }
    }

    fn draw_pass(&mut self, encoder: &mut dyn CommandEncoder, frame: usize, pipeline: &Pipeline, pass: Pass) {
        if self.visible.is_empty() {
            return;
        }
        self.commit_skeletons(frame);

        let kind = pass.set_kind();
        if self.use_shared {
            let set = self.shared.set(frame, kind);
            if set.is_empty() {
                return;
            }
            encoder.set_uniforms(pipeline, set);
        }

        let storage = self.storage.borrow();
        let lights = self.lights.as_ref();
        for &index in &self.visible {
            let slot = &mut self.objects[index];
            if !is_drawable(slot) {
                continue;
            }
            if pass == Pass::Light && slot.lights.len() <= LIGHT_BLOCK {
                continue;
            }

            if !self.use_shared {
                let set = bind_object(&self.res, &storage, slot, frame, kind, self.tick);
                if set.is_empty() {
                    continue;
                }
                encoder.set_uniforms(pipeline, set);
            }

            let mut block = PushBlock::new(&slot.transform);
            match pass {
                Pass::Main => {
                    block.fill_lights(slot.lights.ids(), lights);
                    push_and_issue(encoder, pipeline, &block, &slot.geometry, frame);
                }
                Pass::Light => {
                    for chunk in slot.lights.ids()[LIGHT_BLOCK..].chunks(LIGHT_BLOCK) {
                        block.fill_lights(chunk, lights);
                        push_and_issue(encoder, pipeline, &block, &slot.geometry, frame);
                    }
                }
                Pass::Shadow(_) => push_and_issue(encoder, pipeline, &block, &slot.geometry, frame),
            }
        }
    }

    /// Draw one object immediately with the main pipeline, outside the
    /// visible list.
    ///
    /// Per-object sets get the fallback texture in place of the shadow map;
    /// [`ObjectsBucket::setup_ubo`] restores the scene bindings.
    pub fn draw_object(&mut self, id: ObjectId, encoder: &mut dyn CommandEncoder, frame: usize) {
        let Some(pipeline) = self.res.pipelines.main else {
            return;
        };
        if !is_drawable(&self.objects[id.0]) {
            return;
        }
        self.commit_skeletons(frame);

        let slot = &mut self.objects[id.0];
        let set = if self.use_shared {
            self.shared.set(frame, SetKind::Main)
        } else {
            let set = slot.descriptors.set(frame, SetKind::Main);
            if !set.is_empty() {
                let res = &self.res;
                let device = res.device.as_ref();
                let material_ubo = Binding::whole_buffer(res.material_uniforms[frame], super::MATERIAL_UNIFORM_SIZE);

                let texture = res.material.frame_at(self.tick.wrapping_sub(slot.alloc_tick));
                device.bind(set, SLOT_TEXTURE, Binding::Texture(texture));
                device.bind(
                    set,
                    SLOT_SHADOW_MAP,
                    Binding::TextureSampler(res.scene.fallback_texture, res.scene.nearest_sampler),
                );
                device.bind(
                    set,
                    SLOT_SCENE,
                    Binding::whole_buffer(res.scene.frame_uniform(frame, 0), res.scene.frame_uniform_size),
                );
                device.bind(set, SLOT_MATERIAL, material_ubo);
                if let Some(skeleton) = slot.skeleton {
                    device.bind(set, SLOT_SKINNING, self.storage.borrow().binding(frame, skeleton));
                }
            }
            set
        };
        if set.is_empty() {
            return;
        }

        encoder.set_uniforms(&pipeline, set);
        let mut block = PushBlock::new(&slot.transform);
        block.fill_lights(slot.lights.ids(), self.lights.as_ref());
        push_and_issue(encoder, &pipeline, &block, &slot.geometry, frame);
    }

    fn commit_skeletons(&self, frame: usize) {
        if self.variant == ShaderVariant::Animated {
            self.storage.borrow_mut().commit(frame);
        }
    }
}

/// Skinned objects that could not get a skeleton are skipped
fn is_drawable(slot: &ObjectSlot) -> bool {
    match slot.geometry {
        Geometry::None => false,
        Geometry::Skinned { .. } => slot.skeleton.is_some(),
        Geometry::Static { .. } | Geometry::Morph(_) => true,
    }
}

/// Refresh per-object bindings and return the set to bind
fn bind_object(
    res: &BucketResources,
    storage: &AnimationStorage,
    slot: &mut ObjectSlot,
    frame: usize,
    kind: SetKind,
    tick: u64,
) -> UniformSet {
    let set = slot.descriptors.set(frame, kind);
    if set.is_empty() {
        return set;
    }

    let reads_texture = match kind {
        SetKind::Main => true,
        SetKind::Shadow(_) => res.pipelines.texture_in_shadow,
    };
    if reads_texture {
        res.bind_texture_frame(set, slot.alloc_tick, tick);
    }
    if let Some(skeleton) = slot.skeleton {
        slot.descriptors.bind_once(res.device.as_ref(), frame, kind, SLOT_SKINNING, storage.binding(frame, skeleton));
    }
    set
}

fn push_and_issue(
    encoder: &mut dyn CommandEncoder,
    pipeline: &Pipeline,
    block: &PushBlock,
    geometry: &Geometry,
    frame: usize,
) {
    encoder.push_constants(pipeline, block.as_bytes());
    geometry.issue(encoder, frame);
}

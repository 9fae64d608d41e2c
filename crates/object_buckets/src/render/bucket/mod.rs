//! # Object Buckets
//!
//! A bucket groups every object drawn with one material and one shader
//! variant. Objects live in a free-list arena so their [`ObjectId`]s stay
//! valid until freed, no matter how many other objects come and go.
//!
//! ## Descriptor sharing
//!
//! When nothing per-object leaks into uniform data (no skinning, no animated
//! texture sequence) the bucket allocates one [`DescriptorSetPair`] and binds
//! it once per pass. Otherwise every object owns a pair and the passes bind
//! each object's set before its draw.
//!
//! ## Frame order
//!
//! ```text
//! visibility_pass → per_frame_update → draw / draw_light / draw_shadow(layer)
//! ```
//!
//! The caller picks the frame-in-flight index; the bucket only guarantees that
//! writes for index `f` touch nothing used by another index.

mod draw;
mod object;
mod visibility;

#[cfg(test)]
mod tests;

pub use object::Geometry;

use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::config::BucketConfig;
use crate::render::bounds::Bounds;
use crate::render::descriptors::{
    DescriptorSetPair, SetKind, SLOT_MATERIAL, SLOT_SCENE, SLOT_SHADOW_MAP, SLOT_TEXTURE,
};
use crate::render::device::{Binding, BufferId, IndexBuffer, RenderDevice, UniformSet, VertexBuffer};
use crate::render::lights::{LightId, LightList};
use crate::render::material::Material;
use crate::render::pipelines::{PassPipelines, PipelineLibrary};
use crate::render::scene::SceneGlobals;
use crate::render::skinning::{AnimationStorage, Pose};
use crate::render::{MAX_FRAMES_IN_FLIGHT, SHADOW_LAYERS};
use crate::foundation::math::Mat4;

use object::ObjectSlot;
use visibility::Aggregate;

/// Shader family a bucket renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    /// Static geometry; the whole bucket is culled as one volume first
    Static,
    /// Skinned geometry with per-object skeletons
    Animated,
    /// Static shaders, geometry may be morph-deformed per frame
    Morph,
}

impl std::fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Static => "Static",
            Self::Animated => "Animated",
            Self::Morph => "Morph",
        };
        write!(f, "{name}")
    }
}

/// Stable identifier of an object inside its bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Slot index in the bucket's storage
    pub fn index(self) -> usize {
        self.0
    }
}

/// Material animation uniform, one per frame in flight
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub(crate) struct MaterialUniform {
    pub(crate) scroll: [f32; 2],
    _padding: [f32; 2],
}

const MATERIAL_UNIFORM_SIZE: u64 = std::mem::size_of::<MaterialUniform>() as u64;

/// Everything a scene shares between its buckets
#[derive(Clone)]
pub struct BucketContext {
    /// Device used for uniform sets and buffers
    pub device: Rc<dyn RenderDevice>,
    /// Scene-wide uniforms, shadow map and samplers
    pub scene: Rc<SceneGlobals>,
    /// Pipelines to select from
    pub pipelines: Rc<PipelineLibrary>,
    /// Skeleton storage shared by all animated buckets
    pub storage: Rc<RefCell<AnimationStorage>>,
    /// Scene light list
    pub lights: Rc<dyn LightList>,
    /// Tunables
    pub config: BucketConfig,
}

/// Bucket state the descriptor helpers read while an object is borrowed
struct BucketResources {
    device: Rc<dyn RenderDevice>,
    scene: Rc<SceneGlobals>,
    material: Rc<Material>,
    pipelines: PassPipelines,
    material_uniforms: [BufferId; MAX_FRAMES_IN_FLIGHT],
}

impl BucketResources {
    /// Allocate a pair if needed and fill its common bindings
    fn allocate_sets(&self, pair: &mut DescriptorSetPair) {
        let main = self.pipelines.main.map(|p| p.layout);
        let shadow = self.pipelines.shadow.map(|p| p.layout);
        if pair.allocate(self.device.as_ref(), main, shadow) {
            self.bind_common(pair);
        }
    }

    /// Texture, shadow map, scene uniform and material uniform for every frame
    fn bind_common(&self, pair: &DescriptorSetPair) {
        let device = self.device.as_ref();
        let scene = &self.scene;

        for frame in 0..MAX_FRAMES_IN_FLIGHT {
            let material_ubo = Binding::whole_buffer(self.material_uniforms[frame], MATERIAL_UNIFORM_SIZE);

            let main = pair.set(frame, SetKind::Main);
            if !main.is_empty() {
                device.bind(main, SLOT_TEXTURE, Binding::Texture(self.material.texture));
                device.bind(main, SLOT_SHADOW_MAP, Binding::TextureSampler(scene.shadow_map, scene.shadow_sampler));
                device.bind(
                    main,
                    SLOT_SCENE,
                    Binding::whole_buffer(scene.frame_uniform(frame, 0), scene.frame_uniform_size),
                );
                device.bind(main, SLOT_MATERIAL, material_ubo);
            }

            if self.pipelines.shadow.is_none() {
                continue;
            }
            for layer in 0..SHADOW_LAYERS {
                let set = pair.set(frame, SetKind::Shadow(layer));
                if set.is_empty() {
                    continue;
                }
                if self.pipelines.texture_in_shadow {
                    device.bind(set, SLOT_TEXTURE, Binding::Texture(self.material.texture));
                }
                device.bind(
                    set,
                    SLOT_SCENE,
                    Binding::whole_buffer(scene.frame_uniform(frame, layer), scene.frame_uniform_size),
                );
                device.bind(set, SLOT_MATERIAL, material_ubo);
            }
        }
    }

    /// Point the texture slot at the current frame of an animated material
    fn bind_texture_frame(&self, set: UniformSet, alloc_tick: u64, tick: u64) {
        if !self.material.is_animated() || set.is_empty() {
            return;
        }
        let texture = self.material.frame_at(tick.wrapping_sub(alloc_tick));
        self.device.bind(set, SLOT_TEXTURE, Binding::Texture(texture));
    }
}

/// Objects sharing one material and shader variant
pub struct ObjectsBucket {
    res: BucketResources,
    storage: Rc<RefCell<AnimationStorage>>,
    lights: Rc<dyn LightList>,
    variant: ShaderVariant,
    use_shared: bool,
    shared: DescriptorSetPair,
    objects: Vec<ObjectSlot>,
    free_list: Vec<usize>,
    visible: Vec<usize>,
    aggregate: Aggregate,
    tick: u64,
    light_cell_size: f32,
    max_lights: usize,
}

impl ObjectsBucket {
    /// Create a bucket for `material` rendered with `variant`
    pub fn new(ctx: &BucketContext, material: Rc<Material>, variant: ShaderVariant) -> Self {
        if let Err(e) = ctx.config.validate() {
            log::warn!("Bucket created with questionable config: {e}");
        }
        let pipelines = ctx.pipelines.resolve(material.alpha, variant == ShaderVariant::Animated);
        let use_shared = variant != ShaderVariant::Animated && !material.is_animated();
        let material_uniforms =
            std::array::from_fn(|_| ctx.device.create_uniform_buffer(MATERIAL_UNIFORM_SIZE));

        log::debug!(
            "Creating {} bucket for {} material (shared descriptors: {}, main: {}, light: {}, shadow: {})",
            variant,
            material.alpha,
            use_shared,
            pipelines.main.is_some(),
            pipelines.light.is_some(),
            pipelines.shadow.is_some()
        );

        let mut bucket = Self {
            res: BucketResources {
                device: ctx.device.clone(),
                scene: ctx.scene.clone(),
                material,
                pipelines,
                material_uniforms,
            },
            storage: ctx.storage.clone(),
            lights: ctx.lights.clone(),
            variant,
            use_shared,
            shared: DescriptorSetPair::new(),
            objects: Vec::new(),
            free_list: Vec::new(),
            visible: Vec::new(),
            aggregate: Aggregate::Stale,
            tick: 0,
            light_cell_size: ctx.config.light_cell_size,
            max_lights: ctx.config.effective_max_lights(),
        };

        if bucket.use_shared {
            bucket.shared.invalidate();
            bucket.res.allocate_sets(&mut bucket.shared);
        }
        bucket
    }

    /// Material this bucket draws with
    pub fn material(&self) -> &Material {
        &self.res.material
    }

    /// Shader variant
    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    /// Whether one descriptor set pair serves every object
    pub fn uses_shared_descriptors(&self) -> bool {
        self.use_shared
    }

    /// Pipelines selected for this bucket
    pub fn pipelines(&self) -> &PassPipelines {
        &self.res.pipelines
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len() - self.free_list.len()
    }

    /// Whether the bucket has no live objects
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a static mesh
    pub fn alloc_static(&mut self, vertices: VertexBuffer, indices: IndexBuffer, bounds: Bounds) -> ObjectId {
        ObjectId(self.impl_alloc(Geometry::Static { vertices, indices }, bounds))
    }

    /// Allocate a skinned mesh and reserve a skeleton for it.
    ///
    /// When the animation storage is full the object gets no skeleton and is
    /// skipped by every pass until freed.
    pub fn alloc_skinned(&mut self, vertices: VertexBuffer, indices: IndexBuffer, bounds: Bounds) -> ObjectId {
        let index = self.impl_alloc(Geometry::Skinned { vertices, indices }, bounds);
        self.objects[index].skeleton = self.storage.borrow_mut().reserve();
        ObjectId(index)
    }

    /// Allocate a morph mesh with one vertex buffer per frame in flight
    pub fn alloc_morph(&mut self, frames: [VertexBuffer; MAX_FRAMES_IN_FLIGHT], bounds: Bounds) -> ObjectId {
        ObjectId(self.impl_alloc(Geometry::Morph(frames), bounds))
    }

    fn impl_alloc(&mut self, geometry: Geometry, bounds: Bounds) -> usize {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else {
            self.objects.push(ObjectSlot::default());
            self.objects.len() - 1
        };

        let slot = &mut self.objects[index];
        slot.reset(geometry, bounds, self.tick);
        if !self.use_shared {
            slot.descriptors.invalidate();
            self.res.allocate_sets(&mut slot.descriptors);
        }

        self.invalidate_aggregate();
        index
    }

    /// Free an object. Its id must be live; freeing twice is not detected.
    pub fn free(&mut self, id: ObjectId) {
        let slot = &mut self.objects[id.0];
        if let Some(skeleton) = slot.skeleton.take() {
            self.storage.borrow_mut().release(skeleton);
        }
        slot.geometry = Geometry::None;
        slot.lights.clear();
        self.free_list.push(id.0);
        self.invalidate_aggregate();
    }

    /// Set the world transform of an object
    pub fn set_transform(&mut self, id: ObjectId, transform: Mat4) {
        let slot = &mut self.objects[id.0];
        slot.bounds.set_transform(&transform);
        slot.transform = transform;
        self.invalidate_aggregate();
        self.refresh_lights(id.0, false);
    }

    /// Upload a skeletal pose. Ignored outside animated buckets.
    pub fn set_pose(&mut self, id: ObjectId, pose: &Pose) {
        if self.variant != ShaderVariant::Animated {
            return;
        }
        if let Some(skeleton) = self.objects[id.0].skeleton {
            self.storage.borrow_mut().write_pose(skeleton, pose);
        }
        self.refresh_lights(id.0, true);
    }

    /// Override the bounds of an object
    pub fn set_bounds(&mut self, id: ObjectId, bounds: Bounds) {
        self.objects[id.0].bounds = bounds;
        self.invalidate_aggregate();
    }

    /// Current bounds of an object
    pub fn bounds(&self, id: ObjectId) -> &Bounds {
        &self.objects[id.0].bounds
    }

    /// Geometry of an object (`Geometry::None` once freed)
    pub fn geometry(&self, id: ObjectId) -> &Geometry {
        &self.objects[id.0].geometry
    }

    /// Skeleton index held by an object
    pub fn skeleton(&self, id: ObjectId) -> Option<usize> {
        self.objects[id.0].skeleton
    }

    /// Lights cached for an object
    pub fn object_lights(&self, id: ObjectId) -> &[LightId] {
        self.objects[id.0].lights.ids()
    }

    /// Refresh the material animation uniform for `frame`.
    ///
    /// `tick` is the scene's monotonically increasing tick counter; it also
    /// drives per-object texture-frame animation during the draw passes.
    pub fn per_frame_update(&mut self, frame: usize, tick: u64) {
        self.tick = tick;
        let ubo = MaterialUniform {
            scroll: self.res.material.scroll_phase(tick),
            ..MaterialUniform::default()
        };
        self.res.device.write_buffer(self.res.material_uniforms[frame], 0, bytemuck::bytes_of(&ubo));
    }

    /// Swap scene globals and rebuild all common bindings and light caches
    pub fn setup_ubo(&mut self, scene: Rc<SceneGlobals>) {
        self.res.scene = scene;
        log::debug!("Rebinding {} bucket ({} objects)", self.variant, self.len());

        for index in 0..self.objects.len() {
            if !self.objects[index].geometry.is_none() {
                self.refresh_lights(index, true);
            }
        }

        if self.use_shared {
            self.shared.invalidate();
            self.res.bind_common(&self.shared);
        } else {
            for slot in &mut self.objects {
                slot.descriptors.invalidate();
                self.res.bind_common(&slot.descriptors);
            }
        }
    }

    /// Forget bound-slot bits on every descriptor set pair
    pub fn invalidate_ubo(&mut self) {
        if self.use_shared {
            self.shared.invalidate();
        } else {
            for slot in &mut self.objects {
                slot.descriptors.invalidate();
            }
        }
    }

    fn invalidate_aggregate(&mut self) {
        if self.variant == ShaderVariant::Static {
            self.aggregate = Aggregate::Stale;
        }
    }

    fn refresh_lights(&mut self, index: usize, force: bool) {
        let slot = &mut self.objects[index];
        slot.lights.refresh(&slot.bounds, self.lights.as_ref(), self.light_cell_size, self.max_lights, force);
    }
}

impl ObjectsBucket {
    /// Return every uniform set and skeleton; dropping the bucket does the same
    pub fn release(mut self) {
        self.release_resources();
    }

    fn release_resources(&mut self) {
        let device = self.res.device.as_ref();
        self.shared.release(device);

        let mut storage = self.storage.try_borrow_mut().ok();
        for slot in &mut self.objects {
            slot.descriptors.release(device);
            if let (Some(skeleton), Some(storage)) = (slot.skeleton.take(), storage.as_mut()) {
                storage.release(skeleton);
            }
        }
    }
}

impl Drop for ObjectsBucket {
    fn drop(&mut self) {
        self.release_resources();
    }
}

impl std::fmt::Debug for ObjectsBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectsBucket")
            .field("variant", &self.variant)
            .field("alpha", &self.res.material.alpha)
            .field("use_shared", &self.use_shared)
            .field("objects", &self.len())
            .field("visible", &self.visible.len())
            .finish_non_exhaustive()
    }
}

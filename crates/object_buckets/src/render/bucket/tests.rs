use std::cell::{Cell, RefCell};
use std::rc::Rc;

use approx::assert_relative_eq;

use super::*;
use crate::foundation::math::Vec3;
use crate::render::bounds::Bounds;
use crate::render::descriptors::SLOT_SKINNING;
use crate::render::device::{Binding, BufferId, IndexBuffer, LayoutId, SamplerId, TextureId, VertexBuffer};
use crate::render::lights::{LightId, LightList, PointLight, SceneLights};
use crate::render::material::{AlphaMode, Material};
use crate::render::pipelines::tests::test_library;
use crate::render::testing::{DeviceCall, EncoderCall, MockDevice, MockEncoder};

/// Light list that counts how often it was queried
#[derive(Default)]
struct CountingLights {
    inner: SceneLights,
    queries: Cell<usize>,
}

impl LightList for CountingLights {
    fn query(&self, bounds: &Bounds, out: &mut [LightId]) -> usize {
        self.queries.set(self.queries.get() + 1);
        self.inner.query(bounds, out)
    }

    fn light(&self, id: LightId) -> Option<PointLight> {
        self.inner.light(id)
    }
}

struct Fixture {
    device: Rc<MockDevice>,
    lights: Rc<CountingLights>,
    storage: Rc<RefCell<AnimationStorage>>,
    ctx: BucketContext,
}

fn scene_globals(shadow_map: u64) -> SceneGlobals {
    SceneGlobals {
        frame_uniforms: [[BufferId(500), BufferId(501)], [BufferId(510), BufferId(511)]],
        frame_uniform_size: 256,
        shadow_map: TextureId(shadow_map),
        shadow_sampler: SamplerId(1),
        fallback_texture: TextureId(99),
        nearest_sampler: SamplerId(2),
    }
}

fn fixture_with_capacity(skeletons: usize) -> Fixture {
    let config = BucketConfig::default().with_log_level("object_buckets=debug");
    config.init_logging();
    let device = Rc::new(MockDevice::new());
    let lights = Rc::new(CountingLights::default());
    let storage = Rc::new(RefCell::new(AnimationStorage::new(device.clone(), skeletons)));
    let ctx = BucketContext {
        device: device.clone(),
        scene: Rc::new(scene_globals(50)),
        pipelines: Rc::new(test_library()),
        storage: storage.clone(),
        lights: lights.clone(),
        config,
    };
    Fixture { device, lights, storage, ctx }
}

fn fixture() -> Fixture {
    fixture_with_capacity(8)
}

fn solid() -> Rc<Material> {
    Rc::new(Material::new(TextureId(7), AlphaMode::Solid))
}

fn animated_texture() -> Rc<Material> {
    Rc::new(Material::new(TextureId(7), AlphaMode::Solid).with_frames(vec![TextureId(10), TextureId(11)], 2))
}

fn unit_box() -> Bounds {
    Bounds::new(Vec3::repeat(-1.0), Vec3::repeat(1.0))
}

fn mesh(n: u64) -> (VertexBuffer, IndexBuffer) {
    (VertexBuffer::new(BufferId(n), 3), IndexBuffer::new(BufferId(n + 100), 3))
}

fn alloc_static(bucket: &mut ObjectsBucket, n: u64) -> ObjectId {
    let (v, i) = mesh(n);
    bucket.alloc_static(v, i, unit_box())
}

fn translate(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::new_translation(&Vec3::new(x, y, z))
}

fn show_all(bucket: &mut ObjectsBucket) {
    let all = |_: &Bounds| true;
    bucket.visibility_pass(&all);
}

#[test]
fn test_free_list_reuses_last_freed_slot() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let a = alloc_static(&mut bucket, 1);
    let b = alloc_static(&mut bucket, 2);
    let _c = alloc_static(&mut bucket, 3);
    bucket.set_transform(a, translate(5.0, 0.0, 0.0));

    bucket.free(b);
    bucket.free(a);
    assert_eq!(bucket.len(), 1);
    assert!(bucket.geometry(a).is_none());

    let reused = alloc_static(&mut bucket, 4);
    assert_eq!(reused, a);
    assert_eq!(alloc_static(&mut bucket, 5), b);
    assert_eq!(bucket.objects.len(), 3);

    let slot = &bucket.objects[reused.index()];
    assert_eq!(slot.transform, Mat4::identity());
    assert_eq!(*bucket.bounds(reused), unit_box());
    assert!(bucket.object_lights(reused).is_empty());
    assert_eq!(*bucket.geometry(reused), Geometry::Static { vertices: mesh(4).0, indices: mesh(4).1 });
}

#[test]
fn test_reused_skinned_slot_drops_its_skeleton() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
    let (v, i) = mesh(1);
    let skinned = bucket.alloc_skinned(v, i, unit_box());
    assert!(bucket.skeleton(skinned).is_some());
    assert_eq!(f.storage.borrow().reserved(), 1);

    bucket.free(skinned);
    let reused = alloc_static(&mut bucket, 2);
    assert_eq!(reused, skinned);
    assert_eq!(bucket.skeleton(reused), None);
    assert_eq!(f.storage.borrow().reserved(), 0);

    // The static object must not pick up the old skinning range
    f.device.clear_calls();
    show_all(&mut bucket);
    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.draws(), 1);
    assert_eq!(f.device.count(|c| matches!(c, DeviceCall::Bind { slot: SLOT_SKINNING, .. })), 0);
}

#[test]
fn test_aggregate_is_union_of_indexed_bounds() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let a = alloc_static(&mut bucket, 1);
    let b = alloc_static(&mut bucket, 2);
    bucket.set_transform(b, translate(10.0, 0.0, 0.0));

    let agg = bucket.aggregate_bounds().expect("indexed geometry");
    assert_relative_eq!(agg.min, Vec3::repeat(-1.0));
    assert_relative_eq!(agg.max, Vec3::new(11.0, 1.0, 1.0));

    bucket.set_bounds(b, Bounds::new(Vec3::new(0.0, 0.0, -4.0), Vec3::new(2.0, 2.0, 0.0)));
    let agg = bucket.aggregate_bounds().expect("indexed geometry");
    assert_relative_eq!(agg.min, Vec3::new(-1.0, -1.0, -4.0));
    assert_relative_eq!(agg.max, Vec3::new(2.0, 2.0, 1.0));

    bucket.free(a);
    let agg = bucket.aggregate_bounds().expect("indexed geometry");
    assert_eq!(agg.min, Vec3::new(0.0, 0.0, -4.0));
    assert_eq!(agg.max, Vec3::new(2.0, 2.0, 0.0));

    bucket.free(b);
    assert!(bucket.aggregate_bounds().is_none());
}

#[test]
fn test_set_bounds_round_trip() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    let bounds = Bounds::new(Vec3::new(3.0, -2.0, 1.0), Vec3::new(4.0, 0.5, 8.0));
    bucket.set_bounds(id, bounds);
    assert_eq!(*bucket.bounds(id), bounds);
}

#[test]
fn test_light_cache_refreshes_on_cell_change() {
    let f = fixture();
    f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 5.0));
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);

    bucket.set_transform(id, translate(1.0, 0.0, 0.0));
    assert_eq!(f.lights.queries.get(), 1);
    assert_eq!(bucket.object_lights(id).len(), 1);

    // Same cell: cached
    bucket.set_transform(id, translate(2.0, 0.0, 0.0));
    assert_eq!(f.lights.queries.get(), 1);

    bucket.set_transform(id, translate(25.0, 0.0, 0.0));
    assert_eq!(f.lights.queries.get(), 2);
    assert!(bucket.object_lights(id).is_empty());

    // Poses are ignored outside animated buckets
    bucket.set_pose(id, &Pose::default());
    assert_eq!(f.lights.queries.get(), 2);
}

#[test]
fn test_first_refresh_at_origin_queries() {
    let f = fixture();
    f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 5.0));
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);

    bucket.set_transform(id, Mat4::identity());
    assert_eq!(f.lights.queries.get(), 1);
    assert_eq!(bucket.object_lights(id).len(), 1);
}

#[test]
fn test_set_pose_forces_light_refresh() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
    let (v, i) = mesh(1);
    let id = bucket.alloc_skinned(v, i, unit_box());
    bucket.set_transform(id, translate(1.0, 0.0, 0.0));
    assert_eq!(f.lights.queries.get(), 1);

    let pose = Pose::new(vec![translate(0.0, 1.0, 0.0)]);
    bucket.set_pose(id, &pose);
    bucket.set_pose(id, &pose);
    assert_eq!(f.lights.queries.get(), 3);

    let skeleton = bucket.skeleton(id).expect("skeleton reserved");
    assert_eq!(f.storage.borrow().element(skeleton)[0], crate::foundation::math::mat4_to_array(&pose.transforms[0]));
}

#[test]
fn test_culled_bucket_issues_no_draws() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    for n in 0..4 {
        alloc_static(&mut bucket, n);
    }

    let tests = Cell::new(0);
    let never = |_: &Bounds| {
        tests.set(tests.get() + 1);
        false
    };
    bucket.visibility_pass(&never);
    // Only the group volume was tested
    assert_eq!(tests.get(), 1);
    assert_eq!(bucket.visible().count(), 0);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    bucket.draw_light(&mut encoder, 0);
    bucket.draw_shadow(&mut encoder, 0, 0);
    assert!(encoder.calls.is_empty());
}

#[test]
fn test_per_object_culling() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let near = alloc_static(&mut bucket, 1);
    let far = alloc_static(&mut bucket, 2);
    bucket.set_transform(far, translate(100.0, 0.0, 0.0));

    let close = |b: &Bounds| b.min.x < 50.0;
    bucket.visibility_pass(&close);
    assert_eq!(bucket.visible().collect::<Vec<_>>(), vec![near]);
}

#[test]
fn test_morph_objects_are_never_culled() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Morph);
    let frames = [VertexBuffer::new(BufferId(1), 6), VertexBuffer::new(BufferId(2), 6)];
    let id = bucket.alloc_morph(frames, unit_box());

    let never = |_: &Bounds| false;
    bucket.visibility_pass(&never);
    assert_eq!(bucket.visible().collect::<Vec<_>>(), vec![id]);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 1);
    assert!(encoder.calls.contains(&EncoderCall::Draw { vertices: frames[1] }));
    assert_eq!(encoder.draws(), 1);
}

#[test]
fn test_light_pass_chunks_from_ninth_light() {
    let f = fixture();
    for n in 0..20 {
        f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 50.0 + n as f32));
    }
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    bucket.set_transform(id, Mat4::identity());
    assert_eq!(bucket.object_lights(id).len(), 20);
    show_all(&mut bucket);

    let mut main = MockEncoder::new();
    bucket.draw(&mut main, 0);
    let blocks = main.push_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].lights[0].range, 50.0);
    assert_eq!(blocks[0].lights[7].range, 57.0);

    let mut light = MockEncoder::new();
    bucket.draw_light(&mut light, 0);
    assert_eq!(light.draws(), 2);
    let blocks = light.push_blocks();
    assert_eq!(blocks[0].lights[0].range, 58.0);
    assert_eq!(blocks[0].lights[7].range, 65.0);
    assert_eq!(blocks[1].lights[3].range, 69.0);
    assert!(blocks[1].lights[4..].iter().all(|l| l.range == 0.0));
}

#[test]
fn test_light_pass_skips_objects_with_few_lights() {
    let f = fixture();
    for _ in 0..8 {
        f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 50.0));
    }
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    bucket.set_transform(id, Mat4::identity());
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw_light(&mut encoder, 0);
    assert_eq!(encoder.draws(), 0);
}

#[test]
fn test_max_lights_config_caps_cache() {
    let mut f = fixture();
    f.ctx.config = BucketConfig::default().with_max_lights(3);
    for _ in 0..10 {
        f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 50.0));
    }
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    bucket.set_transform(id, Mat4::identity());
    assert_eq!(bucket.object_lights(id).len(), 3);
}

#[test]
fn test_removed_light_pushes_zero_range() {
    let f = fixture();
    let light = f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 5.0));
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    bucket.set_transform(id, Mat4::identity());
    f.lights.inner.remove(light);
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.push_blocks()[0].lights[0].range, 0.0);
}

#[test]
fn test_shared_set_is_bound_once_per_pass() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    assert!(bucket.uses_shared_descriptors());
    for n in 0..3 {
        alloc_static(&mut bucket, n);
    }
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.uniform_binds().len(), 1);
    assert_eq!(encoder.draws(), 3);
}

#[test]
fn test_per_object_sets_are_bound_per_draw() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, animated_texture(), ShaderVariant::Static);
    assert!(!bucket.uses_shared_descriptors());
    for n in 0..3 {
        alloc_static(&mut bucket, n);
    }
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    let binds = encoder.uniform_binds();
    assert_eq!(binds.len(), 3);
    assert!(binds[0] != binds[1] && binds[1] != binds[2]);
}

#[test]
fn test_skinning_binding_written_once_per_frame() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
    assert!(!bucket.uses_shared_descriptors());
    for n in 0..2 {
        let (v, i) = mesh(n);
        bucket.alloc_skinned(v, i, unit_box());
    }
    show_all(&mut bucket);
    f.device.clear_calls();

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    bucket.draw(&mut encoder, 0);
    let skinning = |c: &DeviceCall| matches!(c, DeviceCall::Bind { slot, .. } if *slot == SLOT_SKINNING);
    assert_eq!(f.device.count(skinning), 2);
    assert_eq!(encoder.draws(), 4);

    bucket.invalidate_ubo();
    bucket.draw(&mut encoder, 0);
    assert_eq!(f.device.count(skinning), 4);
}

#[test]
fn test_skeleton_exhaustion_skips_object() {
    let f = fixture_with_capacity(1);
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
    let (v, i) = mesh(1);
    let first = bucket.alloc_skinned(v, i, unit_box());
    let second = bucket.alloc_skinned(v, i, unit_box());
    assert!(bucket.skeleton(first).is_some());
    assert!(bucket.skeleton(second).is_none());
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.draws(), 1);

    bucket.free(first);
    assert_eq!(f.storage.borrow().reserved(), 0);
}

#[test]
fn test_draw_commits_pending_poses() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
    let (v, i) = mesh(1);
    let id = bucket.alloc_skinned(v, i, unit_box());
    bucket.set_pose(id, &Pose::new(vec![translate(1.0, 0.0, 0.0)]));
    show_all(&mut bucket);
    f.device.clear_calls();

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 1);
    bucket.draw_shadow(&mut encoder, 1, 0);
    let storage_buffer = f.storage.borrow().buffer(1);
    let uploads = |c: &DeviceCall| matches!(c, DeviceCall::WriteBuffer { buffer, .. } if *buffer == storage_buffer);
    assert_eq!(f.device.count(uploads), 1);
}

#[test]
fn test_additive_material_casts_no_shadow() {
    let f = fixture();
    let material = Rc::new(Material::new(TextureId(7), AlphaMode::AdditiveLight));
    let mut bucket = ObjectsBucket::new(&f.ctx, material, ShaderVariant::Static);
    alloc_static(&mut bucket, 1);
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw_shadow(&mut encoder, 0, 0);
    bucket.draw_shadow(&mut encoder, 0, 1);
    bucket.draw_light(&mut encoder, 0);
    assert!(encoder.calls.is_empty());

    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.draws(), 1);
}

#[test]
fn test_invalid_material_draws_nothing() {
    let f = fixture();
    let material = Rc::new(Material::new(TextureId(7), AlphaMode::Invalid));
    let mut bucket = ObjectsBucket::new(&f.ctx, material, ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    bucket.draw_object(id, &mut encoder, 0);
    assert!(encoder.calls.is_empty());
}

#[test]
fn test_shadow_push_block_has_no_lights() {
    let f = fixture();
    f.lights.inner.add(PointLight::new(Vec3::zeros(), Vec3::repeat(1.0), 5.0));
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    bucket.set_transform(id, translate(1.0, 2.0, 3.0));
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw_shadow(&mut encoder, 0, 1);
    let blocks = encoder.push_blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].transform[3], [1.0, 2.0, 3.0, 1.0]);
    assert!(blocks[0].lights.iter().all(|l| l.range == 0.0));
}

#[test]
fn test_common_bindings_use_layer_uniforms() {
    let f = fixture();
    let scene = scene_globals(50);
    let _bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);

    let scene_binds: Vec<Binding> = f
        .device
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::Bind { slot: crate::render::descriptors::SLOT_SCENE, resource, .. } => Some(resource),
            _ => None,
        })
        .collect();
    for frame in 0..MAX_FRAMES_IN_FLIGHT {
        for layer in 0..SHADOW_LAYERS {
            let expected = Binding::whole_buffer(scene.frame_uniform(frame, layer), scene.frame_uniform_size);
            assert!(scene_binds.contains(&expected), "missing global uniform for {frame}/{layer}");
        }
    }
}

#[test]
fn test_per_frame_update_writes_scroll_phase() {
    let f = fixture();
    let material = Rc::new(Material::new(TextureId(7), AlphaMode::Solid).with_scroll(4, -8));
    let mut bucket = ObjectsBucket::new(&f.ctx, material, ShaderVariant::Static);
    f.device.clear_calls();

    bucket.per_frame_update(1, 6);
    let expected = MaterialUniform { scroll: [0.5, -0.75], ..MaterialUniform::default() };
    assert_eq!(
        f.device.calls(),
        vec![DeviceCall::WriteBuffer {
            buffer: bucket.res.material_uniforms[1],
            offset: 0,
            data: bytemuck::bytes_of(&expected).to_vec(),
        }]
    );
}

#[test]
fn test_texture_frame_follows_tick() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, animated_texture(), ShaderVariant::Static);
    alloc_static(&mut bucket, 1);
    show_all(&mut bucket);
    bucket.per_frame_update(0, 2);
    f.device.clear_calls();

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    let texture = |c: &DeviceCall| matches!(c, DeviceCall::Bind { resource: Binding::Texture(TextureId(11)), .. });
    assert_eq!(f.device.count(texture), 1);
}

#[test]
fn test_setup_ubo_rebinds_new_shadow_map() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    f.device.clear_calls();

    let scene = Rc::new(scene_globals(60));
    bucket.setup_ubo(scene.clone());
    let rebinds = |c: &DeviceCall| {
        matches!(c, DeviceCall::Bind { resource: Binding::TextureSampler(t, _), .. } if *t == scene.shadow_map)
    };
    assert_eq!(f.device.count(rebinds), MAX_FRAMES_IN_FLIGHT);
}

#[test]
fn test_draw_object_binds_fallback_texture() {
    let f = fixture();
    let mut bucket = ObjectsBucket::new(&f.ctx, animated_texture(), ShaderVariant::Static);
    let id = alloc_static(&mut bucket, 1);
    f.device.clear_calls();

    let mut encoder = MockEncoder::new();
    bucket.draw_object(id, &mut encoder, 0);
    let fallback = |c: &DeviceCall| {
        matches!(c, DeviceCall::Bind { resource: Binding::TextureSampler(TextureId(99), SamplerId(2)), .. })
    };
    assert_eq!(f.device.count(fallback), 1);
    assert_eq!(encoder.uniform_binds().len(), 1);
    assert_eq!(encoder.draws(), 1);
}

#[test]
fn test_exhausted_device_skips_per_object_draws() {
    let f = fixture();
    f.device.exhausted.set(true);
    let mut bucket = ObjectsBucket::new(&f.ctx, animated_texture(), ShaderVariant::Static);
    alloc_static(&mut bucket, 1);
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    assert_eq!(encoder.draws(), 0);
}

#[test]
fn test_exhausted_device_skips_shared_draws() {
    let f = fixture();
    f.device.exhausted.set(true);
    let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Static);
    assert!(bucket.uses_shared_descriptors());
    alloc_static(&mut bucket, 1);
    show_all(&mut bucket);

    let mut encoder = MockEncoder::new();
    bucket.draw(&mut encoder, 0);
    bucket.draw_shadow(&mut encoder, 0, 0);
    assert!(encoder.uniform_binds().is_empty());
    assert!(encoder.push_blocks().is_empty());
    assert_eq!(encoder.draws(), 0);
}

#[test]
fn test_drop_releases_uniform_sets_and_skeletons() {
    let f = fixture();
    {
        let mut bucket = ObjectsBucket::new(&f.ctx, solid(), ShaderVariant::Animated);
        let (v, i) = mesh(1);
        bucket.alloc_skinned(v, i, unit_box());
        bucket.alloc_skinned(v, i, unit_box());
        assert_eq!(f.storage.borrow().reserved(), 2);
    }

    let allocated = f.device.count(|c| matches!(c, DeviceCall::Uniforms(LayoutId(_))));
    let released = f.device.count(|c| matches!(c, DeviceCall::ReleaseUniforms(_)));
    assert_eq!(allocated, released);
    assert_eq!(f.storage.borrow().reserved(), 0);
}

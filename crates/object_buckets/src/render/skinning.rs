//! Shared skinning-matrix storage
//!
//! One [`AnimationStorage`] serves every animated bucket of a scene. Each
//! skinned object holds an exclusive skeleton index into it; the matrices of
//! all skeletons live in one uniform buffer per frame in flight and objects
//! bind their own range of it.
//!
//! Writes are staged on the CPU and uploaded lazily by [`AnimationStorage::commit`],
//! once per frame slot. Committing the same frame twice uploads nothing the
//! second time, so every bucket may call it without coordination.

use std::rc::Rc;

use crate::config::BucketConfig;
use crate::foundation::math::{mat4_to_array, Mat4};
use crate::render::device::{Binding, BufferId, RenderDevice};
use crate::render::MAX_FRAMES_IN_FLIGHT;

/// Bones per skeleton
pub const MAX_BONES: usize = 96;

/// Byte size of one skeleton's matrix block
pub const SKELETON_SIZE: u64 = (MAX_BONES * std::mem::size_of::<[f32; 16]>()) as u64;

/// Bone matrices produced by the animation system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    /// Model-space bone transforms; extra bones past [`MAX_BONES`] are dropped
    pub transforms: Vec<Mat4>,
}

impl Pose {
    /// Create a pose from bone transforms
    pub fn new(transforms: Vec<Mat4>) -> Self {
        Self { transforms }
    }
}

/// Pool of skeleton matrix blocks with per-frame GPU copies
pub struct AnimationStorage {
    device: Rc<dyn RenderDevice>,
    matrices: Vec<[f32; 16]>,
    in_use: Vec<bool>,
    free_list: Vec<usize>,
    /// Skeletons waiting for upload, per frame slot
    pending: [Vec<usize>; MAX_FRAMES_IN_FLIGHT],
    /// Bit `f` set when the skeleton is queued in `pending[f]`
    queued: Vec<u8>,
    buffers: [BufferId; MAX_FRAMES_IN_FLIGHT],
}

impl AnimationStorage {
    /// Create storage for `capacity` skeletons
    pub fn new(device: Rc<dyn RenderDevice>, capacity: usize) -> Self {
        let size = SKELETON_SIZE * capacity as u64;
        let buffers = std::array::from_fn(|_| device.create_uniform_buffer(size));
        log::info!(
            "Created AnimationStorage with {} skeletons ({} bytes per frame, {} frames)",
            capacity,
            size,
            MAX_FRAMES_IN_FLIGHT
        );

        Self {
            device,
            matrices: vec![mat4_to_array(&Mat4::identity()); capacity * MAX_BONES],
            in_use: vec![false; capacity],
            free_list: (0..capacity).rev().collect(),
            pending: std::array::from_fn(|_| Vec::new()),
            queued: vec![0; capacity],
            buffers,
        }
    }

    /// Create storage sized by [`BucketConfig::skeleton_capacity`]
    pub fn from_config(device: Rc<dyn RenderDevice>, config: &BucketConfig) -> Self {
        Self::new(device, config.skeleton_capacity)
    }

    /// Number of skeletons the storage can hold
    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    /// Number of skeletons currently reserved
    pub fn reserved(&self) -> usize {
        self.capacity() - self.free_list.len()
    }

    /// Reserve a skeleton slot, `None` when the storage is full
    pub fn reserve(&mut self) -> Option<usize> {
        let Some(index) = self.free_list.pop() else {
            log::warn!("AnimationStorage exhausted ({} skeletons)", self.capacity());
            return None;
        };
        self.in_use[index] = true;
        Some(index)
    }

    /// Return a skeleton slot
    pub fn release(&mut self, index: usize) {
        if !self.in_use[index] {
            log::warn!("Skeleton {index} released twice");
            return;
        }
        self.in_use[index] = false;
        self.free_list.push(index);
    }

    /// Mutable matrix block of a skeleton
    pub fn element_mut(&mut self, index: usize) -> &mut [[f32; 16]] {
        let start = index * MAX_BONES;
        &mut self.matrices[start..start + MAX_BONES]
    }

    /// Matrix block of a skeleton
    pub fn element(&self, index: usize) -> &[[f32; 16]] {
        let start = index * MAX_BONES;
        &self.matrices[start..start + MAX_BONES]
    }

    /// Queue a skeleton for upload on every frame slot
    pub fn mark_dirty(&mut self, index: usize) {
        for (frame, pending) in self.pending.iter_mut().enumerate() {
            let bit = 1u8 << frame;
            if self.queued[index] & bit == 0 {
                self.queued[index] |= bit;
                pending.push(index);
            }
        }
    }

    /// Copy a pose into a skeleton and queue it for upload
    pub fn write_pose(&mut self, index: usize, pose: &Pose) {
        let block = self.element_mut(index);
        for (dst, src) in block.iter_mut().zip(pose.transforms.iter()) {
            *dst = mat4_to_array(src);
        }
        self.mark_dirty(index);
    }

    /// Upload skeletons changed since the last commit of `frame`.
    ///
    /// Returns `true` when anything was written.
    pub fn commit(&mut self, frame: usize) -> bool {
        if self.pending[frame].is_empty() {
            return false;
        }

        let bit = 1u8 << frame;
        let buffer = self.buffers[frame];
        for index in self.pending[frame].drain(..) {
            self.queued[index] &= !bit;
            let start = index * MAX_BONES;
            let bytes: &[u8] = bytemuck::cast_slice(&self.matrices[start..start + MAX_BONES]);
            self.device.write_buffer(buffer, SKELETON_SIZE * index as u64, bytes);
        }
        true
    }

    /// GPU buffer holding all skeletons for a frame slot
    pub fn buffer(&self, frame: usize) -> BufferId {
        self.buffers[frame]
    }

    /// Binding for one skeleton's range of a frame slot's buffer
    pub fn binding(&self, frame: usize, index: usize) -> Binding {
        Binding::Buffer {
            buffer: self.buffers[frame],
            offset: SKELETON_SIZE * index as u64,
            size: SKELETON_SIZE,
        }
    }
}

impl std::fmt::Debug for AnimationStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationStorage")
            .field("capacity", &self.capacity())
            .field("reserved", &self.reserved())
            .field("buffers", &self.buffers)
            .finish_non_exhaustive()
    }
}

//! Multi-frame deferred deletion.
//!
//! Every resource category has its own [`DeletionRing`] of
//! `frames_in_flight` slots. Condemned items go into the current slot;
//! each [`DeletionQueues::advance`] moves the cursor forward and physically
//! reclaims whatever sits in the slot it lands on, which is the slot filled
//! `frames_in_flight` advances ago.

use log::trace;
use smallvec::SmallVec;

use ember_core::{BufferHandle, GpuDevice, ImageHandle, PipelineHandle, SamplerHandle};

use crate::descriptor::{DescriptorAllocation, DescriptorAllocator};

// ── DeletionRing ───────────────────────────────────────────────────

/// Fixed-depth ring of condemned-item lists.
///
/// An item condemned between two advances is reclaimed by exactly the
/// `depth`-th subsequent [`advance_with`](Self::advance_with) call.
#[derive(Debug)]
pub struct DeletionRing<T> {
    slots: Vec<Vec<T>>,
    cursor: usize,
}

impl<T> DeletionRing<T> {
    /// Create a ring with `depth` slots.
    ///
    /// # Panics
    ///
    /// Panics if `depth == 0`.
    pub fn new(depth: usize) -> Self {
        assert!(depth >= 1, "DeletionRing depth must be >= 1, got {depth}");
        Self {
            slots: (0..depth).map(|_| Vec::new()).collect(),
            cursor: 0,
        }
    }

    /// Number of slots.
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Queue `item` for reclamation `depth` advances from now.
    pub fn condemn(&mut self, item: T) {
        self.slots[self.cursor].push(item);
    }

    /// Rotate by one slot and hand every expired item to `reclaim`.
    ///
    /// Returns the number of items reclaimed.
    pub fn advance_with(&mut self, mut reclaim: impl FnMut(T)) -> usize {
        self.cursor = (self.cursor + 1) % self.slots.len();
        let expired = &mut self.slots[self.cursor];
        let n = expired.len();
        for item in expired.drain(..) {
            reclaim(item);
        }
        n
    }

    /// Hand every queued item to `reclaim` regardless of age, oldest first.
    pub fn drain_all(&mut self, mut reclaim: impl FnMut(T)) -> usize {
        let depth = self.slots.len();
        let mut n = 0;
        let mut slot = self.cursor;
        for _ in 0..depth {
            slot = (slot + 1) % depth;
            n += self.slots[slot].len();
            for item in self.slots[slot].drain(..) {
                reclaim(item);
            }
        }
        n
    }

    /// Items waiting across all slots.
    pub fn pending(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }
}

// ── Condemned items ────────────────────────────────────────────────

/// Physical destruction of a condemned item.
pub trait Reclaim {
    /// Destroy (or return to its pool) every GPU object held by `self`.
    fn reclaim<D: GpuDevice>(self, device: &mut D);
}

/// Per-instance buffers and instance descriptor sets of a renderable.
#[derive(Debug)]
pub struct CondemnedRenderable {
    /// Instance buffers for every swapchain image.
    pub buffers: SmallVec<[BufferHandle; 6]>,
    /// Instance descriptor sets, one per swapchain image.
    pub descriptors: SmallVec<[DescriptorAllocation; 3]>,
}

impl Reclaim for CondemnedRenderable {
    fn reclaim<D: GpuDevice>(self, device: &mut D) {
        for allocation in self.descriptors {
            allocation.free(device);
        }
        for buffer in self.buffers {
            device.destroy_buffer(buffer);
        }
    }
}

/// Vertex and index buffers of a mesh.
#[derive(Debug)]
pub struct CondemnedMesh {
    /// Vertex buffer.
    pub vertex: BufferHandle,
    /// Index buffer.
    pub index: BufferHandle,
}

impl Reclaim for CondemnedMesh {
    fn reclaim<D: GpuDevice>(self, device: &mut D) {
        device.destroy_buffer(self.vertex);
        device.destroy_buffer(self.index);
    }
}

/// Image and sampler of a texture.
#[derive(Debug)]
pub struct CondemnedTexture {
    /// The image and its view.
    pub image: ImageHandle,
    /// The sampler.
    pub sampler: SamplerHandle,
}

impl Reclaim for CondemnedTexture {
    fn reclaim<D: GpuDevice>(self, device: &mut D) {
        device.destroy_sampler(self.sampler);
        device.destroy_image(self.image);
    }
}

/// A material's descriptor set, returned to its pool on expiry.
#[derive(Debug)]
pub struct CondemnedMaterial {
    /// Present when the shader declares sampler bindings.
    pub descriptor: Option<DescriptorAllocation>,
}

impl Reclaim for CondemnedMaterial {
    fn reclaim<D: GpuDevice>(self, device: &mut D) {
        if let Some(allocation) = self.descriptor {
            allocation.free(device);
        }
    }
}

/// A pipeline object with its layouts and descriptor pools.
#[derive(Debug)]
pub struct CondemnedPipeline {
    /// Graphics pipeline object.
    pub handle: PipelineHandle,
    /// Material-scope layout and pools.
    pub material_sets: Option<DescriptorAllocator>,
    /// Instance-scope layout and pools.
    pub instance_sets: Option<DescriptorAllocator>,
}

impl Reclaim for CondemnedPipeline {
    fn reclaim<D: GpuDevice>(self, device: &mut D) {
        device.destroy_pipeline(self.handle);
        if let Some(sets) = self.material_sets {
            sets.destroy(device);
        }
        if let Some(sets) = self.instance_sets {
            sets.destroy(device);
        }
    }
}

// ── DeletionQueues ─────────────────────────────────────────────────

/// Item counts broken down by resource category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    /// Renderables.
    pub renderables: usize,
    /// Materials.
    pub materials: usize,
    /// Textures.
    pub textures: usize,
    /// Meshes.
    pub meshes: usize,
    /// Pipelines.
    pub pipelines: usize,
}

impl CategoryCounts {
    /// Sum over every category.
    pub fn total(&self) -> usize {
        self.renderables + self.materials + self.textures + self.meshes + self.pipelines
    }

    pub(crate) fn accumulate(&mut self, other: CategoryCounts) {
        self.renderables += other.renderables;
        self.materials += other.materials;
        self.textures += other.textures;
        self.meshes += other.meshes;
        self.pipelines += other.pipelines;
    }
}

/// The five per-category deletion rings, all of the same depth.
#[derive(Debug)]
pub struct DeletionQueues {
    pub(crate) renderables: DeletionRing<CondemnedRenderable>,
    pub(crate) materials: DeletionRing<CondemnedMaterial>,
    pub(crate) textures: DeletionRing<CondemnedTexture>,
    pub(crate) meshes: DeletionRing<CondemnedMesh>,
    pub(crate) pipelines: DeletionRing<CondemnedPipeline>,
}

impl DeletionQueues {
    /// Create five rings of `depth` slots.
    pub fn new(depth: usize) -> Self {
        Self {
            renderables: DeletionRing::new(depth),
            materials: DeletionRing::new(depth),
            textures: DeletionRing::new(depth),
            meshes: DeletionRing::new(depth),
            pipelines: DeletionRing::new(depth),
        }
    }

    /// Ring depth shared by every category.
    pub fn depth(&self) -> usize {
        self.renderables.depth()
    }

    /// Rotate every ring and reclaim expired items.
    ///
    /// Renderables and materials are reclaimed before pipelines so their
    /// descriptor sets return to pools that still exist.
    pub fn advance<D: GpuDevice>(&mut self, device: &mut D) -> CategoryCounts {
        let counts = CategoryCounts {
            renderables: self.renderables.advance_with(|r| r.reclaim(device)),
            materials: self.materials.advance_with(|m| m.reclaim(device)),
            textures: self.textures.advance_with(|t| t.reclaim(device)),
            meshes: self.meshes.advance_with(|m| m.reclaim(device)),
            pipelines: self.pipelines.advance_with(|p| p.reclaim(device)),
        };
        trace!("deletion rings advanced, reclaimed {counts:?}");
        counts
    }

    /// Reclaim everything immediately. Only safe once the device is idle.
    pub fn flush<D: GpuDevice>(&mut self, device: &mut D) -> CategoryCounts {
        CategoryCounts {
            renderables: self.renderables.drain_all(|r| r.reclaim(device)),
            materials: self.materials.drain_all(|m| m.reclaim(device)),
            textures: self.textures.drain_all(|t| t.reclaim(device)),
            meshes: self.meshes.drain_all(|m| m.reclaim(device)),
            pipelines: self.pipelines.drain_all(|p| p.reclaim(device)),
        }
    }

    /// Items waiting in each ring.
    pub fn pending(&self) -> CategoryCounts {
        CategoryCounts {
            renderables: self.renderables.pending(),
            materials: self.materials.pending(),
            textures: self.textures.pending(),
            meshes: self.meshes.pending(),
            pipelines: self.pipelines.pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_test_utils::MockDevice;

    fn run(ring: &mut DeletionRing<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        ring.advance_with(|x| out.push(x));
        out
    }

    #[test]
    fn item_survives_exactly_depth_advances() {
        let mut ring = DeletionRing::new(3);
        ring.condemn(7);
        assert!(run(&mut ring).is_empty());
        assert!(run(&mut ring).is_empty());
        assert_eq!(run(&mut ring), vec![7]);
        assert_eq!(ring.pending(), 0);
    }

    #[test]
    fn depth_one_frees_on_next_advance() {
        let mut ring = DeletionRing::new(1);
        ring.condemn(1);
        ring.condemn(2);
        assert_eq!(run(&mut ring), vec![1, 2]);
        assert!(run(&mut ring).is_empty());
    }

    #[test]
    fn staggered_condemns_expire_in_order() {
        let mut ring = DeletionRing::new(2);
        ring.condemn(1);
        assert!(run(&mut ring).is_empty());
        ring.condemn(2);
        assert_eq!(run(&mut ring), vec![1]);
        assert_eq!(run(&mut ring), vec![2]);
    }

    #[test]
    fn drain_all_empties_oldest_first() {
        let mut ring = DeletionRing::new(3);
        ring.condemn(1);
        run(&mut ring);
        ring.condemn(2);
        run(&mut ring);
        ring.condemn(3);
        let mut out = Vec::new();
        assert_eq!(ring.drain_all(|x| out.push(x)), 3);
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(ring.pending(), 0);
    }

    #[test]
    #[should_panic(expected = "depth must be >= 1")]
    fn zero_depth_panics() {
        let _ = DeletionRing::<u32>::new(0);
    }

    #[test]
    fn queues_reclaim_device_objects() {
        let mut device = MockDevice::new();
        let vertex = device.create_test_buffer(64);
        let index = device.create_test_buffer(12);
        let mut queues = DeletionQueues::new(2);
        queues.meshes.condemn(CondemnedMesh { vertex, index });
        assert_eq!(queues.pending().meshes, 1);

        assert_eq!(queues.advance(&mut device).total(), 0);
        assert!(device.is_live_buffer(vertex));

        let reclaimed = queues.advance(&mut device);
        assert_eq!(reclaimed.meshes, 1);
        assert!(!device.is_live_buffer(vertex));
        assert!(!device.is_live_buffer(index));
        assert_eq!(queues.pending(), CategoryCounts::default());
    }

    #[test]
    fn counts_accumulate() {
        let mut total = CategoryCounts::default();
        total.accumulate(CategoryCounts {
            meshes: 2,
            ..CategoryCounts::default()
        });
        total.accumulate(CategoryCounts {
            meshes: 1,
            pipelines: 1,
            ..CategoryCounts::default()
        });
        assert_eq!(total.meshes, 3);
        assert_eq!(total.total(), 4);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_item_reclaimed_after_exactly_depth_advances(
                depth in 1usize..6,
                schedule in prop::collection::vec(0usize..4, 1..40),
            ) {
                let mut ring = DeletionRing::new(depth);
                let mut next = 0u32;
                let mut born = Vec::new();
                let mut frame = 0usize;
                for per_frame in schedule {
                    for _ in 0..per_frame {
                        ring.condemn(next);
                        born.push(frame);
                        next += 1;
                    }
                    frame += 1;
                    let mut freed = Vec::new();
                    ring.advance_with(|x| freed.push(x));
                    for id in freed {
                        prop_assert_eq!(frame - born[id as usize], depth);
                    }
                }
            }
        }
    }
}

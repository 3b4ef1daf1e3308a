//! Test utilities and mock types for Ember development.
//!
//! [`MockDevice`] implements [`GpuDevice`] entirely in memory. It records
//! every live object, panics on double destruction, enforces descriptor
//! pool capacity, and can be told to fail specific calls, so tests can
//! assert exactly when the registry physically frees something.
//! [`MockReflector`] stands in for SPIR-V reflection, and [`fixtures`]
//! builds shaders, meshes and textures.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, HashSet};

use ember_core::{
    BufferDesc, BufferHandle, BufferUsage, DescriptorBinding, DescriptorLayoutHandle,
    DescriptorPoolDesc, DescriptorPoolHandle, DescriptorSetHandle, DescriptorWrite, DeviceError,
    GpuDevice, HandleKind, ImageDesc, ImageHandle, PipelineDesc, PipelineHandle, ReflectError,
    SamplerDesc, SamplerHandle, ShaderCode, ShaderReflection, ShaderReflector,
};

struct MockBuffer {
    desc: BufferDesc,
    contents: Option<Vec<u8>>,
}

struct MockPool {
    max_sets: u32,
    sets: HashSet<DescriptorSetHandle>,
}

struct MockSet {
    pool: DescriptorPoolHandle,
    writes: Vec<DescriptorWrite>,
}

/// In-memory [`GpuDevice`].
///
/// Every handle value is unique across kinds. Destroying or freeing a
/// handle that is not live panics, which turns double frees in the code
/// under test into test failures.
#[derive(Default)]
pub struct MockDevice {
    next: u64,
    buffers: HashMap<BufferHandle, MockBuffer>,
    images: HashMap<ImageHandle, ImageDesc>,
    mips: HashMap<ImageHandle, u32>,
    samplers: HashSet<SamplerHandle>,
    layouts: HashMap<DescriptorLayoutHandle, Vec<DescriptorBinding>>,
    pools: HashMap<DescriptorPoolHandle, MockPool>,
    sets: HashMap<DescriptorSetHandle, MockSet>,
    pipelines: HashMap<PipelineHandle, Vec<DescriptorLayoutHandle>>,
    destroyed: HashMap<HandleKind, usize>,
    uploads: usize,
    pool_limit: Option<u32>,
    buffer_budget: Option<usize>,
    fail_pool: bool,
    fail_pipeline: bool,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every pool created from now on at `max_sets` sets, regardless
    /// of what the caller asks for.
    pub fn with_pool_limit(mut self, max_sets: u32) -> Self {
        self.pool_limit = Some(max_sets);
        self
    }

    // ── Failure injection ─────────────────────────────────────────

    /// Let `n` more buffer creations succeed, then fail the next one with
    /// [`DeviceError::OutOfMemory`].
    pub fn fail_buffer_after(&mut self, n: usize) {
        self.buffer_budget = Some(n);
    }

    /// Fail the next descriptor pool creation.
    pub fn fail_next_descriptor_pool(&mut self) {
        self.fail_pool = true;
    }

    /// Fail the next pipeline creation.
    pub fn fail_next_pipeline(&mut self) {
        self.fail_pipeline = true;
    }

    // ── Inspection ────────────────────────────────────────────────

    /// A host-visible uniform buffer for tests that need a raw handle.
    pub fn create_test_buffer(&mut self, size: u64) -> BufferHandle {
        self.create_buffer(&BufferDesc {
            size,
            usage: BufferUsage::Uniform,
            location: ember_core::MemoryLocation::HostVisible,
        })
        .expect("mock buffer creation")
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_images(&self) -> usize {
        self.images.len()
    }

    pub fn live_samplers(&self) -> usize {
        self.samplers.len()
    }

    pub fn live_descriptor_layouts(&self) -> usize {
        self.layouts.len()
    }

    pub fn live_descriptor_pools(&self) -> usize {
        self.pools.len()
    }

    pub fn live_descriptor_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Every object this device minted that is still alive.
    pub fn live_objects(&self) -> usize {
        self.live_buffers()
            + self.live_images()
            + self.live_samplers()
            + self.live_descriptor_layouts()
            + self.live_descriptor_pools()
            + self.live_descriptor_sets()
            + self.live_pipelines()
    }

    pub fn is_live_buffer(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer)
    }

    pub fn is_live_image(&self, image: ImageHandle) -> bool {
        self.images.contains_key(&image)
    }

    pub fn is_live_descriptor_set(&self, set: DescriptorSetHandle) -> bool {
        self.sets.contains_key(&set)
    }

    pub fn is_live_pipeline(&self, pipeline: PipelineHandle) -> bool {
        self.pipelines.contains_key(&pipeline)
    }

    /// How many objects of `kind` have been destroyed (sets count when freed).
    pub fn destroyed(&self, kind: HandleKind) -> usize {
        self.destroyed.get(&kind).copied().unwrap_or(0)
    }

    /// Number of staging uploads performed.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Bytes written into a live buffer, or `None` if never written.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer)?.contents.as_deref()
    }

    /// Mip levels generated for a live image.
    pub fn mip_levels(&self, image: ImageHandle) -> Option<u32> {
        self.mips.get(&image).copied()
    }

    /// Writes applied to a live descriptor set, in order.
    pub fn writes_to(&self, set: DescriptorSetHandle) -> &[DescriptorWrite] {
        self.sets.get(&set).map_or(&[], |s| s.writes.as_slice())
    }

    /// Set layouts a live pipeline was created with.
    pub fn pipeline_layouts(&self, pipeline: PipelineHandle) -> &[DescriptorLayoutHandle] {
        self.pipelines.get(&pipeline).map_or(&[], Vec::as_slice)
    }

    /// Sets currently allocated from `pool`.
    pub fn pool_occupancy(&self, pool: DescriptorPoolHandle) -> Option<usize> {
        self.pools.get(&pool).map(|p| p.sets.len())
    }

    fn mint(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    fn record_destroy(&mut self, kind: HandleKind) {
        *self.destroyed.entry(kind).or_insert(0) += 1;
    }
}

fn invalid(kind: HandleKind, raw: u64) -> DeviceError {
    DeviceError::InvalidHandle { kind, raw }
}

impl GpuDevice for MockDevice {
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle, DeviceError> {
        match self.buffer_budget {
            Some(0) => {
                self.buffer_budget = None;
                return Err(DeviceError::OutOfMemory {
                    requested: desc.size,
                });
            }
            Some(n) => self.buffer_budget = Some(n - 1),
            None => {}
        }
        let handle = BufferHandle(self.mint());
        self.buffers.insert(
            handle,
            MockBuffer {
                desc: *desc,
                contents: None,
            },
        );
        Ok(handle)
    }

    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let buf = self
            .buffers
            .get_mut(&buffer)
            .ok_or(invalid(HandleKind::Buffer, buffer.0))?;
        let end = offset + data.len() as u64;
        if end > buf.desc.size {
            return Err(DeviceError::CreationFailed {
                reason: format!("write of {end} bytes past end of {buffer} ({})", buf.desc.size),
            });
        }
        let contents = buf.contents.get_or_insert_with(Vec::new);
        if contents.len() < end as usize {
            contents.resize(end as usize, 0);
        }
        contents[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        assert!(
            self.buffers.remove(&buffer).is_some(),
            "MockDevice: destroy of dead {buffer}"
        );
        self.record_destroy(HandleKind::Buffer);
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle, DeviceError> {
        let handle = ImageHandle(self.mint());
        self.images.insert(handle, *desc);
        Ok(handle)
    }

    fn destroy_image(&mut self, image: ImageHandle) {
        assert!(
            self.images.remove(&image).is_some(),
            "MockDevice: destroy of dead {image}"
        );
        self.mips.remove(&image);
        self.record_destroy(HandleKind::Image);
    }

    fn create_sampler(&mut self, _desc: &SamplerDesc) -> Result<SamplerHandle, DeviceError> {
        let handle = SamplerHandle(self.mint());
        self.samplers.insert(handle);
        Ok(handle)
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) {
        assert!(
            self.samplers.remove(&sampler),
            "MockDevice: destroy of dead {sampler}"
        );
        self.record_destroy(HandleKind::Sampler);
    }

    fn upload_buffer(
        &mut self,
        staging: BufferHandle,
        dst: BufferHandle,
        size: u64,
    ) -> Result<(), DeviceError> {
        let src = self
            .buffers
            .get(&staging)
            .ok_or(invalid(HandleKind::Buffer, staging.0))?;
        let bytes = src.contents.clone().unwrap_or_default();
        let dst_buf = self
            .buffers
            .get_mut(&dst)
            .ok_or(invalid(HandleKind::Buffer, dst.0))?;
        if size > dst_buf.desc.size {
            return Err(DeviceError::CreationFailed {
                reason: format!("upload of {size} bytes into {dst} ({})", dst_buf.desc.size),
            });
        }
        dst_buf.contents = Some(bytes);
        self.uploads += 1;
        Ok(())
    }

    fn upload_image(
        &mut self,
        staging: BufferHandle,
        dst: ImageHandle,
        size: u64,
    ) -> Result<(), DeviceError> {
        let src = self
            .buffers
            .get(&staging)
            .ok_or(invalid(HandleKind::Buffer, staging.0))?;
        let desc = self
            .images
            .get(&dst)
            .ok_or(invalid(HandleKind::Image, dst.0))?;
        let base = u64::from(desc.width)
            * u64::from(desc.height)
            * u64::from(desc.format.bytes_per_pixel());
        if size != base || size > src.desc.size {
            return Err(DeviceError::CreationFailed {
                reason: format!(
                    "upload of {size} bytes into {dst} (base level {base}, staging {})",
                    src.desc.size
                ),
            });
        }
        self.uploads += 1;
        Ok(())
    }

    fn generate_mips(&mut self, image: ImageHandle, levels: u32) -> Result<(), DeviceError> {
        let desc = self
            .images
            .get(&image)
            .ok_or(invalid(HandleKind::Image, image.0))?;
        if levels > desc.mip_levels {
            return Err(DeviceError::CreationFailed {
                reason: format!("{levels} mips requested, {image} has {}", desc.mip_levels),
            });
        }
        self.mips.insert(image, levels);
        Ok(())
    }

    fn create_descriptor_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorLayoutHandle, DeviceError> {
        let handle = DescriptorLayoutHandle(self.mint());
        self.layouts.insert(handle, bindings.to_vec());
        Ok(handle)
    }

    fn destroy_descriptor_layout(&mut self, layout: DescriptorLayoutHandle) {
        assert!(
            self.layouts.remove(&layout).is_some(),
            "MockDevice: destroy of dead {layout}"
        );
        self.record_destroy(HandleKind::DescriptorLayout);
    }

    fn create_descriptor_pool(
        &mut self,
        desc: &DescriptorPoolDesc,
    ) -> Result<DescriptorPoolHandle, DeviceError> {
        if std::mem::take(&mut self.fail_pool) {
            return Err(DeviceError::CreationFailed {
                reason: "injected descriptor pool failure".into(),
            });
        }
        let max_sets = self
            .pool_limit
            .map_or(desc.max_sets, |limit| limit.min(desc.max_sets));
        let handle = DescriptorPoolHandle(self.mint());
        self.pools.insert(
            handle,
            MockPool {
                max_sets,
                sets: HashSet::new(),
            },
        );
        Ok(handle)
    }

    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle) {
        let Some(removed) = self.pools.remove(&pool) else {
            panic!("MockDevice: destroy of dead {pool}");
        };
        for set in removed.sets {
            self.sets.remove(&set);
        }
        self.record_destroy(HandleKind::DescriptorPool);
    }

    fn allocate_descriptor_set(
        &mut self,
        pool: DescriptorPoolHandle,
        layout: DescriptorLayoutHandle,
    ) -> Result<DescriptorSetHandle, DeviceError> {
        if !self.layouts.contains_key(&layout) {
            return Err(invalid(HandleKind::DescriptorLayout, layout.0));
        }
        let next = self.next + 1;
        let p = self
            .pools
            .get_mut(&pool)
            .ok_or(invalid(HandleKind::DescriptorPool, pool.0))?;
        if p.sets.len() >= p.max_sets as usize {
            return Err(DeviceError::PoolExhausted);
        }
        let handle = DescriptorSetHandle(next);
        p.sets.insert(handle);
        self.next = next;
        self.sets.insert(
            handle,
            MockSet {
                pool,
                writes: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn free_descriptor_set(&mut self, pool: DescriptorPoolHandle, set: DescriptorSetHandle) {
        let owner = self.sets.remove(&set).map(|s| s.pool);
        assert_eq!(
            owner,
            Some(pool),
            "MockDevice: {set} freed to {pool} but belongs to {owner:?}"
        );
        if let Some(p) = self.pools.get_mut(&pool) {
            p.sets.remove(&set);
        }
        self.record_destroy(HandleKind::DescriptorSet);
    }

    fn write_descriptor_set(&mut self, set: DescriptorSetHandle, writes: &[DescriptorWrite]) {
        let Some(s) = self.sets.get_mut(&set) else {
            panic!("MockDevice: write to dead {set}");
        };
        s.writes.extend_from_slice(writes);
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, DeviceError> {
        if std::mem::take(&mut self.fail_pipeline) {
            return Err(DeviceError::CreationFailed {
                reason: "injected pipeline failure".into(),
            });
        }
        let handle = PipelineHandle(self.mint());
        self.pipelines.insert(handle, desc.set_layouts.to_vec());
        Ok(handle)
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        assert!(
            self.pipelines.remove(&pipeline).is_some(),
            "MockDevice: destroy of dead {pipeline}"
        );
        self.record_destroy(HandleKind::Pipeline);
    }
}

/// [`ShaderReflector`] that returns a fixed reflection for any non-empty
/// bytecode.
pub struct MockReflector {
    reflection: ShaderReflection,
}

impl MockReflector {
    pub fn new(reflection: ShaderReflection) -> Self {
        Self { reflection }
    }
}

impl ShaderReflector for MockReflector {
    fn reflect(&self, code: &ShaderCode) -> Result<ShaderReflection, ReflectError> {
        if code.vertex.is_empty() || code.fragment.is_empty() {
            return Err(ReflectError::InvalidBytecode {
                reason: "empty shader stage".into(),
            });
        }
        Ok(self.reflection.clone())
    }
}

//! The [`GpuDevice`] capability trait and its creation descriptors.
//!
//! The registry never talks to a graphics API directly. It is constructed
//! with a value implementing [`GpuDevice`] and passes it down to every
//! creation and destruction call, so there is no process-wide device handle.
//!
//! Upload and mip generation are treated as complete by the time they
//! return; any queue synchronisation they need is the implementation's
//! concern.

use crate::error::DeviceError;
use crate::handle::{
    BufferHandle, DescriptorLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle, ImageHandle,
    PipelineHandle, RenderPassHandle, SamplerHandle,
};
use crate::asset::TextureFormat;
use crate::shader::{BindingKind, DescriptorBinding, ShaderCode, VertexLayout};

/// How a buffer will be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex input.
    Vertex,
    /// Index input.
    Index,
    /// Uniform buffer binding.
    Uniform,
    /// Storage buffer binding.
    Storage,
    /// Transfer source for uploads.
    Staging,
}

/// Where a buffer's memory lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    /// Device-local, not CPU-mappable.
    DeviceLocal,
    /// CPU-writable.
    HostVisible,
}

/// Parameters for [`GpuDevice::create_buffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDesc {
    /// Size in bytes.
    pub size: u64,
    /// Intended usage.
    pub usage: BufferUsage,
    /// Memory placement.
    pub location: MemoryLocation,
}

/// Parameters for [`GpuDevice::create_image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of mip levels to allocate.
    pub mip_levels: u32,
    /// Pixel format.
    pub format: TextureFormat,
}

/// Parameters for [`GpuDevice::create_sampler`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    /// Highest mip level the sampler may read.
    pub max_lod: f32,
    /// Maximum anisotropy; 1.0 disables anisotropic filtering.
    pub anisotropy: f32,
}

/// Parameters for [`GpuDevice::create_descriptor_pool`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorPoolDesc {
    /// Maximum number of sets the pool can hold.
    pub max_sets: u32,
    /// Descriptor counts per binding kind, already multiplied by `max_sets`.
    pub sizes: Vec<(BindingKind, u32)>,
}

/// One write into a descriptor set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorWrite {
    /// Bind a whole buffer to a uniform or storage binding.
    Buffer {
        /// Binding number.
        binding: u32,
        /// Buffer to bind.
        buffer: BufferHandle,
        /// Bytes visible through the binding.
        range: u64,
    },
    /// Bind an image and sampler to a combined-image-sampler binding.
    Image {
        /// Binding number.
        binding: u32,
        /// Image to bind.
        image: ImageHandle,
        /// Sampler to bind.
        sampler: SamplerHandle,
    },
}

/// Parameters for [`GpuDevice::create_pipeline`].
#[derive(Clone, Copy, Debug)]
pub struct PipelineDesc<'a> {
    /// Render pass the pipeline is compatible with.
    pub render_pass: RenderPassHandle,
    /// Set layouts in set-number order: fixed pass sets, then the
    /// pipeline's own sets.
    pub set_layouts: &'a [DescriptorLayoutHandle],
    /// Vertex input layout.
    pub vertex: &'a VertexLayout,
    /// Shader bytecode.
    pub code: &'a ShaderCode,
}

/// Resource creation primitives of a graphics device.
///
/// Destroy calls are infallible: by the time the registry issues one, the
/// deferred-deletion delay guarantees no in-flight command buffer can still
/// reference the object.
pub trait GpuDevice {
    /// Create a buffer.
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle, DeviceError>;

    /// Copy `data` into a host-visible buffer at `offset`.
    fn write_buffer(
        &mut self,
        buffer: BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Destroy a buffer.
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Create an image with its default view.
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle, DeviceError>;

    /// Destroy an image and its view.
    fn destroy_image(&mut self, image: ImageHandle);

    /// Create a sampler.
    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle, DeviceError>;

    /// Destroy a sampler.
    fn destroy_sampler(&mut self, sampler: SamplerHandle);

    /// Transfer-queue copy of `size` bytes from a staging buffer into a
    /// device-local buffer.
    fn upload_buffer(
        &mut self,
        staging: BufferHandle,
        dst: BufferHandle,
        size: u64,
    ) -> Result<(), DeviceError>;

    /// Transfer-queue copy of `size` bytes from a staging buffer into mip 0
    /// of an image.
    fn upload_image(
        &mut self,
        staging: BufferHandle,
        dst: ImageHandle,
        size: u64,
    ) -> Result<(), DeviceError>;

    /// Graphics-queue blit chain filling mips `1..levels` from mip 0.
    fn generate_mips(&mut self, image: ImageHandle, levels: u32) -> Result<(), DeviceError>;

    /// Create a descriptor-set layout. Bindings all belong to one set.
    fn create_descriptor_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorLayoutHandle, DeviceError>;

    /// Destroy a descriptor-set layout.
    fn destroy_descriptor_layout(&mut self, layout: DescriptorLayoutHandle);

    /// Create a descriptor pool.
    fn create_descriptor_pool(
        &mut self,
        desc: &DescriptorPoolDesc,
    ) -> Result<DescriptorPoolHandle, DeviceError>;

    /// Destroy a descriptor pool and every set still allocated from it.
    fn destroy_descriptor_pool(&mut self, pool: DescriptorPoolHandle);

    /// Allocate one set from `pool`.
    ///
    /// Returns [`DeviceError::PoolExhausted`] when the pool is full; the
    /// caller is expected to recover by allocating from another pool.
    fn allocate_descriptor_set(
        &mut self,
        pool: DescriptorPoolHandle,
        layout: DescriptorLayoutHandle,
    ) -> Result<DescriptorSetHandle, DeviceError>;

    /// Return a set to the pool it was allocated from.
    fn free_descriptor_set(&mut self, pool: DescriptorPoolHandle, set: DescriptorSetHandle);

    /// Apply writes to a descriptor set.
    fn write_descriptor_set(&mut self, set: DescriptorSetHandle, writes: &[DescriptorWrite]);

    /// Create a graphics pipeline.
    fn create_pipeline(&mut self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, DeviceError>;

    /// Destroy a graphics pipeline.
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);
}

//! Core types and traits for the Ember GPU resource registry.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: registry ids, opaque GPU
//! handles, the [`GpuDevice`] and [`ShaderReflector`] capability traits that
//! the registry is threaded with, asset payloads, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod asset;
pub mod device;
pub mod error;
pub mod handle;
pub mod id;
pub mod shader;
pub mod transform;

pub use asset::{MeshData, TextureData, TextureFormat};
pub use device::{
    BufferDesc, BufferUsage, DescriptorPoolDesc, DescriptorWrite, GpuDevice, ImageDesc,
    MemoryLocation, PipelineDesc, SamplerDesc,
};
pub use error::{DeviceError, ReflectError, RegistryError};
pub use handle::{
    BufferHandle, DescriptorLayoutHandle, DescriptorPoolHandle, DescriptorSetHandle, HandleKind,
    ImageHandle, PipelineHandle, RenderPassHandle, SamplerHandle,
};
pub use id::{MaterialId, MeshId, PipelineId, RenderableId, TextureId};
pub use shader::{
    BindingKind, DescriptorBinding, Shader, ShaderCode, ShaderReflection, ShaderReflector,
    VertexAttribute, VertexFormat, VertexLayout,
};
pub use transform::{InstanceTransform, SharedTransform};

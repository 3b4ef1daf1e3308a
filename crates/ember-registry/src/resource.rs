//! Shared GPU resources owned directly by the registry.

use ember_core::{BufferHandle, ImageHandle, SamplerHandle};

use crate::deletion::{CondemnedMesh, CondemnedTexture};

/// Device-local vertex and index buffers of an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuMesh {
    /// Vertex buffer.
    pub vertex: BufferHandle,
    /// Index buffer.
    pub index: BufferHandle,
    /// Vertices in `vertex`.
    pub vertex_count: u32,
    /// Indices in `index`.
    pub index_count: u32,
}

impl GpuMesh {
    pub(crate) fn condemn(self) -> CondemnedMesh {
        CondemnedMesh {
            vertex: self.vertex,
            index: self.index,
        }
    }
}

/// An uploaded, fully mipmapped image with its sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GpuTexture {
    /// Image and default view.
    pub image: ImageHandle,
    /// Sampler covering every mip level.
    pub sampler: SamplerHandle,
    /// Levels in the mip chain.
    pub mip_levels: u32,
}

impl GpuTexture {
    pub(crate) fn condemn(self) -> CondemnedTexture {
        CondemnedTexture {
            image: self.image,
            sampler: self.sampler,
        }
    }
}

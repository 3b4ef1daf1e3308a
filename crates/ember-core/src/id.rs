//! Strongly-typed registry identifiers.
//!
//! Ids are plain indices into the registry's containers; they carry no
//! pointers and stay valid until the registry reports the resource deleted.
//! Materials and renderables live inside their parent's container, so their
//! ids carry the parent path.

use std::fmt;

/// Identifies a graphics pipeline within a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u32);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PipelineId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an uploaded vertex/index buffer pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MeshId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an uploaded image with its sampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TextureId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a material inside its owning pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId {
    /// The pipeline that owns this material.
    pub pipeline: PipelineId,
    /// Index into the pipeline's material table.
    pub index: u32,
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pipeline, self.index)
    }
}

/// Identifies a drawable instance within a (material, mesh) group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId {
    /// The material the renderable is drawn with.
    pub material: MaterialId,
    /// The mesh the renderable draws.
    pub mesh: MeshId,
    /// Index into the mesh group's renderable table.
    pub index: u32,
}

impl RenderableId {
    /// The pipeline that transitively owns this renderable.
    pub fn pipeline(&self) -> PipelineId {
        self.material.pipeline
    }
}

impl fmt::Display for RenderableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/m{}.{}", self.material, self.mesh, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_parent_path() {
        let material = MaterialId {
            pipeline: PipelineId(2),
            index: 5,
        };
        let renderable = RenderableId {
            material,
            mesh: MeshId(7),
            index: 1,
        };
        assert_eq!(material.to_string(), "2.5");
        assert_eq!(renderable.to_string(), "2.5/m7.1");
        assert_eq!(renderable.pipeline(), PipelineId(2));
    }

    #[test]
    fn ids_order_by_parent_first() {
        let a = MaterialId {
            pipeline: PipelineId(0),
            index: 9,
        };
        let b = MaterialId {
            pipeline: PipelineId(1),
            index: 0,
        };
        assert!(a < b);
    }
}

//! Deletion events reported by [`Registry::destroy_renderable`](crate::Registry::destroy_renderable).

use std::fmt;

use ember_core::{MaterialId, MeshId, PipelineId, RenderableId, TextureId};

/// A resource that left the registry's logical ownership.
///
/// The id is dead as soon as the event is returned, even though the GPU
/// objects behind it are only reclaimed after the deferred-deletion delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeletionEvent {
    /// The renderable itself.
    Renderable(RenderableId),
    /// A mesh whose last mesh group went away.
    Mesh(MeshId),
    /// A texture whose last material went away.
    Texture(TextureId),
    /// A material whose last mesh group went away.
    Material(MaterialId),
    /// A pipeline whose last material went away.
    Pipeline(PipelineId),
}

impl fmt::Display for DeletionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Renderable(id) => write!(f, "renderable {id}"),
            Self::Mesh(id) => write!(f, "mesh {id}"),
            Self::Texture(id) => write!(f, "texture {id}"),
            Self::Material(id) => write!(f, "material {id}"),
            Self::Pipeline(id) => write!(f, "pipeline {id}"),
        }
    }
}

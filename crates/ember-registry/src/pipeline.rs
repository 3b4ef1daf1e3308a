//! Graphics pipelines and the materials they own.

use ember_arena::DenseTable;
use ember_core::PipelineHandle;

use crate::bindings::ShaderBindings;
use crate::deletion::CondemnedPipeline;
use crate::descriptor::DescriptorAllocator;
use crate::material::Material;

/// A graphics pipeline with its per-scope descriptor allocators.
#[derive(Debug)]
pub struct Pipeline {
    pub(crate) handle: PipelineHandle,
    pub(crate) name: String,
    pub(crate) bindings: ShaderBindings,
    pub(crate) material_sets: Option<DescriptorAllocator>,
    pub(crate) instance_sets: Option<DescriptorAllocator>,
    pub(crate) materials: DenseTable<Material>,
}

impl Pipeline {
    /// The device pipeline object.
    pub fn handle(&self) -> PipelineHandle {
        self.handle
    }

    /// Name of the shader the pipeline was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shader's per-pipeline bindings.
    pub fn bindings(&self) -> &ShaderBindings {
        &self.bindings
    }

    /// Materials allocated against this pipeline.
    pub fn materials(&self) -> &DenseTable<Material> {
        &self.materials
    }

    /// Descriptor pools created so far across both scopes.
    pub fn descriptor_pools(&self) -> usize {
        self.material_sets.as_ref().map_or(0, DescriptorAllocator::pool_count)
            + self.instance_sets.as_ref().map_or(0, DescriptorAllocator::pool_count)
    }

    pub(crate) fn condemn(self) -> CondemnedPipeline {
        CondemnedPipeline {
            handle: self.handle,
            material_sets: self.material_sets,
            instance_sets: self.instance_sets,
        }
    }
}

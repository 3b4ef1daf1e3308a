//! Opaque GPU object handles.
//!
//! Handles are minted by a [`GpuDevice`](crate::device::GpuDevice)
//! implementation and are meaningless to everything else. The registry only
//! stores, compares, and hands them back to the device.

use std::fmt;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// The category this handle belongs to.
            pub const KIND: HandleKind = HandleKind::$kind;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", HandleKind::$kind, self.0)
            }
        }
    };
}

/// The category of a GPU handle, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A buffer object.
    Buffer,
    /// An image together with its default view.
    Image,
    /// A sampler object.
    Sampler,
    /// A descriptor-set layout.
    DescriptorLayout,
    /// A descriptor pool.
    DescriptorPool,
    /// A descriptor set allocated from a pool.
    DescriptorSet,
    /// A graphics pipeline object.
    Pipeline,
    /// A render pass supplied by the renderer.
    RenderPass,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buffer => "buffer",
            Self::Image => "image",
            Self::Sampler => "sampler",
            Self::DescriptorLayout => "descriptor-layout",
            Self::DescriptorPool => "descriptor-pool",
            Self::DescriptorSet => "descriptor-set",
            Self::Pipeline => "pipeline",
            Self::RenderPass => "render-pass",
        };
        f.write_str(name)
    }
}

gpu_handle!(
    /// A device buffer (vertex, index, uniform, storage, or staging).
    BufferHandle,
    Buffer
);
gpu_handle!(
    /// A device image and its view.
    ImageHandle,
    Image
);
gpu_handle!(
    /// A texture sampler.
    SamplerHandle,
    Sampler
);
gpu_handle!(
    /// A descriptor-set layout.
    DescriptorLayoutHandle,
    DescriptorLayout
);
gpu_handle!(
    /// A descriptor pool.
    DescriptorPoolHandle,
    DescriptorPool
);
gpu_handle!(
    /// A descriptor set. Must be returned to the pool it came from.
    DescriptorSetHandle,
    DescriptorSet
);
gpu_handle!(
    /// A graphics pipeline object.
    PipelineHandle,
    Pipeline
);
gpu_handle!(
    /// A render pass owned by the renderer, not the registry.
    RenderPassHandle,
    RenderPass
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        assert_eq!(BufferHandle(3).to_string(), "buffer#3");
        assert_eq!(DescriptorSetHandle(12).to_string(), "descriptor-set#12");
        assert_eq!(PipelineHandle::KIND, HandleKind::Pipeline);
    }
}

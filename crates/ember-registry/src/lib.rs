//! GPU resource registry with multi-frame deferred deletion.
//!
//! [`Registry`] creates pipelines, meshes, textures, materials and
//! renderables through a [`GpuDevice`](ember_core::GpuDevice), tracks how
//! many owners each shared resource has, and delays the physical
//! destruction of anything released until no in-flight frame can still
//! reference it.
//!
//! # Frame loop
//!
//! ```text
//! loop {
//!     acquire swapchain image, wait on its fence
//!     registry.advance_frame()          // reclaim what aged out
//!     allocate / destroy for this frame
//!     registry.write_instances(image)
//!     record registry.draws(image)
//!     submit
//! }
//! registry.shutdown()                  // after the device is idle
//! ```
//!
//! # Ownership
//!
//! Pipelines own materials, materials own mesh groups (one per mesh, in
//! mesh-id order), mesh groups own renderables. Meshes and textures belong
//! to the registry and are reference-counted by mesh groups and materials
//! respectively. [`Registry::destroy_renderable`] walks that hierarchy
//! upwards, stopping at the first level that still has children.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bindings;
pub mod config;
pub mod deletion;
pub mod descriptor;
pub mod event;
mod lifecycle;
pub mod material;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod renderable;
pub mod resource;

pub use bindings::ShaderBindings;
pub use config::{ConfigError, FixedBinding, FixedPassLayout, RegistryConfig};
pub use deletion::{CategoryCounts, DeletionQueues, DeletionRing};
pub use descriptor::{DescriptorAllocation, DescriptorAllocator};
pub use event::DeletionEvent;
pub use material::{Material, MeshGroup};
pub use metrics::RegistryMetrics;
pub use pipeline::Pipeline;
pub use registry::{DrawItem, Registry};
pub use renderable::Renderable;
pub use resource::{GpuMesh, GpuTexture};

//! Ember: GPU resource lifetime management for real-time renderers.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Ember sub-crates. Most renderers only need `ember` as a dependency,
//! plus an implementation of [`prelude::GpuDevice`] for their graphics API.
//!
//! # Quick start
//!
//! ```rust
//! use ember::prelude::*;
//! use ember_test_utils::{fixtures, MockDevice};
//!
//! let config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
//! let mut registry = Registry::new(MockDevice::new(), config).unwrap();
//! let mut cache = ResourceCache::new();
//!
//! let pipeline = cache.pipeline(&mut registry, &fixtures::shader("lit", 1, 1)).unwrap();
//! let texture = cache.texture(&mut registry, &fixtures::checker(4, 4)).unwrap();
//! let material = cache.material(&mut registry, pipeline, &[texture]).unwrap();
//! let mesh = cache.mesh(&mut registry, &fixtures::triangle()).unwrap();
//! let renderable = registry.allocate_renderable(material, mesh).unwrap();
//! assert_eq!(registry.draws(0).count(), 1);
//!
//! // Destroying the only renderable releases everything above it.
//! let events = registry.destroy_renderable(renderable);
//! assert_eq!(cache.evict(&events), 4);
//!
//! // The GPU objects survive until no in-flight frame can use them.
//! for _ in 0..registry.config().frames_in_flight {
//!     registry.advance_frame();
//! }
//! assert_eq!(registry.device().live_objects(), 0);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ember-core` | Ids, GPU handles, the device and reflector traits, errors |
//! | [`arena`] | `ember-arena` | `StableArena` and `DenseTable` |
//! | [`registry`] | `ember-registry` | `Registry`, deletion rings, descriptor pools |
//! | [`cache`] | `ember-cache` | Content hashing and the deduplicating `ResourceCache` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and ids (`ember-core`).
///
/// Contains the [`types::GpuDevice`] capability trait that a renderer
/// implements over its graphics API, and the shader reflection model.
pub use ember_core as types;

/// Index-stable storage (`ember-arena`).
pub use ember_arena as arena;

/// The resource registry (`ember-registry`).
///
/// [`registry::Registry`] owns every resource, and
/// [`registry::DeletionQueues`] delays their destruction.
pub use ember_registry as registry;

/// Asset deduplication (`ember-cache`).
pub use ember_cache as cache;

/// Common imports for typical Ember usage.
///
/// ```rust
/// use ember::prelude::*;
/// ```
pub mod prelude {
    // Ids and handles
    pub use ember_core::{
        MaterialId, MeshId, PipelineId, RenderPassHandle, RenderableId, TextureId,
    };

    // Device seam and assets
    pub use ember_core::{
        GpuDevice, InstanceTransform, MeshData, Shader, ShaderReflector, SharedTransform,
        TextureData, TextureFormat,
    };

    // Errors
    pub use ember_core::{DeviceError, ReflectError, RegistryError};

    // Registry
    pub use ember_registry::{
        ConfigError, DeletionEvent, DrawItem, FixedBinding, FixedPassLayout, Registry,
        RegistryConfig, RegistryMetrics,
    };

    // Cache
    pub use ember_cache::{ContentHash, ResourceCache};
}

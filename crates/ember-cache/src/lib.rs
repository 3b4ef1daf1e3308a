//! Asset-to-resource deduplication for the Ember registry.
//!
//! The registry creates a fresh resource on every call. [`ResourceCache`]
//! sits in front of it and maps the content hash of each asset to the id
//! it was first uploaded as, so loading the same mesh twice yields one
//! vertex buffer. Deletion events returned by the registry keep the cache
//! from handing out released ids.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod hash;

pub use cache::{CacheStats, ResourceCache};
pub use hash::{hash_material, hash_mesh, hash_shader, hash_texture, ContentHash, Fnv1a};

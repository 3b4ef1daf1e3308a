//! Index-based containers for GPU resource bookkeeping.
//!
//! Both containers hand out plain `u32` indices instead of references, so
//! callers can store them in other records without borrowing the container.
//!
//! # Containers
//!
//! ```text
//! StableArena<T>   slots: [Occupied | Free(next) | Occupied | ...]
//!                  free list threaded through the vacant slots
//!
//! DenseTable<T>    sparse:     index -> dense position | Free(next)
//!                  dense:      [T, T, T]   (packed, swap-removed)
//!                  sparse_ref: dense position -> index
//! ```
//!
//! - [`StableArena`]: O(1) insert/remove, indices never move, iteration skips
//!   holes. Used for meshes, textures and their refcounts.
//! - [`DenseTable`]: O(1) insert/remove-by-swap, contiguous iteration over
//!   the live set. Used for pipelines, materials and renderables, which the
//!   draw traversal walks every frame.
//!
//! Dereferencing an index that is out of range or has been removed is a
//! contract violation and panics. The `try_*` variants report the same
//! conditions as [`ArenaError`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dense;
pub mod error;
pub mod stable;

pub use dense::DenseTable;
pub use error::ArenaError;
pub use stable::StableArena;

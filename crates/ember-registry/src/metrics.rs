//! Registry occupancy and reclamation counters.
//!
//! [`RegistryMetrics`] is computed on demand by
//! [`Registry::metrics()`](crate::Registry::metrics); nothing is tracked
//! per call beyond the cumulative reclaimed counts.

use crate::deletion::CategoryCounts;

/// A point-in-time view of what the registry holds.
///
/// `live` counts resources with a valid id. `pending` counts condemned
/// items still waiting in the deletion rings; their ids are already dead
/// but their GPU objects are not yet reclaimed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryMetrics {
    /// Resources currently addressable by id.
    pub live: CategoryCounts,
    /// Condemned items per deletion ring.
    pub pending: CategoryCounts,
    /// Items physically reclaimed since construction.
    pub reclaimed: CategoryCounts,
    /// Descriptor pools created across every live pipeline.
    pub descriptor_pools: usize,
    /// Number of `advance_frame()` calls so far.
    pub frame: u64,
}

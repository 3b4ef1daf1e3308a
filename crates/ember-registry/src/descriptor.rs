//! Descriptor-set allocation with on-demand pool growth.
//!
//! A [`DescriptorAllocator`] owns one descriptor-set layout and a growing
//! list of pools built for it. Running out of room in the current pool is
//! not an error for the caller: the allocator moves on to the other pools,
//! which regain room as expired sets are returned to them, and only
//! creates another pool of the same size once every pool is full.

use log::{debug, warn};

use ember_core::{
    BindingKind, DescriptorBinding, DescriptorLayoutHandle, DescriptorPoolDesc,
    DescriptorPoolHandle, DescriptorSetHandle, DeviceError, GpuDevice,
};

/// A set together with the pool it must be returned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorAllocation {
    /// The owning pool.
    pub pool: DescriptorPoolHandle,
    /// The allocated set.
    pub set: DescriptorSetHandle,
}

impl DescriptorAllocation {
    /// Return the set to its pool.
    pub fn free<D: GpuDevice>(self, device: &mut D) {
        device.free_descriptor_set(self.pool, self.set);
    }
}

/// Pool-of-pools allocator for one descriptor-set layout.
#[derive(Debug)]
pub struct DescriptorAllocator {
    layout: DescriptorLayoutHandle,
    pool_desc: DescriptorPoolDesc,
    pools: Vec<DescriptorPoolHandle>,
    /// Pool that served the last allocation; tried first.
    current: usize,
}

impl DescriptorAllocator {
    /// Create the layout for `bindings` and a first pool sized for
    /// `capacity` sets.
    pub fn new<D: GpuDevice>(
        device: &mut D,
        bindings: &[DescriptorBinding],
        capacity: u32,
    ) -> Result<Self, DeviceError> {
        let layout = device.create_descriptor_layout(bindings)?;
        let mut allocator = Self {
            layout,
            pool_desc: pool_desc(bindings, capacity),
            pools: Vec::new(),
            current: 0,
        };
        if let Err(e) = allocator.grow(device) {
            device.destroy_descriptor_layout(layout);
            return Err(e);
        }
        Ok(allocator)
    }

    /// The layout every set from this allocator uses.
    pub fn layout(&self) -> DescriptorLayoutHandle {
        self.layout
    }

    /// Number of pools created so far.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Allocate one set.
    ///
    /// Pools are tried starting with the one that served the previous
    /// allocation. A new pool is created only when all of them report
    /// [`DeviceError::PoolExhausted`].
    pub fn allocate<D: GpuDevice>(
        &mut self,
        device: &mut D,
    ) -> Result<DescriptorAllocation, DeviceError> {
        let n = self.pools.len();
        for step in 0..n {
            let slot = (self.current + step) % n;
            let pool = self.pools[slot];
            match device.allocate_descriptor_set(pool, self.layout) {
                Ok(set) => {
                    self.current = slot;
                    return Ok(DescriptorAllocation { pool, set });
                }
                Err(DeviceError::PoolExhausted) => continue,
                Err(e) => return Err(e),
            }
        }
        if n > 0 {
            warn!(
                "all {n} descriptor pools of {} exhausted ({} sets each); adding pool #{}",
                self.layout,
                self.pool_desc.max_sets,
                n + 1
            );
        }
        let pool = self.grow(device)?;
        let set = device.allocate_descriptor_set(pool, self.layout)?;
        Ok(DescriptorAllocation { pool, set })
    }

    /// Destroy every pool (and with it, any set still allocated) and the layout.
    pub fn destroy<D: GpuDevice>(self, device: &mut D) {
        for pool in self.pools {
            device.destroy_descriptor_pool(pool);
        }
        device.destroy_descriptor_layout(self.layout);
    }

    fn grow<D: GpuDevice>(&mut self, device: &mut D) -> Result<DescriptorPoolHandle, DeviceError> {
        let pool = device.create_descriptor_pool(&self.pool_desc)?;
        debug!("created {pool} ({} sets) for {}", self.pool_desc.max_sets, self.layout);
        self.pools.push(pool);
        self.current = self.pools.len() - 1;
        Ok(pool)
    }
}

/// Per-kind descriptor counts for a pool holding `capacity` sets.
fn pool_desc(bindings: &[DescriptorBinding], capacity: u32) -> DescriptorPoolDesc {
    let mut sizes: Vec<(BindingKind, u32)> = Vec::new();
    for b in bindings {
        let needed = b.count.saturating_mul(capacity);
        match sizes.iter_mut().find(|(kind, _)| *kind == b.kind) {
            Some((_, total)) => *total = total.saturating_add(needed),
            None => sizes.push((b.kind, needed)),
        }
    }
    sizes.sort_unstable_by_key(|(kind, _)| *kind);
    DescriptorPoolDesc {
        max_sets: capacity,
        sizes,
    }
}

//! Content-hash → id caches sitting in front of a [`Registry`].

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use log::{debug, trace};

use ember_core::{
    GpuDevice, MaterialId, MeshData, MeshId, PipelineId, RegistryError, Shader, TextureData,
    TextureId,
};
use ember_registry::{DeletionEvent, Registry};

use crate::hash::{self, ContentHash, Fnv1a};

/// Hit, miss and eviction counters across all categories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups satisfied without touching the registry.
    pub hits: u64,
    /// Lookups that allocated a new registry resource.
    pub misses: u64,
    /// Entries dropped by [`ResourceCache::evict`].
    pub evictions: u64,
}

/// One category: forward map plus the reverse map eviction needs.
#[derive(Debug)]
struct Entries<Id> {
    by_hash: IndexMap<ContentHash, Id>,
    by_id: HashMap<Id, ContentHash>,
}

impl<Id: Copy + Eq + Hash> Entries<Id> {
    fn new() -> Self {
        Self {
            by_hash: IndexMap::new(),
            by_id: HashMap::new(),
        }
    }

    fn get(&self, key: ContentHash) -> Option<Id> {
        self.by_hash.get(&key).copied()
    }

    fn insert(&mut self, key: ContentHash, id: Id) {
        self.by_hash.insert(key, id);
        self.by_id.insert(id, key);
    }

    fn key_of(&self, id: Id) -> Option<ContentHash> {
        self.by_id.get(&id).copied()
    }

    fn remove(&mut self, id: Id) -> Option<ContentHash> {
        let key = self.by_id.remove(&id)?;
        self.by_hash.swap_remove(&key);
        Some(key)
    }

    fn len(&self) -> usize {
        self.by_hash.len()
    }
}

/// Deduplicates resource creation by content.
///
/// Each lookup hashes its input and only calls into the registry on a
/// miss. Feed every event list returned by
/// [`Registry::destroy_renderable`] to [`evict`](Self::evict), or the
/// cache will hand out ids the registry has already released.
#[derive(Debug)]
pub struct ResourceCache {
    pipelines: Entries<PipelineId>,
    meshes: Entries<MeshId>,
    textures: Entries<TextureId>,
    materials: Entries<MaterialId>,
    stats: CacheStats,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            pipelines: Entries::new(),
            meshes: Entries::new(),
            textures: Entries::new(),
            materials: Entries::new(),
            stats: CacheStats::default(),
        }
    }

    /// The pipeline built from `shader`'s bytecode, allocating it on miss.
    pub fn pipeline<D: GpuDevice>(
        &mut self,
        registry: &mut Registry<D>,
        shader: &Shader,
    ) -> Result<PipelineId, RegistryError> {
        let key = hash::hash_shader(shader);
        if let Some(id) = self.pipelines.get(key) {
            self.hit("pipeline", key);
            return Ok(id);
        }
        let id = registry.allocate_pipeline(shader)?;
        self.miss("pipeline", key);
        self.pipelines.insert(key, id);
        Ok(id)
    }

    /// The mesh uploaded from `mesh`, allocating it on miss.
    pub fn mesh<D: GpuDevice>(
        &mut self,
        registry: &mut Registry<D>,
        mesh: &MeshData,
    ) -> Result<MeshId, RegistryError> {
        let key = hash::hash_mesh(mesh);
        if let Some(id) = self.meshes.get(key) {
            self.hit("mesh", key);
            return Ok(id);
        }
        let id = registry.allocate_vertex_buffer(mesh)?;
        self.miss("mesh", key);
        self.meshes.insert(key, id);
        Ok(id)
    }

    /// The texture uploaded from `texture`, allocating it on miss.
    pub fn texture<D: GpuDevice>(
        &mut self,
        registry: &mut Registry<D>,
        texture: &TextureData,
    ) -> Result<TextureId, RegistryError> {
        let key = hash::hash_texture(texture);
        if let Some(id) = self.textures.get(key) {
            self.hit("texture", key);
            return Ok(id);
        }
        let id = registry.allocate_texture(texture)?;
        self.miss("texture", key);
        self.textures.insert(key, id);
        Ok(id)
    }

    /// The material of `pipeline` bound to `textures`, allocating it on miss.
    ///
    /// The key combines the content hashes of the pipeline and textures, so
    /// two identical assets loaded through this cache resolve to the same
    /// material. Ids the cache did not create are keyed by their raw value.
    pub fn material<D: GpuDevice>(
        &mut self,
        registry: &mut Registry<D>,
        pipeline: PipelineId,
        textures: &[TextureId],
    ) -> Result<MaterialId, RegistryError> {
        let pipeline_key = self
            .pipelines
            .key_of(pipeline)
            .unwrap_or_else(|| raw_key(0, pipeline.0));
        let texture_keys: Vec<ContentHash> = textures
            .iter()
            .map(|&t| self.textures.key_of(t).unwrap_or_else(|| raw_key(1, t.0)))
            .collect();
        let key = hash::hash_material(pipeline_key, &texture_keys);
        if let Some(id) = self.materials.get(key) {
            self.hit("material", key);
            return Ok(id);
        }
        let id = registry.allocate_material(pipeline, textures)?;
        self.miss("material", key);
        self.materials.insert(key, id);
        Ok(id)
    }

    /// Drop the entries of every resource named in `events`.
    ///
    /// Renderable events are ignored; renderables are never cached.
    /// Returns how many entries were removed.
    pub fn evict(&mut self, events: &[DeletionEvent]) -> usize {
        let mut removed = 0;
        for event in events {
            let key = match *event {
                DeletionEvent::Renderable(_) => None,
                DeletionEvent::Mesh(id) => self.meshes.remove(id),
                DeletionEvent::Texture(id) => self.textures.remove(id),
                DeletionEvent::Material(id) => self.materials.remove(id),
                DeletionEvent::Pipeline(id) => self.pipelines.remove(id),
            };
            if let Some(key) = key {
                debug!("evicted {event} ({key})");
                removed += 1;
            }
        }
        self.stats.evictions += removed as u64;
        removed
    }

    /// Cached pipeline for `shader`, without allocating.
    pub fn cached_pipeline(&self, shader: &Shader) -> Option<PipelineId> {
        self.pipelines.get(hash::hash_shader(shader))
    }

    /// Cached mesh for `mesh`, without allocating.
    pub fn cached_mesh(&self, mesh: &MeshData) -> Option<MeshId> {
        self.meshes.get(hash::hash_mesh(mesh))
    }

    /// Cached texture for `texture`, without allocating.
    pub fn cached_texture(&self, texture: &TextureData) -> Option<TextureId> {
        self.textures.get(hash::hash_texture(texture))
    }

    /// Total number of cached entries.
    pub fn len(&self) -> usize {
        self.pipelines.len() + self.meshes.len() + self.textures.len() + self.materials.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters since construction.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn hit(&mut self, kind: &str, key: ContentHash) {
        self.stats.hits += 1;
        trace!("{kind} cache hit {key}");
    }

    fn miss(&mut self, kind: &str, key: ContentHash) {
        self.stats.misses += 1;
        debug!("{kind} cache miss {key}");
    }
}

/// Stand-in key for an id allocated outside the cache.
fn raw_key(tag: u32, raw: u32) -> ContentHash {
    let mut h = Fnv1a::new();
    h.write_u32(tag);
    h.write_u32(raw);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::RenderPassHandle;
    use ember_registry::{FixedPassLayout, RegistryConfig};
    use ember_test_utils::{fixtures, MockDevice};

    fn registry() -> Registry<MockDevice> {
        let config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
        Registry::new(MockDevice::new(), config).unwrap()
    }

    #[test]
    fn identical_content_allocates_once() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();

        let a = cache.mesh(&mut reg, &fixtures::triangle()).unwrap();
        let b = cache.mesh(&mut reg, &fixtures::triangle()).unwrap();
        let c = cache.mesh(&mut reg, &fixtures::quad()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(reg.counts().meshes, 2);
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 2,
                evictions: 0
            }
        );
    }

    #[test]
    fn shaders_dedup_by_bytecode_not_name() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let a = cache.pipeline(&mut reg, &fixtures::shader("a", 1, 1)).unwrap();
        let b = cache.pipeline(&mut reg, &fixtures::shader("b", 1, 1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.counts().pipelines, 1);
    }

    #[test]
    fn materials_dedup_by_texture_content() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let p = cache.pipeline(&mut reg, &fixtures::shader("lit", 1, 1)).unwrap();
        let t = cache.texture(&mut reg, &fixtures::checker(4, 4)).unwrap();
        let u = cache.texture(&mut reg, &fixtures::checker(4, 4)).unwrap();
        assert_eq!(t, u);

        let m1 = cache.material(&mut reg, p, &[t]).unwrap();
        let m2 = cache.material(&mut reg, p, &[u]).unwrap();
        assert_eq!(m1, m2);
        assert_eq!(reg.texture_refcount(t), Some(1));
    }

    #[test]
    fn failed_allocation_is_not_cached() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let p = cache.pipeline(&mut reg, &fixtures::shader("lit", 1, 0)).unwrap();
        assert!(cache.material(&mut reg, p, &[]).is_err());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn evict_follows_cascade() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let shader = fixtures::shader("lit", 1, 1);
        let texture = fixtures::checker(2, 2);
        let p = cache.pipeline(&mut reg, &shader).unwrap();
        let t = cache.texture(&mut reg, &texture).unwrap();
        let m = cache.material(&mut reg, p, &[t]).unwrap();
        let mesh = cache.mesh(&mut reg, &fixtures::triangle()).unwrap();
        let r = reg.allocate_renderable(m, mesh).unwrap();
        assert_eq!(cache.len(), 4);

        let events = reg.destroy_renderable(r);
        assert_eq!(cache.evict(&events), 4);
        assert!(cache.is_empty());
        assert_eq!(cache.cached_pipeline(&shader), None);
        assert_eq!(cache.cached_texture(&texture), None);

        // A reload after eviction allocates fresh resources.
        let p2 = cache.pipeline(&mut reg, &shader).unwrap();
        assert!(reg.pipeline(p2).is_some());
        assert_eq!(cache.stats().evictions, 4);
    }

    #[test]
    fn partial_cascade_keeps_survivors() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let p = cache.pipeline(&mut reg, &fixtures::shader("lit", 0, 1)).unwrap();
        let m = cache.material(&mut reg, p, &[]).unwrap();
        let mesh = cache.mesh(&mut reg, &fixtures::triangle()).unwrap();
        let a = reg.allocate_renderable(m, mesh).unwrap();
        reg.allocate_renderable(m, mesh).unwrap();

        let events = reg.destroy_renderable(a);
        assert_eq!(cache.evict(&events), 0);
        assert_eq!(cache.cached_mesh(&fixtures::triangle()), Some(mesh));
    }

    #[test]
    fn uncached_ids_get_distinct_material_keys() {
        let mut reg = registry();
        let mut cache = ResourceCache::new();
        let p = reg.allocate_pipeline(&fixtures::shader("lit", 1, 0)).unwrap();
        let t1 = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
        let t2 = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
        let m1 = cache.material(&mut reg, p, &[t1]).unwrap();
        let m2 = cache.material(&mut reg, p, &[t2]).unwrap();
        assert_ne!(m1, m2);
        assert_eq!(cache.material(&mut reg, p, &[t1]).unwrap(), m1);
    }
}

//! The resource registry: allocation, per-frame reclamation and teardown.
//!
//! [`Registry`] owns every GPU resource it creates together with the device
//! that created them. Ownership is hierarchical: pipelines own materials,
//! materials own mesh groups, and mesh groups own renderables. Meshes and
//! textures are owned by the registry directly and reference-counted by
//! the mesh groups and materials that use them.
//!
//! The registry is index-based and never deduplicates. Allocating the same
//! content twice yields two resources; content addressing is
//! `ember-cache`'s job.

use std::sync::{Arc, PoisonError};

use log::{debug, error, info, trace};
use smallvec::SmallVec;

use ember_arena::{DenseTable, StableArena};
use ember_core::{
    BindingKind, BufferDesc, BufferHandle, BufferUsage, DescriptorBinding, DescriptorLayoutHandle,
    DescriptorSetHandle, DescriptorWrite, DeviceError, GpuDevice, ImageDesc, MaterialId,
    MemoryLocation, MeshData, MeshId, PipelineDesc, PipelineHandle, PipelineId, RegistryError,
    RenderableId, SamplerDesc, Shader, SharedTransform, TextureData, TextureId,
};

use crate::bindings::ShaderBindings;
use crate::config::{ConfigError, RegistryConfig};
use crate::deletion::{CategoryCounts, DeletionQueues, Reclaim};
use crate::descriptor::DescriptorAllocator;
use crate::material::Material;
use crate::metrics::RegistryMetrics;
use crate::pipeline::Pipeline;
use crate::renderable::Renderable;
use crate::resource::{GpuMesh, GpuTexture};

// ── DrawItem ───────────────────────────────────────────────────────

/// Everything the frame loop needs to record one draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawItem {
    /// The renderable being drawn.
    pub renderable: RenderableId,
    /// Pipeline to bind.
    pub pipeline: PipelineHandle,
    /// Material set, bound after the fixed pass sets.
    pub material_set: Option<DescriptorSetHandle>,
    /// Instance set for the current swapchain image.
    pub instance_set: Option<DescriptorSetHandle>,
    /// Vertex buffer.
    pub vertex: BufferHandle,
    /// Index buffer.
    pub index: BufferHandle,
    /// Indices to draw.
    pub index_count: u32,
}

// ── Registry ───────────────────────────────────────────────────────

/// GPU resource registry with multi-frame deferred deletion.
///
/// Call [`advance_frame()`](Self::advance_frame) exactly once per presented
/// frame, before allocating anything for that frame. Call
/// [`shutdown()`](Self::shutdown) once the device is idle; dropping the
/// registry instead leaks every GPU object it holds.
pub struct Registry<D: GpuDevice> {
    pub(crate) device: D,
    pub(crate) config: RegistryConfig,
    pub(crate) pipelines: DenseTable<Pipeline>,
    pub(crate) meshes: StableArena<GpuMesh>,
    /// Mesh groups per mesh, index-aligned with `meshes`.
    pub(crate) mesh_refs: StableArena<u32>,
    pub(crate) textures: StableArena<GpuTexture>,
    /// Materials per texture, index-aligned with `textures`.
    pub(crate) texture_refs: StableArena<u32>,
    pub(crate) deletion: DeletionQueues,
    frame: u64,
    reclaimed: CategoryCounts,
}

impl<D: GpuDevice> Registry<D> {
    /// Create an empty registry that allocates through `device`.
    pub fn new(device: D, config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            "registry created: {} frames in flight, {} swapchain images, {} sets per pool",
            config.frames_in_flight, config.swapchain_images, config.descriptor_pool_capacity
        );
        Ok(Self {
            device,
            deletion: DeletionQueues::new(config.frames_in_flight),
            config,
            pipelines: DenseTable::new(),
            meshes: StableArena::new(),
            mesh_refs: StableArena::new(),
            textures: StableArena::new(),
            texture_refs: StableArena::new(),
            frame: 0,
            reclaimed: CategoryCounts::default(),
        })
    }

    // ── Allocation ────────────────────────────────────────────────

    /// Build a graphics pipeline for `shader`.
    ///
    /// Bindings owned by the render pass are stripped. The remaining sampler
    /// bindings get a material-scope layout and pools, the remaining buffer
    /// bindings an instance-scope layout and pools. The pipeline layout list
    /// is the pass layouts followed by whichever of those two exist.
    pub fn allocate_pipeline(&mut self, shader: &Shader) -> Result<PipelineId, RegistryError> {
        let bindings = ShaderBindings::partition(&shader.reflection, &self.config.pass)
            .inspect_err(|e| error!("incompatible shader '{}': {e}", shader.name))?;

        let capacity = self.config.descriptor_pool_capacity;
        let material_sets = scope_allocator(&mut self.device, &bindings.material, capacity)?;
        let instance_sets = match scope_allocator(&mut self.device, &bindings.instance, capacity) {
            Ok(sets) => sets,
            Err(e) => {
                release(&mut self.device, material_sets, None);
                return Err(e.into());
            }
        };

        let mut layouts: SmallVec<[DescriptorLayoutHandle; 4]> =
            self.config.pass.set_layouts.iter().copied().collect();
        layouts.extend(material_sets.as_ref().map(DescriptorAllocator::layout));
        layouts.extend(instance_sets.as_ref().map(DescriptorAllocator::layout));

        let desc = PipelineDesc {
            render_pass: self.config.pass.render_pass,
            set_layouts: &layouts,
            vertex: &shader.reflection.vertex,
            code: &shader.code,
        };
        let handle = match self.device.create_pipeline(&desc) {
            Ok(handle) => handle,
            Err(e) => {
                release(&mut self.device, material_sets, instance_sets);
                return Err(e.into());
            }
        };

        let index = self.pipelines.emplace(Pipeline {
            handle,
            name: shader.name.clone(),
            bindings,
            material_sets,
            instance_sets,
            materials: DenseTable::new(),
        });
        let id = PipelineId(index);
        debug!(
            "allocated pipeline {id} '{}' ({handle}, {} set layouts)",
            shader.name,
            layouts.len()
        );
        Ok(id)
    }

    /// Upload `mesh` into device-local vertex and index buffers.
    ///
    /// The new mesh starts with a reference count of zero.
    pub fn allocate_vertex_buffer(&mut self, mesh: &MeshData) -> Result<MeshId, RegistryError> {
        let vertex = upload_buffer(&mut self.device, &mesh.vertices, BufferUsage::Vertex)?;
        let index = match upload_buffer(&mut self.device, mesh.index_bytes(), BufferUsage::Index) {
            Ok(index) => index,
            Err(e) => {
                self.device.destroy_buffer(vertex);
                return Err(e.into());
            }
        };

        let slot = self.meshes.insert(GpuMesh {
            vertex,
            index,
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        });
        let ref_slot = self.mesh_refs.insert(0);
        debug_assert_eq!(slot, ref_slot, "mesh refcounts out of step with meshes");
        let id = MeshId(slot);
        debug!(
            "allocated mesh {id} ({} vertices, {} indices)",
            mesh.vertex_count(),
            mesh.index_count()
        );
        Ok(id)
    }

    /// Upload `texture`, generate its full mip chain and create a sampler.
    ///
    /// Fails with [`RegistryError::TextureSizeMismatch`] before touching the
    /// device if the pixel buffer does not cover exactly the base level.
    /// The new texture starts with a reference count of zero.
    pub fn allocate_texture(&mut self, texture: &TextureData) -> Result<TextureId, RegistryError> {
        let expected = texture.byte_len();
        let supplied = texture.pixels.len() as u64;
        if supplied != expected {
            let err = RegistryError::TextureSizeMismatch { expected, supplied };
            error!(
                "{}x{} {:?} texture rejected: {err}",
                texture.width, texture.height, texture.format
            );
            return Err(err);
        }
        let levels = texture.mip_levels();
        let image = self.device.create_image(&ImageDesc {
            width: texture.width,
            height: texture.height,
            mip_levels: levels,
            format: texture.format,
        })?;

        let uploaded = stage(&mut self.device, &texture.pixels)
            .and_then(|staging| {
                let copied = self.device.upload_image(staging, image, expected);
                self.device.destroy_buffer(staging);
                copied
            })
            .and_then(|()| self.device.generate_mips(image, levels))
            .and_then(|()| {
                self.device.create_sampler(&SamplerDesc {
                    max_lod: levels as f32,
                    anisotropy: 1.0,
                })
            });
        let sampler = match uploaded {
            Ok(sampler) => sampler,
            Err(e) => {
                self.device.destroy_image(image);
                return Err(e.into());
            }
        };

        let slot = self.textures.insert(GpuTexture {
            image,
            sampler,
            mip_levels: levels,
        });
        let ref_slot = self.texture_refs.insert(0);
        debug_assert_eq!(slot, ref_slot, "texture refcounts out of step with textures");
        let id = TextureId(slot);
        debug!(
            "allocated texture {id} ({}x{}, {levels} mips)",
            texture.width, texture.height
        );
        Ok(id)
    }

    /// Bind `textures` to the sampler bindings of `pipeline`, in binding order.
    ///
    /// Fails with [`RegistryError::SignatureMismatch`] unless exactly one
    /// texture per sampler binding is supplied. On success every referenced
    /// texture's reference count goes up by one.
    ///
    /// # Panics
    ///
    /// Panics if `pipeline` or any texture id is not live.
    pub fn allocate_material(
        &mut self,
        pipeline: PipelineId,
        textures: &[TextureId],
    ) -> Result<MaterialId, RegistryError> {
        let p = &mut self.pipelines[pipeline.0];
        let expected = p.bindings.sampler_count();
        if textures.len() != expected {
            let err = RegistryError::SignatureMismatch {
                pipeline,
                expected,
                supplied: textures.len(),
            };
            error!("'{}': {err}", p.name);
            return Err(err);
        }

        let writes: SmallVec<[DescriptorWrite; 4]> = p
            .bindings
            .material
            .iter()
            .zip(textures)
            .map(|(b, t)| {
                let tex = &self.textures[t.0];
                DescriptorWrite::Image {
                    binding: b.binding,
                    image: tex.image,
                    sampler: tex.sampler,
                }
            })
            .collect();

        let descriptor = match p.material_sets.as_mut() {
            Some(sets) => {
                let allocation = sets.allocate(&mut self.device)?;
                self.device.write_descriptor_set(allocation.set, &writes);
                Some(allocation)
            }
            None => None,
        };

        for t in textures {
            self.texture_refs[t.0] += 1;
        }
        let index = p.materials.emplace(Material::new(textures, descriptor));
        let id = MaterialId { pipeline, index };
        debug!("allocated material {id} ({} textures)", textures.len());
        Ok(id)
    }

    /// Create a drawable instance of `mesh` with `material`.
    ///
    /// Allocates one buffer per instance binding for every swapchain image,
    /// plus one instance descriptor set per image when the shader declares
    /// instance bindings. The mesh's reference count goes up when this is
    /// the first renderable of the (material, mesh) pair.
    ///
    /// # Panics
    ///
    /// Panics if `material` or `mesh` is not live.
    pub fn allocate_renderable(
        &mut self,
        material: MaterialId,
        mesh: MeshId,
    ) -> Result<RenderableId, RegistryError> {
        assert!(
            self.meshes.contains(mesh.0),
            "allocate_renderable: mesh {mesh} is not live"
        );
        let images = self.config.swapchain_images;
        let p = &mut self.pipelines[material.pipeline.0];
        assert!(
            p.materials.contains(material.index),
            "allocate_renderable: material {material} is not live"
        );

        let renderable = build_renderable(
            &mut self.device,
            &p.bindings,
            p.instance_sets.as_mut(),
            images,
        )?;

        let (group, inserted) = p.materials[material.index].group_or_insert(mesh);
        let index = group.renderables.emplace(renderable);
        if inserted {
            self.mesh_refs[mesh.0] += 1;
        }
        let id = RenderableId {
            material,
            mesh,
            index,
        };
        debug!("allocated renderable {id}");
        Ok(id)
    }

    // ── Frame loop ────────────────────────────────────────────────

    /// Rotate every deletion ring by one frame and reclaim what expired.
    pub fn advance_frame(&mut self) -> CategoryCounts {
        self.frame += 1;
        let counts = self.deletion.advance(&mut self.device);
        self.reclaimed.accumulate(counts);
        if counts.total() > 0 {
            debug!("frame {}: reclaimed {counts:?}", self.frame);
        } else {
            trace!("frame {}: nothing to reclaim", self.frame);
        }
        counts
    }

    /// Point `renderable`'s instance data at a scene-owned transform.
    ///
    /// Only a weak reference is kept.
    ///
    /// # Panics
    ///
    /// Panics if `renderable` is not live.
    pub fn bind_transform(&mut self, renderable: RenderableId, transform: &SharedTransform) {
        self.renderable_mut(renderable).transform = Some(Arc::downgrade(transform));
    }

    /// Copy every live bound transform into the first instance buffer of
    /// its renderable for swapchain image `image`.
    ///
    /// Returns the number of buffers written. Renderables without a bound
    /// transform, or whose transform has been dropped, are skipped.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not below the configured swapchain image count.
    pub fn write_instances(&mut self, image: usize) -> Result<usize, DeviceError> {
        assert!(
            image < self.config.swapchain_images,
            "write_instances: image {image} out of range ({} swapchain images)",
            self.config.swapchain_images
        );
        let mut written = 0;
        for p in self.pipelines.iter() {
            let Some(first) = p.bindings.instance.first() else {
                continue;
            };
            let size = usize::try_from(first.byte_size()).unwrap_or(usize::MAX);
            for m in p.materials.iter() {
                for g in &m.groups {
                    for r in g.renderables.iter() {
                        let Some(shared) = r.transform.as_ref().and_then(|w| w.upgrade()) else {
                            continue;
                        };
                        let transform = *shared.read().unwrap_or_else(PoisonError::into_inner);
                        let bytes = transform.as_bytes();
                        let len = bytes.len().min(size);
                        self.device.write_buffer(r.buffers(image)[0], 0, &bytes[..len])?;
                        written += 1;
                    }
                }
            }
        }
        trace!("image {image}: wrote {written} instance transforms");
        Ok(written)
    }

    /// Draws for swapchain image `image`, grouped by pipeline, then
    /// material, then mesh.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not below the configured swapchain image count.
    pub fn draws(&self, image: usize) -> impl Iterator<Item = DrawItem> + '_ {
        assert!(
            image < self.config.swapchain_images,
            "draws: image {image} out of range ({} swapchain images)",
            self.config.swapchain_images
        );
        let meshes = &self.meshes;
        self.pipelines.iter_indexed().flat_map(move |(pi, p)| {
            p.materials.iter_indexed().flat_map(move |(mi, m)| {
                let material = MaterialId {
                    pipeline: PipelineId(pi),
                    index: mi,
                };
                m.groups.iter().flat_map(move |g| {
                    let mesh = &meshes[g.mesh.0];
                    g.renderables.iter_indexed().map(move |(ri, r)| DrawItem {
                        renderable: RenderableId {
                            material,
                            mesh: g.mesh,
                            index: ri,
                        },
                        pipeline: p.handle,
                        material_set: m.descriptor(),
                        instance_set: r.descriptor(image),
                        vertex: mesh.vertex,
                        index: mesh.index,
                        index_count: mesh.index_count,
                    })
                })
            })
        })
    }

    // ── Teardown ──────────────────────────────────────────────────

    /// Reclaim every condemned item regardless of age.
    ///
    /// Only call this once the device has finished all submitted work.
    pub fn flush(&mut self) -> CategoryCounts {
        let counts = self.deletion.flush(&mut self.device);
        self.reclaimed.accumulate(counts);
        info!("flushed deletion rings: {counts:?}");
        counts
    }

    /// Condemn and reclaim everything the registry still holds, then hand
    /// back the device.
    ///
    /// Only call this once the device has finished all submitted work.
    pub fn shutdown(mut self) -> D {
        let live = self.counts();
        for (_, mut p) in self.pipelines.drain() {
            for (_, mut m) in p.materials.drain() {
                for mut g in m.groups.drain(..) {
                    for (_, r) in g.renderables.drain() {
                        self.deletion.renderables.condemn(r.condemn());
                    }
                }
                self.deletion.materials.condemn(m.condemn());
            }
            self.deletion.pipelines.condemn(p.condemn());
        }
        for (_, mesh) in self.meshes.drain() {
            self.deletion.meshes.condemn(mesh.condemn());
        }
        for (_, texture) in self.textures.drain() {
            self.deletion.textures.condemn(texture.condemn());
        }
        self.mesh_refs.drain().for_each(drop);
        self.texture_refs.drain().for_each(drop);

        let counts = self.deletion.flush(&mut self.device);
        info!(
            "registry shut down after {} frames: {} live resources released, {} items reclaimed",
            self.frame,
            live.total(),
            counts.total()
        );
        self.device
    }

    // ── Queries ───────────────────────────────────────────────────

    /// Number of mesh groups referencing `mesh`, or `None` if it is not live.
    pub fn mesh_refcount(&self, mesh: MeshId) -> Option<u32> {
        self.mesh_refs.get(mesh.0).copied()
    }

    /// Number of materials referencing `texture`, or `None` if it is not live.
    pub fn texture_refcount(&self, texture: TextureId) -> Option<u32> {
        self.texture_refs.get(texture.0).copied()
    }

    /// A live pipeline.
    pub fn pipeline(&self, id: PipelineId) -> Option<&Pipeline> {
        self.pipelines.get(id.0)
    }

    /// A live material.
    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.pipelines.get(id.pipeline.0)?.materials.get(id.index)
    }

    /// A live mesh.
    pub fn mesh(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(id.0)
    }

    /// A live texture.
    pub fn texture(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(id.0)
    }

    /// A live renderable.
    pub fn renderable(&self, id: RenderableId) -> Option<&Renderable> {
        self.material(id.material)?
            .group(id.mesh)?
            .renderables
            .get(id.index)
    }

    /// Live resources per category.
    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts {
            pipelines: self.pipelines.len(),
            meshes: self.meshes.len(),
            textures: self.textures.len(),
            ..CategoryCounts::default()
        };
        for p in &self.pipelines {
            counts.materials += p.materials.len();
            for m in &p.materials {
                counts.renderables += m.groups.iter().map(|g| g.renderables.len()).sum::<usize>();
            }
        }
        counts
    }

    /// Occupancy and reclamation counters.
    pub fn metrics(&self) -> RegistryMetrics {
        RegistryMetrics {
            live: self.counts(),
            pending: self.deletion.pending(),
            reclaimed: self.reclaimed,
            descriptor_pools: self.pipelines.iter().map(Pipeline::descriptor_pools).sum(),
            frame: self.frame,
        }
    }

    /// Number of [`advance_frame()`](Self::advance_frame) calls so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The validated configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutable access to the device.
    ///
    /// Destroying registry-owned objects through it is a contract violation.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn renderable_mut(&mut self, id: RenderableId) -> &mut Renderable {
        let group = self.pipelines[id.pipeline().0].materials[id.material.index]
            .group_mut(id.mesh)
            .unwrap_or_else(|| panic!("renderable {id}: material has no group for mesh {}", id.mesh));
        &mut group.renderables[id.index]
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn scope_allocator<D: GpuDevice>(
    device: &mut D,
    bindings: &[DescriptorBinding],
    capacity: u32,
) -> Result<Option<DescriptorAllocator>, DeviceError> {
    if bindings.is_empty() {
        return Ok(None);
    }
    DescriptorAllocator::new(device, bindings, capacity).map(Some)
}

fn release<D: GpuDevice>(
    device: &mut D,
    material_sets: Option<DescriptorAllocator>,
    instance_sets: Option<DescriptorAllocator>,
) {
    for sets in [material_sets, instance_sets].into_iter().flatten() {
        sets.destroy(device);
    }
}

/// A host-visible staging buffer holding `bytes`.
fn stage<D: GpuDevice>(device: &mut D, bytes: &[u8]) -> Result<BufferHandle, DeviceError> {
    let staging = device.create_buffer(&BufferDesc {
        size: bytes.len() as u64,
        usage: BufferUsage::Staging,
        location: MemoryLocation::HostVisible,
    })?;
    if let Err(e) = device.write_buffer(staging, 0, bytes) {
        device.destroy_buffer(staging);
        return Err(e);
    }
    Ok(staging)
}

/// Copy `bytes` into a new device-local buffer through a staging buffer.
///
/// The staging buffer is destroyed before returning.
fn upload_buffer<D: GpuDevice>(
    device: &mut D,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<BufferHandle, DeviceError> {
    let size = bytes.len() as u64;
    let dst = device.create_buffer(&BufferDesc {
        size,
        usage,
        location: MemoryLocation::DeviceLocal,
    })?;
    let copied = stage(device, bytes).and_then(|staging| {
        let copied = device.upload_buffer(staging, dst, size);
        device.destroy_buffer(staging);
        copied
    });
    match copied {
        Ok(()) => Ok(dst),
        Err(e) => {
            device.destroy_buffer(dst);
            Err(e)
        }
    }
}

/// Allocate a renderable's instance buffers and sets for every swapchain
/// image. Anything allocated before a failure is released immediately.
fn build_renderable<D: GpuDevice>(
    device: &mut D,
    bindings: &ShaderBindings,
    sets: Option<&mut DescriptorAllocator>,
    images: usize,
) -> Result<Renderable, DeviceError> {
    let mut renderable = Renderable {
        buffers: SmallVec::with_capacity(images * bindings.instance.len()),
        buffers_per_image: bindings.instance.len(),
        descriptors: SmallVec::new(),
        transform: None,
    };
    match fill_instances(device, bindings, sets, images, &mut renderable) {
        Ok(()) => Ok(renderable),
        Err(e) => {
            renderable.condemn().reclaim(device);
            Err(e)
        }
    }
}

fn fill_instances<D: GpuDevice>(
    device: &mut D,
    bindings: &ShaderBindings,
    mut sets: Option<&mut DescriptorAllocator>,
    images: usize,
    renderable: &mut Renderable,
) -> Result<(), DeviceError> {
    for _ in 0..images {
        let first = renderable.buffers.len();
        for b in &bindings.instance {
            let usage = match b.kind {
                BindingKind::StorageBuffer => BufferUsage::Storage,
                _ => BufferUsage::Uniform,
            };
            renderable.buffers.push(device.create_buffer(&BufferDesc {
                size: b.byte_size(),
                usage,
                location: MemoryLocation::HostVisible,
            })?);
        }
        if let Some(sets) = sets.as_deref_mut() {
            let allocation = sets.allocate(device)?;
            renderable.descriptors.push(allocation);
            let writes: SmallVec<[DescriptorWrite; 4]> = bindings
                .instance
                .iter()
                .zip(&renderable.buffers[first..])
                .map(|(b, &buffer)| DescriptorWrite::Buffer {
                    binding: b.binding,
                    buffer,
                    range: b.byte_size(),
                })
                .collect();
            device.write_descriptor_set(allocation.set, &writes);
        }
    }
    Ok(())
}

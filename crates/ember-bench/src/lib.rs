//! Benchmark scenes for the Ember resource registry.
//!
//! Provides registry setups shared by the criterion benches:
//!
//! - [`bench_registry`]: a [`Registry`] over a [`MockDevice`] with the
//!   default ring depth and swapchain size
//! - [`SceneProfile`]: the shape of a scene (pipelines, materials, meshes,
//!   renderables) and [`populate`], which allocates it

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ember_core::{RegistryError, RenderPassHandle, RenderableId};
use ember_registry::{FixedPassLayout, Registry, RegistryConfig};
use ember_test_utils::{fixtures, MockDevice};

/// A registry on a mock device with default configuration.
///
/// Descriptor pools hold 64 sets, so large scenes exercise pool growth.
pub fn bench_registry() -> Registry<MockDevice> {
    let config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    match Registry::new(MockDevice::new(), config) {
        Ok(registry) => registry,
        Err(e) => panic!("default bench config rejected: {e}"),
    }
}

/// Shape of a benchmark scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneProfile {
    /// Distinct shaders, each becoming a pipeline.
    pub pipelines: u32,
    /// Materials per pipeline, each with its own texture.
    pub materials_per_pipeline: u32,
    /// Meshes shared by every material.
    pub meshes: u32,
    /// Renderables per (material, mesh) pair.
    pub renderables_per_group: u32,
}

impl SceneProfile {
    /// 4 pipelines × 4 materials × 4 meshes × 4 instances: 256 renderables.
    pub fn reference() -> Self {
        Self {
            pipelines: 4,
            materials_per_pipeline: 4,
            meshes: 4,
            renderables_per_group: 4,
        }
    }

    /// Total renderables [`populate`] creates.
    pub fn renderable_count(&self) -> u32 {
        self.pipelines * self.materials_per_pipeline * self.meshes * self.renderables_per_group
    }
}

/// Allocate the scene described by `profile`.
///
/// Every pipeline uses a one-sampler, one-buffer shader whose bytecode
/// differs per pipeline. Textures are 8x8 checkers.
pub fn populate(
    registry: &mut Registry<MockDevice>,
    profile: SceneProfile,
) -> Result<Vec<RenderableId>, RegistryError> {
    let mut meshes = Vec::with_capacity(profile.meshes as usize);
    for i in 0..profile.meshes {
        let mesh = if i % 2 == 0 {
            fixtures::triangle()
        } else {
            fixtures::quad()
        };
        meshes.push(registry.allocate_vertex_buffer(&mesh)?);
    }

    let mut renderables = Vec::with_capacity(profile.renderable_count() as usize);
    for p in 0..profile.pipelines {
        let mut shader = fixtures::shader(&format!("bench-{p}"), 1, 1);
        shader.code.vertex.push(p);
        let pipeline = registry.allocate_pipeline(&shader)?;
        for _ in 0..profile.materials_per_pipeline {
            let texture = registry.allocate_texture(&fixtures::checker(8, 8))?;
            let material = registry.allocate_material(pipeline, &[texture])?;
            for &mesh in &meshes {
                for _ in 0..profile.renderables_per_group {
                    renderables.push(registry.allocate_renderable(material, mesh)?);
                }
            }
        }
    }
    Ok(renderables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scene_counts() {
        let mut reg = bench_registry();
        let profile = SceneProfile::reference();
        let ids = populate(&mut reg, profile).unwrap();
        assert_eq!(ids.len() as u32, profile.renderable_count());

        let counts = reg.counts();
        assert_eq!(counts.pipelines, 4);
        assert_eq!(counts.materials, 16);
        assert_eq!(counts.textures, 16);
        assert_eq!(counts.renderables, 256);
    }
}

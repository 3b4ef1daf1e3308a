//! Materials and the mesh groups they own.

use smallvec::SmallVec;

use ember_arena::DenseTable;
use ember_core::{DescriptorSetHandle, MeshId, TextureId};

use crate::deletion::CondemnedMaterial;
use crate::descriptor::DescriptorAllocation;
use crate::renderable::Renderable;

/// Every renderable drawn with one (material, mesh) pair.
#[derive(Debug)]
pub struct MeshGroup {
    pub(crate) mesh: MeshId,
    pub(crate) renderables: DenseTable<Renderable>,
}

impl MeshGroup {
    fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            renderables: DenseTable::new(),
        }
    }

    /// The mesh every renderable in this group draws.
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// The group's renderables.
    pub fn renderables(&self) -> &DenseTable<Renderable> {
        &self.renderables
    }
}

/// A set of textures bound against one pipeline.
///
/// Mesh groups are kept sorted by mesh id.
#[derive(Debug)]
pub struct Material {
    pub(crate) textures: SmallVec<[TextureId; 4]>,
    pub(crate) descriptor: Option<DescriptorAllocation>,
    pub(crate) groups: Vec<MeshGroup>,
}

impl Material {
    pub(crate) fn new(textures: &[TextureId], descriptor: Option<DescriptorAllocation>) -> Self {
        Self {
            textures: SmallVec::from_slice(textures),
            descriptor,
            groups: Vec::new(),
        }
    }

    /// Textures in sampler-binding order.
    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// The material descriptor set, if the shader declares samplers.
    pub fn descriptor(&self) -> Option<DescriptorSetHandle> {
        self.descriptor.map(|a| a.set)
    }

    /// Mesh groups, sorted by mesh id.
    pub fn groups(&self) -> &[MeshGroup] {
        &self.groups
    }

    /// The group for `mesh`, if any renderable draws it with this material.
    pub fn group(&self, mesh: MeshId) -> Option<&MeshGroup> {
        self.groups
            .binary_search_by_key(&mesh, |g| g.mesh)
            .ok()
            .map(|i| &self.groups[i])
    }

    pub(crate) fn group_mut(&mut self, mesh: MeshId) -> Option<&mut MeshGroup> {
        match self.groups.binary_search_by_key(&mesh, |g| g.mesh) {
            Ok(i) => Some(&mut self.groups[i]),
            Err(_) => None,
        }
    }

    /// Find the group for `mesh`, inserting an empty one in sorted position
    /// if needed. The flag is `true` when a group was inserted.
    pub(crate) fn group_or_insert(&mut self, mesh: MeshId) -> (&mut MeshGroup, bool) {
        match self.groups.binary_search_by_key(&mesh, |g| g.mesh) {
            Ok(i) => (&mut self.groups[i], false),
            Err(i) => {
                self.groups.insert(i, MeshGroup::new(mesh));
                (&mut self.groups[i], true)
            }
        }
    }

    pub(crate) fn remove_group(&mut self, mesh: MeshId) -> Option<MeshGroup> {
        self.groups
            .binary_search_by_key(&mesh, |g| g.mesh)
            .ok()
            .map(|i| self.groups.remove(i))
    }

    pub(crate) fn condemn(self) -> CondemnedMaterial {
        CondemnedMaterial {
            descriptor: self.descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_stay_sorted_by_mesh() {
        let mut material = Material::new(&[], None);
        for mesh in [5, 1, 3, 1, 4] {
            material.group_or_insert(MeshId(mesh));
        }
        let order: Vec<u32> = material.groups().iter().map(|g| g.mesh().0).collect();
        assert_eq!(order, vec![1, 3, 4, 5]);
    }

    #[test]
    fn insert_flag_reports_new_groups_only() {
        let mut material = Material::new(&[TextureId(0)], None);
        assert!(material.group_or_insert(MeshId(2)).1);
        assert!(!material.group_or_insert(MeshId(2)).1);
        assert!(material.group(MeshId(2)).is_some());
        assert!(material.group(MeshId(3)).is_none());
    }

    #[test]
    fn remove_group_keeps_order() {
        let mut material = Material::new(&[], None);
        for mesh in [1, 2, 3] {
            material.group_or_insert(MeshId(mesh));
        }
        assert_eq!(material.remove_group(MeshId(2)).map(|g| g.mesh()), Some(MeshId(2)));
        assert!(material.remove_group(MeshId(2)).is_none());
        let order: Vec<u32> = material.groups().iter().map(|g| g.mesh().0).collect();
        assert_eq!(order, vec![1, 3]);
    }
}

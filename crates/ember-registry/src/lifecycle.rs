//! Renderable destruction and the reference-count cascade it triggers.

use log::debug;

use ember_core::{GpuDevice, RenderableId};

use crate::event::DeletionEvent;
use crate::registry::Registry;

impl<D: GpuDevice> Registry<D> {
    /// Destroy `id` and everything that only it kept alive.
    ///
    /// Each level is only visited if the one below it became empty:
    ///
    /// 1. The renderable's instance buffers and sets are condemned.
    /// 2. If its mesh group is now empty the group is removed and the mesh
    ///    loses a reference; at zero the mesh is condemned.
    /// 3. If the material has no mesh groups left, each of its textures
    ///    loses a reference (condemned at zero) and the material's set is
    ///    condemned.
    /// 4. If the pipeline has no materials left, it is condemned together
    ///    with its layouts and pools.
    ///
    /// Reference counts drop immediately. Only the GPU objects wait for
    /// the deletion rings. The returned events list every id that died, in
    /// the order above.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live renderable.
    pub fn destroy_renderable(&mut self, id: RenderableId) -> Vec<DeletionEvent> {
        let mut events = Vec::with_capacity(1);
        let pipeline = &mut self.pipelines[id.pipeline().0];
        let material = &mut pipeline.materials[id.material.index];
        let group = material
            .group_mut(id.mesh)
            .unwrap_or_else(|| panic!("destroy_renderable: {id} has no mesh group"));

        let renderable = group.renderables.remove(id.index);
        self.deletion.renderables.condemn(renderable.condemn());
        events.push(DeletionEvent::Renderable(id));
        if !group.renderables.is_empty() {
            debug!("destroyed renderable {id}");
            return events;
        }

        material.remove_group(id.mesh);
        let refs = &mut self.mesh_refs[id.mesh.0];
        *refs -= 1;
        if *refs == 0 {
            self.mesh_refs.remove(id.mesh.0);
            let mesh = self.meshes.remove(id.mesh.0);
            self.deletion.meshes.condemn(mesh.condemn());
            events.push(DeletionEvent::Mesh(id.mesh));
        }
        if !material.groups.is_empty() {
            debug!("destroyed renderable {id} and its mesh group");
            return events;
        }

        let material = pipeline.materials.remove(id.material.index);
        for &texture in material.textures() {
            let refs = &mut self.texture_refs[texture.0];
            *refs -= 1;
            if *refs == 0 {
                self.texture_refs.remove(texture.0);
                let texture_data = self.textures.remove(texture.0);
                self.deletion.textures.condemn(texture_data.condemn());
                events.push(DeletionEvent::Texture(texture));
            }
        }
        self.deletion.materials.condemn(material.condemn());
        events.push(DeletionEvent::Material(id.material));
        if !pipeline.materials.is_empty() {
            debug!("destroyed renderable {id}, cascading to material {}", id.material);
            return events;
        }

        let pipeline = self.pipelines.remove(id.pipeline().0);
        debug!(
            "destroyed renderable {id}, cascading to pipeline {} '{}'",
            id.pipeline(),
            pipeline.name
        );
        self.deletion.pipelines.condemn(pipeline.condemn());
        events.push(DeletionEvent::Pipeline(id.pipeline()));
        events
    }
}

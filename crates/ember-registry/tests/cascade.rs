//! Integration test: cascading destruction of the last renderable.
//!
//! Destroying the only renderable of the only mesh group of the only
//! material of a pipeline must report the renderable, its mesh, every
//! texture, the material and the pipeline, in that order, and every GPU
//! object behind them must be reclaimed once the rings have turned over.

use ember_core::{HandleKind, RenderPassHandle};
use ember_registry::{DeletionEvent, FixedPassLayout, Registry, RegistryConfig};
use ember_test_utils::{fixtures, MockDevice};

fn registry() -> Registry<MockDevice> {
    let config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    Registry::new(MockDevice::new(), config).unwrap()
}

#[test]
fn last_renderable_cascades_to_pipeline_in_order() {
    let mut reg = registry();
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 2, 1)).unwrap();
    let albedo = reg.allocate_texture(&fixtures::checker(4, 4)).unwrap();
    let normal = reg.allocate_texture(&fixtures::checker(4, 4)).unwrap();
    let m = reg.allocate_material(p, &[albedo, normal]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let r = reg.allocate_renderable(m, mesh).unwrap();

    let events = reg.destroy_renderable(r);
    assert_eq!(
        events,
        vec![
            DeletionEvent::Renderable(r),
            DeletionEvent::Mesh(mesh),
            DeletionEvent::Texture(albedo),
            DeletionEvent::Texture(normal),
            DeletionEvent::Material(m),
            DeletionEvent::Pipeline(p),
        ]
    );

    // Ids die immediately.
    assert!(reg.pipeline(p).is_none());
    assert!(reg.material(m).is_none());
    assert!(reg.mesh(mesh).is_none());
    assert!(reg.texture(albedo).is_none());
    assert_eq!(reg.mesh_refcount(mesh), None);
    assert_eq!(reg.counts().total(), 0);

    // GPU objects do not.
    let pending = reg.metrics().pending;
    assert_eq!(pending.total(), 6);
    assert!(reg.device().live_objects() > 0);

    for _ in 0..reg.config().frames_in_flight {
        reg.advance_frame();
    }
    assert_eq!(reg.device().live_objects(), 0);
    assert_eq!(reg.device().destroyed(HandleKind::Pipeline), 1);
    assert_eq!(reg.device().destroyed(HandleKind::Image), 2);
    assert_eq!(reg.metrics().reclaimed.total(), 6);
}

#[test]
fn texture_shared_with_surviving_material_is_not_reported() {
    let mut reg = registry();
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 1, 0)).unwrap();
    let shared = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
    let own = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
    let doomed = reg.allocate_material(p, &[own]).unwrap();
    let survivor = reg.allocate_material(p, &[shared]).unwrap();
    // Two materials on `shared`: both references must outlive the cascade.
    let _second_on_shared = reg.allocate_material(p, &[shared]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::quad()).unwrap();
    let other = reg.allocate_vertex_buffer(&fixtures::quad()).unwrap();
    let r = reg.allocate_renderable(doomed, mesh).unwrap();
    reg.allocate_renderable(survivor, other).unwrap();

    let events = reg.destroy_renderable(r);
    assert_eq!(
        events,
        vec![
            DeletionEvent::Renderable(r),
            DeletionEvent::Mesh(mesh),
            DeletionEvent::Texture(own),
            DeletionEvent::Material(doomed),
        ]
    );
    assert_eq!(reg.texture_refcount(shared), Some(2));
    assert!(reg.pipeline(p).is_some());
}

#[test]
fn material_with_other_mesh_groups_survives() {
    let mut reg = registry();
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 0, 1)).unwrap();
    let m = reg.allocate_material(p, &[]).unwrap();
    let a = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let b = reg.allocate_vertex_buffer(&fixtures::quad()).unwrap();
    let ra = reg.allocate_renderable(m, a).unwrap();
    let rb = reg.allocate_renderable(m, b).unwrap();

    assert_eq!(
        reg.destroy_renderable(ra),
        vec![DeletionEvent::Renderable(ra), DeletionEvent::Mesh(a)]
    );
    let material = reg.material(m).unwrap();
    assert_eq!(material.groups().len(), 1);
    assert_eq!(material.groups()[0].mesh(), b);
    assert!(reg.renderable(rb).is_some());
}

//! Integration test: deferred deletion timing.
//!
//! With three frames in flight, a renderable condemned at frame 0 must
//! stay resident through the first two `advance_frame()` calls and be
//! reclaimed by the third, never earlier and never later.

use ember_core::RenderPassHandle;
use ember_registry::{FixedPassLayout, Registry, RegistryConfig};
use ember_test_utils::{fixtures, MockDevice};

fn registry(frames_in_flight: usize) -> Registry<MockDevice> {
    let mut config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    config.frames_in_flight = frames_in_flight;
    Registry::new(MockDevice::new(), config).unwrap()
}

#[test]
fn condemned_renderable_is_freed_by_third_advance() {
    let mut reg = registry(3);
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 0, 1)).unwrap();
    let m = reg.allocate_material(p, &[]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let keep = reg.allocate_renderable(m, mesh).unwrap();
    let doomed = reg.allocate_renderable(m, mesh).unwrap();

    let buffers: Vec<_> = (0..3)
        .flat_map(|image| reg.renderable(doomed).unwrap().buffers(image).to_vec())
        .collect();
    let sets: Vec<_> = (0..3)
        .filter_map(|image| reg.renderable(doomed).unwrap().descriptor(image))
        .collect();
    assert_eq!(sets.len(), 3);

    reg.destroy_renderable(doomed);
    let alive = |reg: &Registry<MockDevice>| {
        buffers.iter().all(|&b| reg.device().is_live_buffer(b))
            && sets.iter().all(|&s| reg.device().is_live_descriptor_set(s))
    };

    assert!(alive(&reg), "freed at condemnation");
    assert_eq!(reg.advance_frame().renderables, 0);
    assert!(alive(&reg), "freed after one advance");
    assert_eq!(reg.advance_frame().renderables, 0);
    assert!(alive(&reg), "freed after two advances");
    assert_eq!(reg.advance_frame().renderables, 1);
    assert!(buffers.iter().all(|&b| !reg.device().is_live_buffer(b)));
    assert!(sets.iter().all(|&s| !reg.device().is_live_descriptor_set(s)));

    // Nothing else is touched by later frames.
    let live = reg.device().live_objects();
    for _ in 0..5 {
        reg.advance_frame();
    }
    assert_eq!(reg.device().live_objects(), live);
    assert!(reg.renderable(keep).is_some());
}

#[test]
fn ring_depth_follows_frames_in_flight_not_swapchain_images() {
    let mut config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    config.frames_in_flight = 2;
    config.swapchain_images = 4;
    let mut reg = Registry::new(MockDevice::new(), config).unwrap();
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 0, 1)).unwrap();
    let m = reg.allocate_material(p, &[]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let r = reg.allocate_renderable(m, mesh).unwrap();
    assert!(reg.renderable(r).unwrap().descriptor(3).is_some());

    reg.destroy_renderable(r);
    reg.advance_frame();
    assert_eq!(reg.device().live_pipelines(), 1);
    reg.advance_frame();
    assert_eq!(reg.device().live_objects(), 0);
}

#[test]
fn items_condemned_on_different_frames_expire_separately() {
    let mut reg = registry(3);
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 0, 0)).unwrap();
    let m = reg.allocate_material(p, &[]).unwrap();
    let a = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let b = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let c = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let _anchor = reg.allocate_renderable(m, c).unwrap();
    let ra = reg.allocate_renderable(m, a).unwrap();
    let rb = reg.allocate_renderable(m, b).unwrap();

    assert_eq!(reg.device().live_buffers(), 6);

    reg.destroy_renderable(ra);
    reg.advance_frame();
    reg.destroy_renderable(rb);
    reg.advance_frame();
    assert_eq!(reg.device().live_buffers(), 6);
    assert_eq!(reg.advance_frame().meshes, 1);
    assert_eq!(reg.device().live_buffers(), 4);
    assert_eq!(reg.advance_frame().meshes, 1);
    assert_eq!(reg.device().live_buffers(), 2);
}

#[test]
fn flush_reclaims_regardless_of_age() {
    let mut reg = registry(3);
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 1, 1)).unwrap();
    let t = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
    let m = reg.allocate_material(p, &[t]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let r = reg.allocate_renderable(m, mesh).unwrap();
    reg.destroy_renderable(r);

    let counts = reg.flush();
    assert_eq!(counts.total(), 5);
    assert_eq!(reg.device().live_objects(), 0);
    assert_eq!(reg.metrics().pending.total(), 0);
}

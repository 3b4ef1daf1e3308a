//! Integration test: allocation contracts.
//!
//! Covers material/shader signature checking, the absence of
//! deduplication inside the registry, descriptor pool growth when a
//! pool runs out of sets, and reuse of returned sets under churn.

use ember_core::{
    DescriptorLayoutHandle, RegistryError, RenderPassHandle, Shader, ShaderReflector,
};
use ember_registry::{FixedBinding, FixedPassLayout, Registry, RegistryConfig};
use ember_test_utils::{fixtures, MockDevice, MockReflector};

fn registry_with(device: MockDevice) -> Registry<MockDevice> {
    let config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    Registry::new(device, config).unwrap()
}

#[test]
fn texture_count_must_match_sampler_count() {
    let mut reg = registry_with(MockDevice::new());
    let p = reg.allocate_pipeline(&fixtures::shader("two", 2, 0)).unwrap();
    let t = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();

    let err = reg.allocate_material(p, &[t]).unwrap_err();
    assert_eq!(
        err,
        RegistryError::SignatureMismatch {
            pipeline: p,
            expected: 2,
            supplied: 1,
        }
    );
    assert_eq!(reg.texture_refcount(t), Some(0));
    assert_eq!(reg.counts().materials, 0);

    let none = reg.allocate_pipeline(&fixtures::shader("none", 0, 0)).unwrap();
    assert!(matches!(
        reg.allocate_material(none, &[t]),
        Err(RegistryError::SignatureMismatch { expected: 0, .. })
    ));
}

#[test]
fn equal_content_is_not_deduplicated() {
    let mut reg = registry_with(MockDevice::new());
    let shader = fixtures::shader("lit", 1, 0);
    let p1 = reg.allocate_pipeline(&shader).unwrap();
    let p2 = reg.allocate_pipeline(&shader).unwrap();
    assert_ne!(p1, p2);

    let data = fixtures::checker(8, 8);
    let t1 = reg.allocate_texture(&data).unwrap();
    let t2 = reg.allocate_texture(&data).unwrap();
    assert_ne!(t1, t2);

    reg.allocate_material(p1, &[t1]).unwrap();
    assert_eq!(reg.texture_refcount(t1), Some(1));
    assert_eq!(reg.texture_refcount(t2), Some(0));

    let m1 = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let m2 = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    assert_ne!(m1, m2);
    assert_ne!(reg.mesh(m1).unwrap().vertex, reg.mesh(m2).unwrap().vertex);
}

#[test]
fn exhausted_descriptor_pools_are_replaced() {
    let mut reg = registry_with(MockDevice::new().with_pool_limit(2));
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 1, 1)).unwrap();
    let t = reg.allocate_texture(&fixtures::checker(2, 2)).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    assert_eq!(reg.pipeline(p).unwrap().descriptor_pools(), 2);

    let materials: Vec<_> = (0..5)
        .map(|_| reg.allocate_material(p, &[t]).unwrap())
        .collect();
    // One renderable needs three instance sets, so this spills as well.
    reg.allocate_renderable(materials[0], mesh).unwrap();

    // 5 material sets over pools of 2, 3 instance sets over pools of 2.
    assert_eq!(reg.pipeline(p).unwrap().descriptor_pools(), 3 + 2);
    assert_eq!(reg.device().live_descriptor_sets(), 8);
    assert_eq!(reg.metrics().descriptor_pools, 5);
}

#[test]
fn renderable_churn_reuses_returned_descriptor_sets() {
    let mut config = RegistryConfig::new(FixedPassLayout::new(RenderPassHandle(1)));
    config.descriptor_pool_capacity = 2;
    config.frames_in_flight = 3;
    config.swapchain_images = 1;
    let mut reg = Registry::new(MockDevice::new(), config).unwrap();
    let p = reg.allocate_pipeline(&fixtures::shader("lit", 0, 1)).unwrap();
    let m = reg.allocate_material(p, &[]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    let _anchor = reg.allocate_renderable(m, mesh).unwrap();

    for _ in 0..100 {
        let r = reg.allocate_renderable(m, mesh).unwrap();
        reg.destroy_renderable(r);
        reg.advance_frame();
    }

    // Never more than four sets live at once: the anchor, two still
    // waiting in the ring and the one being allocated.
    assert!(reg.device().live_descriptor_sets() <= 3);
    assert_eq!(reg.pipeline(p).unwrap().descriptor_pools(), 2);
    assert_eq!(reg.device().live_descriptor_pools(), 2);
}

#[test]
fn required_pass_binding_must_be_declared() {
    let pass = FixedPassLayout::new(RenderPassHandle(1)).with_set(
        DescriptorLayoutHandle(77),
        [FixedBinding {
            set: fixtures::CAMERA_SET,
            binding: 0,
            required: true,
        }],
    );
    let mut reg = Registry::new(MockDevice::new(), RegistryConfig::new(pass)).unwrap();
    assert_eq!(
        reg.allocate_pipeline(&fixtures::shader("bare", 1, 1)),
        Err(RegistryError::MissingFixedBinding { set: 0, binding: 0 })
    );

    let p = reg
        .allocate_pipeline(&fixtures::shader_with_camera("lit", 1, 1))
        .unwrap();
    let pipeline = reg.pipeline(p).unwrap();
    assert_eq!(pipeline.bindings().instance_buffer_count(), 1);
    let layouts = reg.device().pipeline_layouts(pipeline.handle());
    assert_eq!(layouts[0], DescriptorLayoutHandle(77));
    assert_eq!(layouts.len(), 3);
}

#[test]
fn reflected_shader_feeds_the_registry() {
    let reflector = MockReflector::new(fixtures::reflection(1, 1));
    let shader = Shader::reflect("reflected", fixtures::code(1, 1), &reflector).unwrap();
    assert!(reflector.reflect(&Default::default()).is_err());

    let mut reg = registry_with(MockDevice::new());
    let p = reg.allocate_pipeline(&shader).unwrap();
    assert_eq!(reg.pipeline(p).unwrap().name(), "reflected");
    assert_eq!(reg.pipeline(p).unwrap().bindings().sampler_count(), 1);
}

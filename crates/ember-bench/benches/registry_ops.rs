//! Criterion micro-benchmarks for registry allocation, destruction and frame advance.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use ember_bench::{bench_registry, populate, SceneProfile};
use ember_cache::ResourceCache;
use ember_test_utils::fixtures;

/// Benchmark: allocate the 256-renderable reference scene from scratch.
fn bench_populate_reference(c: &mut Criterion) {
    c.bench_function("populate_reference", |b| {
        b.iter_batched(
            bench_registry,
            |mut reg| {
                let ids = populate(&mut reg, SceneProfile::reference()).unwrap();
                black_box(ids.len());
                reg
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: one renderable allocate + destroy with a sibling keeping the
/// group alive, followed by a frame advance.
fn bench_renderable_cycle(c: &mut Criterion) {
    let mut reg = bench_registry();
    let pipeline = reg
        .allocate_pipeline(&fixtures::shader("cycle", 1, 1))
        .unwrap();
    let texture = reg.allocate_texture(&fixtures::checker(8, 8)).unwrap();
    let material = reg.allocate_material(pipeline, &[texture]).unwrap();
    let mesh = reg.allocate_vertex_buffer(&fixtures::triangle()).unwrap();
    reg.allocate_renderable(material, mesh).unwrap();

    c.bench_function("renderable_cycle", |b| {
        b.iter(|| {
            let id = reg.allocate_renderable(material, mesh).unwrap();
            black_box(reg.destroy_renderable(id));
            black_box(reg.advance_frame());
        });
    });
}

/// Benchmark: destroy every renderable of the reference scene, cascading
/// to pipelines, then drain the deletion rings.
fn bench_full_cascade(c: &mut Criterion) {
    c.bench_function("full_cascade_reference", |b| {
        b.iter_batched(
            || {
                let mut reg = bench_registry();
                let ids = populate(&mut reg, SceneProfile::reference()).unwrap();
                (reg, ids)
            },
            |(mut reg, ids)| {
                for id in ids {
                    black_box(reg.destroy_renderable(id));
                }
                black_box(reg.flush());
                reg
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: draw traversal and instance writes over the reference scene.
fn bench_frame_record(c: &mut Criterion) {
    let mut reg = bench_registry();
    populate(&mut reg, SceneProfile::reference()).unwrap();
    let images = reg.config().swapchain_images;
    let mut image = 0;
    c.bench_function("frame_record_reference", |b| {
        b.iter(|| {
            reg.advance_frame();
            black_box(reg.write_instances(image).unwrap());
            black_box(reg.draws(image).count());
            image = (image + 1) % images;
        });
    });
}

/// Benchmark: cache lookups for an already-uploaded mesh (hash + hit).
fn bench_cache_hit(c: &mut Criterion) {
    let mut reg = bench_registry();
    let mut cache = ResourceCache::new();
    let mesh = fixtures::quad();
    cache.mesh(&mut reg, &mesh).unwrap();
    c.bench_function("cache_mesh_hit", |b| {
        b.iter(|| black_box(cache.mesh(&mut reg, &mesh).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_populate_reference,
    bench_renderable_cycle,
    bench_full_cascade,
    bench_frame_record,
    bench_cache_hit
);
criterion_main!(benches);

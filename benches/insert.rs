use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

/// Measures bundle insertion that migrates every entity to a new
/// archetype, and the cached-edge path that leaves them in place.
fn insert_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    group.bench_function("migrate_10k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_SMALL);
                populate(&mut world, ENTITIES_SMALL);
                world
            },
            |mut world| {
                let entities: Vec<_> = world.table(1).entities().to_vec();
                for entity in entities {
                    world.insert(entity, Mass { value: 1.0 }).unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("clobber_10k", |b| {
        b.iter_batched(
            || {
                let mut world = make_world(ENTITIES_SMALL);
                populate(&mut world, ENTITIES_SMALL);
                world
            },
            |mut world| {
                let entities: Vec<_> = world.table(1).entities().to_vec();
                for entity in entities {
                    world
                        .insert(entity, Velocity { dx: 2.0, dy: 2.0 })
                        .unwrap();
                }
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, insert_benchmark);
criterion_main!(benches);

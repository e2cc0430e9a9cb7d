use std::hint::black_box;

use criterion::*;
use world_registry::Command;

mod common;
use common::*;

fn spawn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    group.bench_function("spawn_100k_agents", |b| {
        b.iter_batched(
            || make_world(AGENTS_MED),
            |(mut world, ids)| {
                let entities = populate(&mut world, &ids, AGENTS_MED).expect("spawn failed in benchmark");
                black_box(entities.len());
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("spawn_100k_deferred", |b| {
        b.iter_batched(
            || make_world(AGENTS_MED),
            |(mut world, ids)| {
                for _ in 0..AGENTS_MED {
                    world.defer(Command::create(&[ids.position, ids.wealth]));
                }
                let applied = world.apply_deferred_commands().expect("deferred spawn failed");
                black_box(applied);
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, spawn_benchmark);
criterion_main!(benches);

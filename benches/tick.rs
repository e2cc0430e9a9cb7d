use std::hint::black_box;

use criterion::*;

mod common;
use common::*;

fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    group.bench_function("tick_2_systems_100k", |b| {
        b.iter_batched(
            || {
                let (mut world, ids) = make_world(AGENTS_MED);
                populate(&mut world, &ids, AGENTS_MED).expect("populate failed");

                // System 1: wealth += productivity
                world
                    .system("production")
                    .for_each2::<Productivity, Wealth, _>(|p, w| w.value += p.rate)
                    .expect("production system");

                // System 2: wealth decay
                world
                    .system("decay")
                    .for_each1::<Wealth, _>(|w| w.value *= 0.99)
                    .expect("decay system");

                world
            },
            |mut world| {
                world.tick().expect("tick failed");
                black_box(world.current_tick());
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("tick_row_view_10k", |b| {
        b.iter_batched(
            || {
                let (mut world, ids) = make_world(AGENTS_SMALL);
                populate(&mut world, &ids, AGENTS_SMALL).expect("populate failed");
                let wealth = ids.wealth;
                world
                    .register_system(
                        &[ids.position, ids.wealth],
                        move |row| {
                            if let Ok(w) = row.get_by_id_mut::<Wealth>(wealth) {
                                w.value += 1.0;
                            }
                        },
                        1,
                    )
                    .expect("row view system");
                world
            },
            |mut world| {
                world.tick().expect("tick failed");
                black_box(world.current_tick());
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);

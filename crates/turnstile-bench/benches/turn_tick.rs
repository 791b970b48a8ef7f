//! Criterion benchmarks for the turn processor.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use turnstile_bench::{arm_grenades, crowded_world, flood_input, Crowd};
use turnstile_engine::GameConfig;

fn bench_idle_turn(c: &mut Criterion) {
    let config = GameConfig::default();
    let mut core = crowded_world(Crowd::REFERENCE);
    core.turn_tick(&config);

    c.bench_function("idle_turn_1k_actors", |b| {
        b.iter(|| {
            black_box(core.turn_tick(&config).total_us);
        });
    });
}

fn bench_flooded_turn(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("flooded_turn_1k_actors", |b| {
        b.iter_batched(
            || {
                let mut core = crowded_world(Crowd::REFERENCE);
                flood_input(&mut core);
                core
            },
            |mut core| {
                black_box(core.turn_tick(&config).inputs_dispatched);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_throttled_backlog(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("throttled_backlog_10_deep", |b| {
        b.iter_batched(
            || {
                let mut core = crowded_world(Crowd::REFERENCE);
                for _ in 0..10 {
                    flood_input(&mut core);
                }
                core
            },
            |mut core| {
                black_box(core.turn_tick(&config).inputs_requeued);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_detonations(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("grenade_in_every_room", |b| {
        b.iter_batched(
            || {
                let mut core = crowded_world(Crowd::REFERENCE);
                arm_grenades(&mut core);
                core
            },
            |mut core| {
                black_box(core.turn_tick(&config).detonations);
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_idle_turn,
    bench_flooded_turn,
    bench_throttled_backlog,
    bench_detonations
);
criterion_main!(benches);

//! Criterion benchmarks for the outbound dispatcher.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use turnstile_bench::{crowded_world, Crowd};
use turnstile_core::event::Message;
use turnstile_core::id::{ActorId, RoomId};
use turnstile_engine::GameConfig;

fn bench_room_chatter(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("room_message_every_room", |b| {
        b.iter_batched(
            || {
                let mut core = crowded_world(Crowd::REFERENCE);
                let rooms: Vec<RoomId> = core.state().rooms.keys().copied().collect();
                for room in rooms {
                    core.queues_mut()
                        .push(Message::to_room(room, "Someone says, \"hello\"").communication());
                }
                core
            },
            |mut core| {
                black_box(core.message_tick(&config).deliveries);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_direct_messages(c: &mut Criterion) {
    let config = GameConfig::default();
    c.bench_function("direct_message_every_actor", |b| {
        b.iter_batched(
            || {
                let mut core = crowded_world(Crowd::REFERENCE);
                let actors: Vec<ActorId> = core.state().actors.keys().copied().collect();
                for actor in actors {
                    core.queues_mut().send_text(actor, "You feel rested.");
                }
                core
            },
            |mut core| {
                black_box(core.message_tick(&config).prompts);
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_broadcast(c: &mut Criterion) {
    let config = GameConfig::default();
    let mut core = crowded_world(Crowd::REFERENCE);
    c.bench_function("broadcast", |b| {
        b.iter(|| {
            core.queues_mut().broadcast("The server will restart soon.", false);
            black_box(core.message_tick(&config).broadcasts);
        });
    });
}

criterion_group!(
    benches,
    bench_room_chatter,
    bench_direct_messages,
    bench_broadcast
);
criterion_main!(benches);

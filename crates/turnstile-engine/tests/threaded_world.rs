//! The threaded `World`: concurrent producers, lifecycle rendezvous and
//! the persisting shutdown.
//!
//! Turns run every 5ms here, so each wait is bounded by a deadline
//! rather than a fixed sleep.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use turnstile_core::error::CommandError;
use turnstile_core::event::InputEvent;
use turnstile_core::id::{ActorId, MobId};
use turnstile_engine::{
    Collaborators, CommandHandler, GameConfig, SharedConfig, SubmitError, TurnContext, World,
    WorldCore,
};
use turnstile_test_utils::fixtures::{
    recording_core, sample_state, ANN, ANN_CONN, BOB, BOB_CONN, CLEARING, SQUARE,
};
use turnstile_test_utils::{MemoryPersistence, RecordingNetwork, RecordingScripts};

fn fast() -> SharedConfig {
    SharedConfig::new(GameConfig {
        turn_ms: 5,
        ..GameConfig::default()
    })
}

fn eventually(mut pred: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if pred() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn concurrent_producers_are_all_dispatched() {
    let t = recording_core();
    let commands = t.commands.clone();
    let mut world = World::start(t.core, fast()).unwrap();

    let producers: Vec<_> = [ANN, BOB]
        .into_iter()
        .map(|actor| {
            let input = world.input_handle();
            thread::spawn(move || {
                for i in 0..5 {
                    input.submit_actor(actor, format!("say {i}"), 0).unwrap();
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    assert!(eventually(|| {
        commands.lines_for(ANN).len() == 5 && commands.lines_for(BOB).len() == 5
    }));
    // Per-actor order survives throttling.
    let said: Vec<String> = (0..5).map(|i| format!("say {i}")).collect();
    assert_eq!(commands.lines_for(ANN), said);
    assert_eq!(commands.lines_for(BOB), said);
    world.shutdown();
}

#[test]
fn lifecycle_is_ordered_with_turns() {
    let t = recording_core();
    let net = t.net.clone();
    let mut world = World::start(t.core, fast()).unwrap();

    world.enter_world(ANN, CLEARING).unwrap();
    assert!(world.inspect(|c: &WorldCore| c.state().rooms[&CLEARING].players.contains(&ANN)));

    world.leave_world(ANN).unwrap();
    assert!(world.inspect(|c: &WorldCore| !c.state().rooms[&CLEARING].players.contains(&ANN)));

    world.logout(ANN_CONN).unwrap();
    assert!(world.inspect(|c: &WorldCore| !c.state().actors.contains_key(&ANN)));
    assert_eq!(net.disconnects(), vec![ANN_CONN]);
    world.shutdown();
}

#[test]
fn messages_reach_the_network() {
    let t = recording_core();
    let net = t.net.clone();
    let mut world = World::start(t.core, fast()).unwrap();
    world.submit(InputEvent::actor(BOB, "xyzzy", 0)).unwrap();
    assert!(eventually(|| net.text_for(BOB_CONN).contains("xyzzy not recognized")));
    world.shutdown();
}

#[test]
fn config_replacement_takes_effect_without_restart() {
    let t = recording_core();
    let config = fast();
    let mut world = World::start(t.core, config.clone()).unwrap();
    assert!(eventually(|| world.inspect(|c: &WorldCore| c.turn().0 >= 2)));

    config.replace(GameConfig {
        turn_ms: 5,
        zombie_seconds: 1,
        ..GameConfig::default()
    })
    .unwrap();
    world.set_zombie(BOB, true).unwrap();
    // 200 turns per second at 5ms, so the zombie lasts 200 turns.
    assert!(eventually(|| world.inspect(|c: &WorldCore| !c
        .state()
        .actors
        .contains_key(&BOB))));
    assert!(world.inspect(|c: &WorldCore| c.state().rooms[&SQUARE].players.contains(&ANN)));
    world.shutdown();
}

#[test]
fn shutdown_persists_and_closes_producers() {
    let t = recording_core();
    let saved = t.saved.clone();
    let mut world = World::start(t.core, fast()).unwrap();
    let input = world.input_handle();
    let lifecycle = world.lifecycle_handle();

    let report = world.shutdown();
    assert!(report.funnel_joined && report.scheduler_joined);
    let save = report.final_save.unwrap();
    assert_eq!((save.actors, save.rooms, save.failed), (2, 3, 0));
    assert_eq!(saved.rooms_saved().len(), 3);

    assert_eq!(input.submit_actor(ANN, "look", 0), Err(SubmitError::Shutdown));
    assert_eq!(lifecycle.leave_world(ANN), Err(SubmitError::Shutdown));
}

/// Panics on `boom`, records everything else.
struct Volatile(Arc<Mutex<Vec<String>>>);

impl CommandHandler for Volatile {
    fn actor_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        _actor: ActorId,
        command: &str,
        _rest: &str,
    ) -> Result<bool, CommandError> {
        if command == "boom" {
            panic!("command handler blew up");
        }
        self.0.lock().unwrap().push(command.to_string());
        Ok(true)
    }

    fn mob_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        _mob: MobId,
        _command: &str,
        _rest: &str,
    ) -> Result<bool, CommandError> {
        Ok(true)
    }
}

#[test]
fn panicking_command_does_not_stop_the_world() {
    let heard = Arc::new(Mutex::new(Vec::new()));
    let persistence = MemoryPersistence::new();
    let saved = persistence.log();
    let core = WorldCore::new(
        sample_state(),
        Collaborators::new(
            persistence,
            RecordingScripts::new(),
            RecordingNetwork::new(),
            Volatile(Arc::clone(&heard)),
        ),
    );
    let mut world = World::start(core, fast()).unwrap();

    world.submit(InputEvent::actor(ANN, "boom", 0)).unwrap();
    let after = world.inspect(|c: &WorldCore| c.turn().0);
    assert!(eventually(|| world.inspect(|c: &WorldCore| c.turn().0 > after + 3)));

    world.submit(InputEvent::actor(BOB, "look", 0)).unwrap();
    assert!(eventually(|| heard.lock().unwrap().contains(&"look".to_string())));

    world.enter_world(ANN, CLEARING).unwrap();
    assert!(world.inspect(|c: &WorldCore| c.state().rooms[&CLEARING].players.contains(&ANN)));

    let report = world.shutdown();
    assert!(report.scheduler_joined);
    assert_eq!(report.final_save.unwrap().actors, 2);
    assert_eq!(saved.rooms_saved().len(), 3);
}

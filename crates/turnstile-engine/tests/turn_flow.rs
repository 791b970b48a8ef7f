//! End-to-end turn scenarios driven in lockstep through `WorldCore`.
//!
//! Each test builds the shared fixture world, pushes events the way
//! producers and commands would, and advances whole turns with
//! `turn_tick` / `message_tick`. Nothing here touches threads.

use turnstile_core::event::{BuffChange, BuffEvent, InputEvent, QuestEvent, RoomActionEvent, Target};
use turnstile_core::id::{ItemId, TurnId};
use turnstile_engine::{GameConfig, PvpPolicy, LINE_REFRESH};
use turnstile_test_utils::fixtures::{
    drop_item, recording_core, recording_core_with, RecordingCore, ANN, ANN_CONN, BOB, BOB_CONN,
    BURN, CLEARING, GRENADE, HEARING, INCENDIARY, MEDAL_HUNT, RAT, RAT_PROBLEM, SQUARE, STUN,
};
use turnstile_test_utils::{RecordingNetwork, RecordingScripts};

fn ticks(t: &mut RecordingCore, config: &GameConfig, n: usize) {
    for _ in 0..n {
        t.core.turn_tick(config);
    }
}

fn throw(t: &mut RecordingCore, item: ItemId, name: &str, wait: u32) {
    drop_item(t.core.state_mut(), SQUARE, item);
    t.core.queues_mut().push(RoomActionEvent {
        room: SQUARE,
        source: Some(Target::Actor(ANN)),
        action: format!("detonate {name}"),
        wait_turns: wait,
    });
}

// ── Input throttling ────────────────────────────────────────────

#[test]
fn one_throttled_command_per_actor_per_turn() {
    let mut t = recording_core();
    let config = GameConfig::default();
    t.core.submit_input(InputEvent::actor(ANN, "say first", 0));
    t.core.submit_input(InputEvent::actor(ANN, "say second", 0));
    t.core.submit_input(InputEvent::actor(BOB, "look", 0));

    ticks(&mut t, &config, 1);
    assert_eq!(t.commands.lines_for(ANN), vec!["say first"]);
    assert_eq!(t.commands.lines_for(BOB), vec!["look"]);

    ticks(&mut t, &config, 1);
    assert_eq!(t.commands.lines_for(ANN), vec!["say first", "say second"]);
    assert_eq!(t.core.state().actors[&ANN].last_input_turn, TurnId(2));
}

#[test]
fn system_chains_bypass_the_throttle() {
    let mut t = recording_core();
    t.core.submit_input(InputEvent::actor(ANN, "look", 0));
    t.core.submit_input(InputEvent::actor(ANN, "say one", -1));
    t.core.submit_input(InputEvent::actor(ANN, "say two", -1));
    ticks(&mut t, &GameConfig::default(), 1);
    assert_eq!(t.commands.lines_for(ANN), vec!["look", "say one", "say two"]);
}

#[test]
fn unknown_command_is_reported_and_counted() {
    let mut t = recording_core();
    t.core.submit_input(InputEvent::actor(ANN, "dance wildly", 0));
    ticks(&mut t, &GameConfig::default(), 1);
    t.core.message_tick(&GameConfig::default());

    assert!(t
        .net
        .text_for(ANN_CONN)
        .contains("dance not recognized. Type help for commands."));
    assert_eq!(t.core.bad_input().count("dance wildly"), 1);

    ticks(&mut t, &GameConfig::default(), 1);
    assert_eq!(
        t.commands.lines_for(ANN),
        vec!["dance wildly", "emote @looks a little confused"]
    );
}

// ── Grenades ────────────────────────────────────────────────────

#[test]
fn grenade_spares_bystanders_and_provokes_the_mob() {
    let mut t = recording_core();
    let config = GameConfig::default();
    throw(&mut t, GRENADE, "grenade", 0);

    ticks(&mut t, &config, 1);
    let state = t.core.state();
    let ann = &state.actors[&ANN].character;
    assert!(ann.has_buff(BURN) && ann.has_buff(STUN));
    assert!(state.actors[&BOB].character.buffs.is_empty());
    let rat = &state.mobs[&RAT];
    assert!(rat.character.has_buff(BURN) && rat.character.has_buff(STUN));
    assert_eq!(rat.character.aggro, Some(Target::Actor(ANN)));
    assert!(state.rooms[&SQUARE].items.is_empty());

    ticks(&mut t, &config, 1);
    assert_eq!(t.commands.lines_for_mob(RAT), vec!["attack @1"]);

    t.core.message_tick(&config);
    let heard = t.net.text_for(BOB_CONN);
    assert!(heard.contains("EXPLODES"));
    assert!(heard.contains(LINE_REFRESH));
}

#[test]
fn pvp_grenade_hits_every_player() {
    let mut t = recording_core();
    let config = GameConfig {
        pvp: PvpPolicy::Enabled,
        ..GameConfig::default()
    };
    throw(&mut t, GRENADE, "grenade", 0);
    ticks(&mut t, &config, 1);
    assert!(t.core.state().actors[&BOB].character.has_buff(STUN));
}

#[test]
fn delayed_grenade_fires_once_after_its_countdown() {
    let mut t = recording_core();
    let config = GameConfig::default();
    throw(&mut t, GRENADE, "grenade", 3);

    ticks(&mut t, &config, 3);
    assert_eq!(t.core.state().rooms[&SQUARE].items.len(), 1);
    assert!(t.core.state().actors[&ANN].character.buffs.is_empty());

    ticks(&mut t, &config, 1);
    assert!(t.core.state().rooms[&SQUARE].items.is_empty());
    assert_eq!(t.core.metrics().detonations, 1);
    assert!(t.core.queues().room_action.is_empty());

    ticks(&mut t, &config, 5);
    assert_eq!(t.core.metrics().detonations, 0);
}

#[test]
fn incendiary_sets_the_room_ablaze_a_turn_later() {
    let mut t = recording_core();
    let config = GameConfig::default();
    throw(&mut t, INCENDIARY, "incendiary", 0);
    ticks(&mut t, &config, 1);
    assert!(t.core.state().rooms[&SQUARE].effects.is_empty());
    ticks(&mut t, &config, 1);
    assert_eq!(t.core.state().rooms[&SQUARE].effects.len(), 1);
}

#[test]
fn lethal_trigger_makes_the_mob_give_up() {
    let scripts = RecordingScripts::new().with_trigger_damage(50);
    let mut t = recording_core_with(RecordingNetwork::new(), scripts);
    let config = GameConfig::default();
    throw(&mut t, GRENADE, "grenade", 0);
    ticks(&mut t, &config, 2);
    let lines = t.commands.lines_for_mob(RAT);
    assert!(lines.contains(&"suicide".to_string()));
}

// ── Buffs ───────────────────────────────────────────────────────

#[test]
fn buffs_expire_on_their_turn_and_can_be_stripped() {
    let mut t = recording_core();
    let config = GameConfig::default();
    t.core.queues_mut().push(BuffEvent {
        target: Target::Actor(ANN),
        change: BuffChange::Apply(STUN),
    });
    t.core.queues_mut().push(BuffEvent {
        target: Target::Actor(ANN),
        change: BuffChange::Apply(HEARING),
    });
    ticks(&mut t, &config, 1);
    assert!(t.core.state().actors[&ANN].character.has_buff(STUN));

    // Applied on turn 1 for two turns.
    ticks(&mut t, &config, 1);
    assert!(t.core.state().actors[&ANN].character.has_buff(STUN));
    ticks(&mut t, &config, 1);
    assert!(!t.core.state().actors[&ANN].character.has_buff(STUN));
    assert_eq!(t.core.metrics().buffs_expired, 1);

    t.core.queues_mut().push(BuffEvent {
        target: Target::Actor(ANN),
        change: BuffChange::Remove(HEARING),
    });
    ticks(&mut t, &config, 1);
    assert!(t.core.state().actors[&ANN].character.buffs.is_empty());
    assert_eq!(t.core.metrics().buffs_removed, 1);
}

// ── Quests ──────────────────────────────────────────────────────

fn grant(t: &mut RecordingCore, token: &str) {
    t.core.queues_mut().push(QuestEvent {
        actor: ANN,
        token: token.to_string(),
    });
}

#[test]
fn finishing_a_quest_pays_out_once() {
    let mut t = recording_core();
    let config = GameConfig::default();
    for step in ["1-start", "1-middle", "1-end"] {
        grant(&mut t, step);
        ticks(&mut t, &config, 1);
    }
    let ann = &t.core.state().actors[&ANN];
    assert_eq!(ann.character.quests.step(RAT_PROBLEM), Some("end"));
    assert_eq!(ann.character.gold, 50);
    assert_eq!(ann.character.experience, 100);
    assert_eq!(ann.character.room, CLEARING);
    assert_eq!(ann.character.backpack.len(), 1);

    // Buff and follow-up token land in the next generation.
    ticks(&mut t, &config, 1);
    let ann = &t.core.state().actors[&ANN].character;
    assert!(ann.has_buff(HEARING));
    assert_eq!(ann.quests.step(MEDAL_HUNT), Some("start"));

    grant(&mut t, "1-end");
    ticks(&mut t, &config, 1);
    assert_eq!(t.core.metrics().events_dropped, 1);
    assert_eq!(t.core.state().actors[&ANN].character.gold, 50);
}

#[test]
fn completion_is_announced_to_the_old_room() {
    let mut t = recording_core();
    let config = GameConfig::default();
    for step in ["1-start", "1-middle", "1-end"] {
        grant(&mut t, step);
        ticks(&mut t, &config, 1);
    }
    t.core.message_tick(&config);
    let bob = t.net.text_for(BOB_CONN);
    assert!(bob.contains("The crowd cheers."));
    assert!(bob.contains("Ann is suddenly moved to a new place!"));
    let ann = t.net.text_for(ANN_CONN);
    assert!(ann.contains("You have completed the quest: Rat Problem!"));
    assert!(!ann.contains("The crowd cheers."));
}

// ── Zombies ─────────────────────────────────────────────────────

#[test]
fn zombie_lingers_for_the_configured_turns() {
    let mut t = recording_core();
    let config = GameConfig {
        zombie_seconds: 2,
        ..GameConfig::default()
    };
    t.core.set_zombie(BOB, true);
    ticks(&mut t, &config, 20);
    assert!(t.core.state().actors.contains_key(&BOB));
    ticks(&mut t, &config, 1);
    assert!(!t.core.state().actors.contains_key(&BOB));
    assert!(!t.core.state().rooms[&SQUARE].players.contains(&BOB));
    assert_eq!(t.net.disconnects(), vec![BOB_CONN]);
    assert_eq!(t.saved.actors_saved(), vec![BOB]);
}

#[test]
fn returning_player_is_no_longer_a_zombie() {
    let mut t = recording_core();
    let config = GameConfig {
        zombie_seconds: 1,
        ..GameConfig::default()
    };
    t.core.set_zombie(BOB, true);
    ticks(&mut t, &config, 5);
    t.core.enter_world(BOB, SQUARE, &config).unwrap();
    ticks(&mut t, &config, 20);
    assert!(t.core.state().actors.contains_key(&BOB));
}

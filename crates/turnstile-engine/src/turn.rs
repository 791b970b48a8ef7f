//! The turn processor: one call per turn-timer firing.
//!
//! Phases run in a fixed order and each completes before the next begins:
//!
//! 1. Advance the turn counter.
//! 2. Expire zombies.
//! 3. Autosave (on the autosave cadence).
//! 4. Drain the input queue.
//! 5. Drain the room action queue.
//! 6. Drain the buff queue.
//! 7. Drain the quest queue.
//! 8. Prune expired buffs.
//! 9. Regenerate action points.
//! 10. Level-up evaluation (once per second of turns).
//! 11. Round upkeep (once per round).

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::metrics::{micros, TurnMetrics};
use crate::world_core::{turn_context, WorldCore};

impl WorldCore {
    /// Run one turn and return its metrics.
    pub fn turn_tick(&mut self, config: &GameConfig) -> &TurnMetrics {
        let tick_start = Instant::now();
        let mut m = TurnMetrics::default();

        // 1. Advance.
        self.turn = self.turn.next();
        m.turn = self.turn;

        // 2. Zombies.
        let t = Instant::now();
        m.zombies_expired = self.sweep_zombies(config);
        m.zombie_sweep_us = micros(t.elapsed());

        // 3. Autosave.
        if self.turn.is_multiple_of(config.turns_per_autosave()) {
            let t = Instant::now();
            self.autosave();
            m.autosave_us = micros(t.elapsed());
        }

        // 4. Input.
        self.pull_inbox();
        let t = Instant::now();
        self.drain_input(&mut m, config);
        m.input_us = micros(t.elapsed());

        // 5. Room actions.
        let t = Instant::now();
        self.drain_room_actions(&mut m, config);
        m.room_action_us = micros(t.elapsed());

        // 6. Buffs.
        let t = Instant::now();
        self.drain_buffs(&mut m);
        m.buff_us = micros(t.elapsed());

        // 7. Quests.
        let t = Instant::now();
        self.drain_quests(&mut m);
        m.quest_us = micros(t.elapsed());

        // 8. Expired buffs.
        self.prune_buffs(&mut m);

        // 9. Action points.
        for actor in self.state.actors.values_mut() {
            actor.character.regain_action_point();
        }

        // 10. Level-ups.
        if self.turn.is_multiple_of(config.turns_per_second()) {
            let mut ctx = turn_context!(self, config);
            self.hooks.check_level_ups(&mut ctx);
        }

        // 11. Rounds.
        if self.turn.is_multiple_of(config.turns_per_round()) {
            let mut ctx = turn_context!(self, config);
            self.hooks.round_tick(&mut ctx);
        }

        let elapsed = tick_start.elapsed();
        m.total_us = micros(elapsed);
        self.timings.record("turn", elapsed);
        self.metrics = m;
        &self.metrics
    }

    /// Leave-world and log out every zombie past the timeout.
    fn sweep_zombies(&mut self, config: &GameConfig) -> u32 {
        let expired = self.zombies.expired(self.turn, config.zombie_turns());
        if expired.is_empty() {
            return 0;
        }
        info!(count = expired.len(), turn = %self.turn, "expiring zombies");

        let connections: Vec<_> = expired
            .iter()
            .filter_map(|id| self.state.actors.get(id).map(|a| a.connection))
            .collect();
        for &actor in &expired {
            if let Err(e) = self.leave_world(actor) {
                warn!(actor = %actor, error = %e, "zombie already gone");
            }
            self.zombies.clear(actor);
        }
        for connection in connections {
            self.logout(connection);
        }
        u32::try_from(expired.len()).unwrap_or(u32::MAX)
    }

    /// Save everything, announcing each phase to every client.
    fn autosave(&mut self) {
        let start = Instant::now();
        self.queues.broadcast("Saving users...", false);
        let actors = self.save_actors();
        self.queues.broadcast("Done.\r\n", true);

        self.queues.broadcast("Saving rooms...", false);
        let rooms = self.save_rooms();
        self.queues.broadcast("Done.\r\n", true);
        self.timings.record("Save Game State", start.elapsed());
        debug!(
            actors = actors.actors,
            rooms = rooms.rooms,
            failed = actors.failed + rooms.failed,
            "autosave complete"
        );

        self.queues.broadcast("Updating leaderboards...", false);
        let start = Instant::now();
        self.hooks.update_leaderboards(&self.state);
        self.timings.record("Leaderboards", start.elapsed());
        self.queues.broadcast("Done.\r\n", true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_core;
    use turnstile_core::event::InputEvent;
    use turnstile_core::id::{ActorId, ConnectionId, TurnId};

    fn config() -> GameConfig {
        GameConfig {
            turn_ms: 100,
            round_seconds: 1,
            autosave_minutes: 1,
            zombie_seconds: 1,
            ..GameConfig::default()
        }
    }

    // ── Counter and cadence ─────────────────────────────────────

    #[test]
    fn turn_advances_and_metrics_are_stored() {
        let mut t = test_core();
        let c = config();
        assert_eq!(t.core.turn_tick(&c).turn, TurnId(1));
        t.core.turn_tick(&c);
        assert_eq!(t.core.turn(), TurnId(2));
        assert_eq!(t.core.metrics().turn, TurnId(2));
        assert_eq!(t.core.timings().get("turn").unwrap().count, 2);
    }

    #[test]
    fn autosave_runs_on_cadence_and_announces() {
        let mut t = test_core();
        let c = config();
        for _ in 0..599 {
            t.core.turn_tick(&c);
        }
        assert!(t.saved.actors_saved().is_empty());
        t.core.turn_tick(&c);
        assert_eq!(t.saved.actors_saved().len(), 2);
        assert_eq!(t.saved.rooms_saved().len(), 3);
        assert_eq!(t.core.queues().broadcast.len(), 6);
        assert_eq!(t.core.timings().get("Save Game State").unwrap().count, 1);
        assert_eq!(t.core.timings().get("Leaderboards").unwrap().count, 1);
    }

    #[test]
    fn action_points_regenerate_to_cap() {
        let mut t = test_core();
        let c = config();
        for _ in 0..15 {
            t.core.turn_tick(&c);
        }
        let ann = &t.core.state().actors[&ActorId(1)].character;
        assert_eq!(ann.action_points, ann.action_points_max);
    }

    // ── Zombies ─────────────────────────────────────────────────

    #[test]
    fn zombie_is_logged_out_only_after_timeout() {
        let mut t = test_core();
        let c = config();
        t.core.set_zombie(ActorId(1), true);
        // Flagged at turn 0; timeout is 10 turns.
        for _ in 0..10 {
            t.core.turn_tick(&c);
        }
        assert!(t.core.state().actors.contains_key(&ActorId(1)));
        t.core.turn_tick(&c);
        assert!(!t.core.state().actors.contains_key(&ActorId(1)));
        assert!(t.core.zombies().is_empty());
        assert_eq!(t.core.metrics().zombies_expired, 1);
        assert_eq!(t.net.disconnects(), vec![ConnectionId(10)]);
    }

    // ── Input ───────────────────────────────────────────────────

    #[test]
    fn funnel_inbox_feeds_the_same_turn() {
        let mut t = test_core();
        let (tx, rx) = crossbeam_channel::unbounded();
        t.core.attach_inbox(rx);
        tx.send(InputEvent::actor(ActorId(1), "look", 0)).unwrap();
        t.core.turn_tick(&config());
        assert_eq!(t.core.metrics().inputs_dispatched, 1);
    }
}

//! Buff queue drain and expiry pruning.

use tracing::{debug, trace};

use turnstile_core::event::{BuffChange, BuffEvent, InputEvent, Target};
use turnstile_core::id::BuffId;
use turnstile_core::traits::BuffHook;

use crate::metrics::TurnMetrics;
use crate::world_core::WorldCore;

impl WorldCore {
    /// Drain one generation of the buff queue.
    pub(crate) fn drain_buffs(&mut self, m: &mut TurnMetrics) {
        for event in self.queues.buff.take_generation() {
            trace!(target = ?event.target, change = ?event.change, "buff event");
            if self.apply_buff_event(event, m) {
                continue;
            }
            m.events_dropped += 1;
        }
    }

    fn apply_buff_event(&mut self, event: BuffEvent, m: &mut TurnMetrics) -> bool {
        let BuffEvent { target, change } = event;
        let Some(spec) = self.state.catalog.buff(change.buff()).cloned() else {
            debug!(buff = %change.buff(), "buff event for unknown buff");
            return false;
        };
        let turn = self.turn;
        let Ok(character) = self.state.character_mut(target) else {
            debug!(target = ?target, "buff event for missing target");
            return false;
        };

        if let BuffChange::Remove(id) = change {
            if character.remove_buff(id) {
                m.buffs_removed += 1;
            }
            return true;
        }

        character.add_buff(&spec, turn);
        m.buffs_applied += 1;

        if self.run_buff_hook(BuffHook::OnStart, target, spec.id) {
            if let Ok(character) = self.state.character_mut(target) {
                character.track_buff_started(spec.id);
            }
        }

        if spec.trigger_now {
            self.run_buff_hook(BuffHook::OnTrigger, target, spec.id);
            if let Target::Mob(mob) = target {
                let dead = self
                    .state
                    .mobs
                    .get(&mob)
                    .is_some_and(|brute| brute.character.health <= 0);
                if dead {
                    self.queues.push(InputEvent::mob(mob, "suicide", -1));
                }
            }
        }
        true
    }

    /// Strip every lapsed buff and run its end hook.
    pub(crate) fn prune_buffs(&mut self, m: &mut TurnMetrics) {
        let turn = self.turn;
        let mut expired: Vec<(Target, BuffId)> = Vec::new();
        for (&id, actor) in self.state.actors.iter_mut() {
            for buff in actor.character.take_expired_buffs(turn) {
                expired.push((Target::Actor(id), buff));
            }
        }
        for (&id, brute) in self.state.mobs.iter_mut() {
            for buff in brute.character.take_expired_buffs(turn) {
                expired.push((Target::Mob(id), buff));
            }
        }
        m.buffs_expired = u32::try_from(expired.len()).unwrap_or(u32::MAX);
        for (target, buff) in expired {
            self.run_buff_hook(BuffHook::OnEnd, target, buff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_core, test_core_with};
    use turnstile_core::id::TurnId;
    use turnstile_test_utils::fixtures::{ANN, BURN, CHARM, HEARING, RAT, STUN};
    use turnstile_test_utils::{RecordingNetwork, RecordingScripts};

    fn apply(target: Target, buff: BuffId) -> BuffEvent {
        BuffEvent {
            target,
            change: BuffChange::Apply(buff),
        }
    }

    fn drain(t: &mut crate::testing::TestCore) -> TurnMetrics {
        let mut m = TurnMetrics::default();
        t.core.drain_buffs(&mut m);
        m
    }

    // ── Apply ───────────────────────────────────────────────────

    #[test]
    fn apply_runs_start_hook_and_marks_started() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Actor(ANN), STUN));
        let m = drain(&mut t);
        assert_eq!(m.buffs_applied, 1);
        assert_eq!(
            t.scripts.calls(),
            vec![(BuffHook::OnStart, Target::Actor(ANN), STUN)]
        );
        let held = &t.core.state().actors[&ANN].character.buffs[0];
        assert!(held.started);
        assert_eq!(held.expires, Some(TurnId(2)));
    }

    #[test]
    fn failed_start_hook_leaves_buff_unstarted() {
        let mut t = test_core_with(
            RecordingNetwork::new(),
            RecordingScripts::new().failing_on(BuffHook::OnStart),
        );
        t.core.queues_mut().push(apply(Target::Actor(ANN), HEARING));
        drain(&mut t);
        let held = &t.core.state().actors[&ANN].character.buffs[0];
        assert!(!held.started);
    }

    #[test]
    fn trigger_now_fires_immediately() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Actor(ANN), BURN));
        drain(&mut t);
        assert_eq!(t.scripts.calls_of(BuffHook::OnTrigger), vec![(Target::Actor(ANN), BURN)]);
    }

    #[test]
    fn mob_killed_by_trigger_is_told_to_die() {
        let mut t = test_core_with(
            RecordingNetwork::new(),
            RecordingScripts::new().with_trigger_damage(50),
        );
        t.core.queues_mut().push(apply(Target::Mob(RAT), BURN));
        drain(&mut t);
        let orders: Vec<_> = t.core.queues().input.iter().cloned().collect();
        assert_eq!(orders, vec![InputEvent::mob(RAT, "suicide", -1)]);
    }

    #[test]
    fn actor_killed_by_trigger_is_not_told_to_die() {
        let mut t = test_core_with(
            RecordingNetwork::new(),
            RecordingScripts::new().with_trigger_damage(50),
        );
        t.core.queues_mut().push(apply(Target::Actor(ANN), BURN));
        drain(&mut t);
        assert!(t.core.queues().input.is_empty());
    }

    // ── Remove and drop ─────────────────────────────────────────

    #[test]
    fn remove_strips_without_hooks() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Actor(ANN), CHARM));
        drain(&mut t);
        t.core.queues_mut().push(BuffEvent {
            target: Target::Actor(ANN),
            change: BuffChange::Remove(CHARM),
        });
        let m = drain(&mut t);
        assert_eq!(m.buffs_removed, 1);
        assert!(t.core.state().actors[&ANN].character.buffs.is_empty());
        assert!(t.scripts.calls_of(BuffHook::OnEnd).is_empty());
    }

    #[test]
    fn unknown_buff_or_target_is_dropped() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Actor(ANN), BuffId(99)));
        t.core
            .queues_mut()
            .push(apply(Target::Actor(turnstile_core::id::ActorId(99)), STUN));
        let m = drain(&mut t);
        assert_eq!(m.events_dropped, 2);
        assert!(t.scripts.calls().is_empty());
    }

    // ── Expiry ──────────────────────────────────────────────────

    #[test]
    fn expired_buffs_run_end_hook_once() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Mob(RAT), STUN));
        drain(&mut t);

        let mut m = TurnMetrics::default();
        t.core.turn = TurnId(1);
        t.core.prune_buffs(&mut m);
        assert_eq!(m.buffs_expired, 0);

        t.core.turn = TurnId(2);
        t.core.prune_buffs(&mut m);
        assert_eq!(m.buffs_expired, 1);
        t.core.prune_buffs(&mut m);
        assert_eq!(m.buffs_expired, 0);
        assert_eq!(t.scripts.calls_of(BuffHook::OnEnd), vec![(Target::Mob(RAT), STUN)]);
    }

    #[test]
    fn permanent_buffs_never_expire() {
        let mut t = test_core();
        t.core.queues_mut().push(apply(Target::Actor(ANN), HEARING));
        drain(&mut t);
        t.core.turn = TurnId(1_000_000);
        let mut m = TurnMetrics::default();
        t.core.prune_buffs(&mut m);
        assert_eq!(t.core.state().actors[&ANN].character.buffs.len(), 1);
    }
}

//! Per-turn performance metrics and cumulative phase timings.
//!
//! [`TurnMetrics`] captures timing and event counts for the most recent
//! turn. [`TimeTracker`] accumulates named phase durations across the
//! life of the world (autosave, leaderboards, whole turns).

use std::time::Duration;

use indexmap::IndexMap;

use turnstile_core::id::TurnId;

/// Timing and event counts for a single turn.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnMetrics {
    /// Turn these metrics describe.
    pub turn: TurnId,
    /// Wall-clock time for the whole turn.
    pub total_us: u64,
    /// Time spent expiring zombies.
    pub zombie_sweep_us: u64,
    /// Time spent autosaving (zero on non-autosave turns).
    pub autosave_us: u64,
    /// Time spent draining the input queue.
    pub input_us: u64,
    /// Time spent draining the room action queue.
    pub room_action_us: u64,
    /// Time spent draining the buff queue.
    pub buff_us: u64,
    /// Time spent draining the quest queue.
    pub quest_us: u64,
    /// Zombies logged out this turn.
    pub zombies_expired: u32,
    /// Input events dispatched to a command handler.
    pub inputs_dispatched: u32,
    /// Input events pushed to the next generation.
    pub inputs_requeued: u32,
    /// Room actions that fired.
    pub room_actions_fired: u32,
    /// Room actions still counting down.
    pub room_actions_requeued: u32,
    /// Grenades that went off.
    pub detonations: u32,
    /// Buffs applied.
    pub buffs_applied: u32,
    /// Buffs removed on request.
    pub buffs_removed: u32,
    /// Buffs that lapsed.
    pub buffs_expired: u32,
    /// Quest tokens granted.
    pub quests_granted: u32,
    /// Quest tokens revoked.
    pub quests_revoked: u32,
    /// Events dropped because their actor, mob, room or spec was gone.
    pub events_dropped: u32,
}

/// Cumulative statistics for one named phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Times the phase ran.
    pub count: u64,
    /// Sum of all durations.
    pub total: Duration,
    /// Longest single run.
    pub max: Duration,
}

impl PhaseTiming {
    /// Mean duration, zero if the phase never ran.
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.count as f64),
        }
    }
}

/// Named phase timings, in first-recorded order.
#[derive(Clone, Debug, Default)]
pub struct TimeTracker {
    phases: IndexMap<&'static str, PhaseTiming>,
}

impl TimeTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one run of `phase`.
    pub fn record(&mut self, phase: &'static str, elapsed: Duration) {
        let entry = self.phases.entry(phase).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    /// Statistics for `phase`.
    pub fn get(&self, phase: &str) -> Option<&PhaseTiming> {
        self.phases.get(phase)
    }

    /// Every phase with its statistics.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PhaseTiming)> {
        self.phases.iter().map(|(k, v)| (*k, v))
    }
}

/// Microseconds in `d`, saturating.
pub(crate) fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

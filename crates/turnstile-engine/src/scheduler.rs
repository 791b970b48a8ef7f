//! The tick scheduler: one thread that turns timers and lifecycle
//! signals into units of work under the exclusivity token.
//!
//! Each iteration re-reads the configuration, waits for the first ready
//! source (shutdown, a lifecycle signal, or the earliest due timer) and
//! services exactly that one. A serviced timer is rearmed a fixed period
//! after it fired; drift is tolerated.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};
use tracing::{debug, error, info, warn};

use turnstile_core::id::{ActorId, ConnectionId, RoomId};

use crate::config::{ConfigWatcher, GameConfig, SharedConfig};
use crate::lifecycle::{LifecycleReceivers, Signal};
use crate::lock::WorldLock;
use crate::world_core::SaveReport;

/// Statistics refresh period.
pub const STATS_PERIOD: Duration = Duration::from_secs(10);
/// Room maintenance period.
pub const MAINTENANCE_PERIOD: Duration = Duration::from_secs(3);
/// Alias and configuration reload period.
pub const RELOAD_PERIOD: Duration = Duration::from_secs(4);
/// Outbound dispatch period.
pub const MESSAGE_PERIOD: Duration = Duration::from_millis(1);

// ── Timers ──────────────────────────────────────────────────────

/// The scheduler's periodic work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Timer {
    Turn,
    Message,
    Maintenance,
    Reload,
    Stats,
}

impl Timer {
    /// Service order when several are due at once.
    const ALL: [Timer; 5] = [
        Timer::Turn,
        Timer::Message,
        Timer::Maintenance,
        Timer::Reload,
        Timer::Stats,
    ];

    fn period(self, turn_period: Duration) -> Duration {
        match self {
            Timer::Turn => turn_period,
            Timer::Message => MESSAGE_PERIOD,
            Timer::Maintenance => MAINTENANCE_PERIOD,
            Timer::Reload => RELOAD_PERIOD,
            Timer::Stats => STATS_PERIOD,
        }
    }
}

/// Next deadline of every timer.
#[derive(Debug)]
pub(crate) struct Timers {
    deadlines: [Instant; 5],
}

impl Timers {
    /// Arm every timer one period from `now`.
    pub fn new(now: Instant, turn_period: Duration) -> Self {
        Self {
            deadlines: Timer::ALL.map(|t| now + t.period(turn_period)),
        }
    }

    fn slot(timer: Timer) -> usize {
        Timer::ALL.iter().position(|&t| t == timer).unwrap_or(0)
    }

    /// The first timer in service order whose deadline has passed.
    pub fn due(&self, now: Instant) -> Option<Timer> {
        Timer::ALL
            .into_iter()
            .find(|&t| self.deadlines[Self::slot(t)] <= now)
    }

    /// How long until the earliest deadline.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.deadlines
            .iter()
            .min()
            .map_or(Duration::ZERO, |&at| at.saturating_duration_since(now))
    }

    /// Rearm `timer` one period after `now`.
    pub fn rearm(&mut self, timer: Timer, now: Instant, turn_period: Duration) {
        self.deadlines[Self::slot(timer)] = now + timer.period(turn_period);
    }
}

// ── Scheduler ───────────────────────────────────────────────────

/// Run one unit of work, logging a panic instead of unwinding the loop.
///
/// The exclusivity token is poisoned by the panic and recovered by the
/// next [`WorldLock::lock`].
fn contain<R>(unit: &'static str, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => Some(r),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(unit, reason = %reason, "unit of work panicked; continuing");
            None
        }
    }
}

enum Wake {
    Shutdown,
    Timer(Timer),
    Enter(Signal<(ActorId, RoomId)>),
    Leave(Signal<ActorId>),
    Logout(Signal<ConnectionId>),
    Zombie(Signal<(ActorId, bool)>),
}

/// State owned by the scheduler thread.
pub(crate) struct Scheduler {
    world: WorldLock,
    config: SharedConfig,
    watcher: Option<ConfigWatcher>,
    lifecycle: LifecycleReceivers,
    shutdown: Receiver<()>,
}

impl Scheduler {
    pub fn new(
        world: WorldLock,
        config: SharedConfig,
        watcher: Option<ConfigWatcher>,
        lifecycle: LifecycleReceivers,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            world,
            config,
            watcher,
            lifecycle,
            shutdown,
        }
    }

    /// Main loop. Runs until shutdown, then persists the world.
    pub fn run(mut self) -> SaveReport {
        info!("scheduler started");
        let mut timers = Timers::new(Instant::now(), self.config.current().turn_period());

        loop {
            let config = self.config.current();
            let turn_period = config.turn_period();

            match self.wait(&timers) {
                Wake::Shutdown => break,
                Wake::Timer(timer) => {
                    contain("timer", || self.service_timer(timer, &config));
                    timers.rearm(timer, Instant::now(), turn_period);
                }
                Wake::Enter(signal) => {
                    let (actor, room) = signal.payload;
                    contain("enter-world", || {
                        if let Err(e) = self.world.lock().enter_world(actor, room, &config) {
                            warn!(actor = %actor, error = %e, "enter-world failed");
                        }
                    });
                    signal.ack();
                }
                Wake::Leave(signal) => {
                    let actor = signal.payload;
                    contain("leave-world", || {
                        if let Err(e) = self.world.lock().leave_world(actor) {
                            warn!(actor = %actor, error = %e, "leave-world failed");
                        }
                    });
                    signal.ack();
                }
                Wake::Logout(signal) => {
                    let connection = signal.payload;
                    contain("logout", || self.world.lock().logout(connection));
                    signal.ack();
                }
                Wake::Zombie(signal) => {
                    let (actor, zombie) = signal.payload;
                    contain("set-zombie", || self.world.lock().set_zombie(actor, zombie));
                    signal.ack();
                }
            }
        }

        warn!("scheduler received shutdown");
        let report = contain("final save", || self.world.lock().persist_all()).unwrap_or_default();
        info!("scheduler stopped");
        report
    }

    fn wait(&self, timers: &Timers) -> Wake {
        let timeout = timers.until_next(Instant::now());
        let lc = &self.lifecycle;
        select! {
            recv(self.shutdown) -> _ => Wake::Shutdown,
            recv(lc.enter) -> msg => msg.map_or(Wake::Shutdown, Wake::Enter),
            recv(lc.leave) -> msg => msg.map_or(Wake::Shutdown, Wake::Leave),
            recv(lc.logout) -> msg => msg.map_or(Wake::Shutdown, Wake::Logout),
            recv(lc.zombie) -> msg => msg.map_or(Wake::Shutdown, Wake::Zombie),
            default(timeout) => {
                let now = Instant::now();
                Wake::Timer(timers.due(now).unwrap_or(Timer::Message))
            }
        }
    }

    fn service_timer(&mut self, timer: Timer, config: &GameConfig) {
        match timer {
            Timer::Turn => {
                let mut world = self.world.lock();
                let m = world.turn_tick(config);
                debug!(turn = %m.turn, total_us = m.total_us, "turn");
            }
            Timer::Message => {
                self.world.lock().message_tick(config);
            }
            Timer::Maintenance => self.world.lock().room_maintenance(config),
            Timer::Reload => {
                if let Some(watcher) = self.watcher.as_mut() {
                    if let Err(e) = watcher.poll() {
                        error!(path = %watcher.path().display(), error = %e, "config reload failed");
                    }
                }
                self.world.lock().reload();
            }
            Timer::Stats => self.world.lock().update_stats(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TURN: Duration = Duration::from_millis(100);

    // ── Timers ──────────────────────────────────────────────────

    #[test]
    fn nothing_due_before_first_period() {
        let start = Instant::now();
        let timers = Timers::new(start, TURN);
        assert_eq!(timers.due(start), None);
        assert_eq!(timers.until_next(start), MESSAGE_PERIOD);
    }

    #[test]
    fn turn_wins_when_everything_is_due() {
        let start = Instant::now();
        let timers = Timers::new(start, TURN);
        assert_eq!(timers.due(start + STATS_PERIOD), Some(Timer::Turn));
    }

    #[test]
    fn rearm_pushes_deadline_one_period_out() {
        let start = Instant::now();
        let mut timers = Timers::new(start, TURN);
        let fired = start + TURN;
        assert_eq!(timers.due(fired), Some(Timer::Turn));
        timers.rearm(Timer::Turn, fired, TURN);
        timers.rearm(Timer::Message, fired, TURN);
        assert_eq!(timers.due(fired), None);
        assert_eq!(timers.due(fired + TURN), Some(Timer::Turn));
    }

    #[test]
    fn slow_timers_fire_in_order() {
        let start = Instant::now();
        let mut timers = Timers::new(start, STATS_PERIOD * 2);
        let now = start + MAINTENANCE_PERIOD;
        timers.rearm(Timer::Message, now, STATS_PERIOD * 2);
        assert_eq!(timers.due(now), Some(Timer::Maintenance));
        timers.rearm(Timer::Maintenance, now, STATS_PERIOD * 2);
        assert_eq!(timers.due(now), None);
        let later = start + RELOAD_PERIOD;
        timers.rearm(Timer::Message, later, STATS_PERIOD * 2);
        assert_eq!(timers.due(later), Some(Timer::Reload));
    }

    // ── Panic containment ───────────────────────────────────────

    #[test]
    fn contained_panic_yields_none() {
        assert_eq!(contain("test", || 7), Some(7));
        assert_eq!(contain("test", || -> u8 { panic!("boom") }), None);
    }

    #[test]
    fn overdue_timer_waits_zero() {
        let start = Instant::now();
        let timers = Timers::new(start, TURN);
        assert_eq!(timers.until_next(start + TURN * 3), Duration::ZERO);
    }
}

//! User-facing threaded [`World`] and its shutdown sequence.
//!
//! # Architecture
//!
//! ```text
//! Producers                 Funnel thread              Scheduler thread
//!     |                          |                            |
//!     |--submit()--------------->| forwards to inbox -------->| turn timer
//!     |   [bounded(0)]           |                            |   lock; turn_tick()
//!     |                          |                            | message timer
//!     |--enter_world() etc.--------------------------------->|   lock; message_tick()
//!     |   [bounded(0) + ack]                                  | lifecycle signal
//!     |<--ack-------------------------------------------------|   lock; enter_world() ...
//!     |                                                       |
//!     |--stats() / inspect()--> lock; copy out                |
//! ```
//!
//! Shutdown drops the shared shutdown sender. Both threads observe the
//! disconnect; the scheduler persists the world before it exits.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use turnstile_core::event::InputEvent;
use turnstile_core::id::{ActorId, ConnectionId, RoomId};

use crate::config::{ConfigError, ConfigWatcher, SharedConfig};
use crate::funnel::{spawn_funnel, InputHandle, SubmitError};
use crate::lifecycle::{lifecycle_channels, LifecycleHandle};
use crate::lock::WorldLock;
use crate::scheduler::Scheduler;
use crate::stats::ServerStats;
use crate::world_core::{SaveReport, WorldCore};

// ── ShutdownReport ──────────────────────────────────────────────

/// Report from [`World::shutdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Total time spent shutting down.
    pub total_ms: u64,
    /// Whether the funnel thread was joined.
    pub funnel_joined: bool,
    /// Whether the scheduler thread was joined.
    pub scheduler_joined: bool,
    /// The final save, if the scheduler got to make it.
    pub final_save: Option<SaveReport>,
}

// ── World ───────────────────────────────────────────────────────

/// A running world: the funnel and scheduler threads around a core.
pub struct World {
    lock: WorldLock,
    config: SharedConfig,
    input: InputHandle,
    lifecycle: LifecycleHandle,
    shutdown_tx: Option<Sender<()>>,
    funnel_thread: Option<JoinHandle<()>>,
    scheduler_thread: Option<JoinHandle<SaveReport>>,
}

impl World {
    /// Start the world with a fixed configuration handle.
    ///
    /// The configuration is validated first. Replacing it through
    /// `config` takes effect on the scheduler's next iteration.
    pub fn start(core: WorldCore, config: SharedConfig) -> Result<Self, ConfigError> {
        Self::spawn(core, config, None)
    }

    /// Start the world and reload its configuration from the watched
    /// file on the reload timer.
    pub fn start_watching(
        core: WorldCore,
        watcher: ConfigWatcher,
        config: SharedConfig,
    ) -> Result<Self, ConfigError> {
        Self::spawn(core, config, Some(watcher))
    }

    fn spawn(
        mut core: WorldCore,
        config: SharedConfig,
        watcher: Option<ConfigWatcher>,
    ) -> Result<Self, ConfigError> {
        config.current().validate()?;

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let (inbox_tx, inbox_rx) = crossbeam_channel::unbounded::<InputEvent>();
        core.attach_inbox(inbox_rx);
        let lock = WorldLock::new(core);

        let (input, funnel_thread) =
            spawn_funnel(inbox_tx, shutdown_rx.clone()).map_err(|e| {
                ConfigError::ThreadSpawnFailed {
                    name: "turnstile-funnel",
                    reason: e.to_string(),
                }
            })?;

        let (lifecycle, receivers) = lifecycle_channels();
        let scheduler = Scheduler::new(
            lock.clone(),
            config.clone(),
            watcher,
            receivers,
            shutdown_rx,
        );
        let scheduler_thread = match thread::Builder::new()
            .name("turnstile-scheduler".into())
            .spawn(move || scheduler.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                drop(shutdown_tx);
                let _ = funnel_thread.join();
                return Err(ConfigError::ThreadSpawnFailed {
                    name: "turnstile-scheduler",
                    reason: e.to_string(),
                });
            }
        };

        info!(turn_ms = config.current().turn_ms, "world started");
        Ok(Self {
            lock,
            config,
            input,
            lifecycle,
            shutdown_tx: Some(shutdown_tx),
            funnel_thread: Some(funnel_thread),
            scheduler_thread: Some(scheduler_thread),
        })
    }

    // ── Producers ───────────────────────────────────────────────

    /// Submit input, blocking until the funnel accepts it.
    pub fn submit(&self, input: InputEvent) -> Result<(), SubmitError> {
        self.input.submit(input)
    }

    /// A cloneable producer handle for connection threads.
    pub fn input_handle(&self) -> InputHandle {
        self.input.clone()
    }

    /// A cloneable lifecycle handle for connection threads.
    pub fn lifecycle_handle(&self) -> LifecycleHandle {
        self.lifecycle.clone()
    }

    /// Bring an actor into the world, returning once serviced.
    pub fn enter_world(&self, actor: ActorId, room: RoomId) -> Result<(), SubmitError> {
        self.lifecycle.enter_world(actor, room)
    }

    /// Take an actor out of the world, returning once serviced.
    pub fn leave_world(&self, actor: ActorId) -> Result<(), SubmitError> {
        self.lifecycle.leave_world(actor)
    }

    /// End a session, returning once serviced.
    pub fn logout(&self, connection: ConnectionId) -> Result<(), SubmitError> {
        self.lifecycle.logout(connection)
    }

    /// Flag or unflag a zombie, returning once serviced.
    pub fn set_zombie(&self, actor: ActorId, zombie: bool) -> Result<(), SubmitError> {
        self.lifecycle.set_zombie(actor, zombie)
    }

    // ── Readers ─────────────────────────────────────────────────

    /// The last statistics snapshot.
    pub fn stats(&self) -> ServerStats {
        self.lock.lock().stats().clone()
    }

    /// Read the core under the exclusivity token.
    ///
    /// `f` must not block: the simulation is paused while it runs.
    pub fn inspect<R>(&self, f: impl FnOnce(&WorldCore) -> R) -> R {
        f(&*self.lock.lock())
    }

    /// The live configuration handle.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown_tx.is_none()
    }

    // ── Shutdown ────────────────────────────────────────────────

    /// Stop both threads, persisting the world first.
    ///
    /// Queued but unprocessed events are discarded. Calling this again
    /// returns an empty report.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.shutdown_tx.is_none() {
            return ShutdownReport {
                funnel_joined: true,
                scheduler_joined: true,
                ..ShutdownReport::default()
            };
        }
        let start = Instant::now();

        // 1. Signal both threads.
        self.shutdown_tx.take();

        // 2. Join the funnel; producers now see `SubmitError::Shutdown`.
        let funnel_joined = self
            .funnel_thread
            .take()
            .is_none_or(|handle| handle.join().is_ok());

        // 3. Join the scheduler, collecting its final save.
        let (scheduler_joined, final_save) = match self.scheduler_thread.take() {
            Some(handle) => match handle.join() {
                Ok(report) => (true, Some(report)),
                Err(_) => {
                    warn!("scheduler thread panicked");
                    (false, None)
                }
            },
            None => (true, None),
        };

        let total_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(total_ms, funnel_joined, scheduler_joined, "world shut down");
        ShutdownReport {
            total_ms,
            funnel_joined,
            scheduler_joined,
            final_save,
        }
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("running", &!self.is_shut_down())
            .finish_non_exhaustive()
    }
}

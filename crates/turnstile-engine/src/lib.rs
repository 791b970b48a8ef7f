//! The Turnstile world tick engine.
//!
//! Serializes every mutation of a shared world behind one exclusivity
//! token and drives it from a single scheduler thread. Producer threads
//! hand input to the funnel and presence changes to the lifecycle
//! channels; the scheduler turns timer firings into turns (queue drains
//! with per-actor throttling, delays and cascades) and message ticks
//! (delivery to the network).
//!
//! Two ways to run it:
//!
//! - [`World`]: the threaded server, with the funnel and scheduler running
//!   in the background.
//! - [`WorldCore`]: the same units of work called directly, for lockstep
//!   tests and embedders that bring their own loop.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bad_input;
mod buffs;
pub mod config;
pub mod dispatch;
pub mod funnel;
pub mod hooks;
pub mod input;
pub mod lifecycle;
pub mod lock;
pub mod metrics;
pub mod queue;
mod quests;
pub mod room_action;
pub mod scheduler;
pub mod stats;
mod turn;
pub mod world;
pub mod world_core;
pub mod zombie;

#[cfg(test)]
mod testing;

pub use bad_input::BadInputTracker;
pub use config::{ConfigError, ConfigWatcher, GameConfig, PvpPolicy, SharedConfig};
pub use dispatch::{DispatchStats, LINE_REFRESH};
pub use funnel::{InputHandle, SubmitError};
pub use hooks::{CommandHandler, NoHooks, TurnContext, WorldHooks};
pub use lifecycle::LifecycleHandle;
pub use lock::WorldLock;
pub use metrics::{PhaseTiming, TimeTracker, TurnMetrics};
pub use queue::{EventQueue, Generation, QueueSet};
pub use room_action::ParsedAction;
pub use stats::{OnlineActor, ServerStats};
pub use world::{ShutdownReport, World};
pub use world_core::{Collaborators, SaveReport, WorldCore};
pub use zombie::ZombieSet;

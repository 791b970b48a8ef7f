//! Turnstile: a turn-based world tick engine for multi-user dungeon servers.
//!
//! This is the facade crate that re-exports the public API of the Turnstile
//! sub-crates. Most servers only need `turnstile` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use turnstile::prelude::*;
//! use turnstile_test_utils::fixtures::{recording_core, ANN};
//!
//! // A core over a small fixture world with recording collaborators.
//! let mut fixture = recording_core();
//! let config = GameConfig::default();
//!
//! fixture.core.submit_input(InputEvent::actor(ANN, "say hello", 0));
//! fixture.core.submit_input(InputEvent::actor(ANN, "look", 0));
//!
//! // One command per actor per turn: "look" slips to the next turn.
//! let metrics = fixture.core.turn_tick(&config);
//! assert_eq!(metrics.inputs_dispatched, 1);
//! assert_eq!(metrics.inputs_requeued, 1);
//!
//! fixture.core.turn_tick(&config);
//! assert_eq!(fixture.commands.lines_for(ANN), vec!["say hello", "look"]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `turnstile-core` | IDs, world state, events, collaborator traits |
//! | [`engine`] | `turnstile-engine` | Queues, turn processor, dispatcher, scheduler, `World` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// World state, events and collaborator traits (`turnstile-core`).
///
/// Contains the id newtypes, the catalog of item, buff and quest
/// specifications, characters and rooms, every queued event type, and the
/// [`types::Persistence`], [`types::ScriptHost`] and [`types::Connections`]
/// traits a server implements.
pub use turnstile_core as types;

/// The tick engine (`turnstile-engine`).
///
/// [`engine::World`] runs the funnel and scheduler threads;
/// [`engine::WorldCore`] exposes the same units of work for lockstep use.
pub use turnstile_engine as engine;

/// Common imports for typical Turnstile usage.
///
/// ```rust
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    // Ids
    pub use turnstile_core::{ActorId, BuffId, ConnectionId, ItemId, MobId, QuestId, RoomId, TurnId};

    // State
    pub use turnstile_core::{Actor, Catalog, Character, Mob, Room, WorldState};

    // Events
    pub use turnstile_core::{
        BuffChange, BuffEvent, Event, InputEvent, Message, QuestEvent, RoomActionEvent, Target,
    };

    // Collaborators
    pub use turnstile_core::{BuffHook, Connections, Persistence, ScriptHost};
    pub use turnstile_engine::{CommandHandler, TurnContext, WorldHooks};

    // Errors
    pub use turnstile_core::{CommandError, NetworkError, PersistError, ScriptError, WorldError};
    pub use turnstile_engine::{ConfigError, SubmitError};

    // Engine
    pub use turnstile_engine::{
        Collaborators, GameConfig, PvpPolicy, SharedConfig, ShutdownReport, TurnMetrics, World,
        WorldCore,
    };
}

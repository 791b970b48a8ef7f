//! Core types and traits for the Turnstile world tick engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers, the closed [`Event`] type carried by the work queues, the
//! in-memory world model (actors, mobs, rooms, items, buffs, quests) and
//! the collaborator traits for persistence, scripting and networking.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod character;
pub mod error;
pub mod event;
pub mod id;
pub mod quest;
pub mod room;
pub mod state;
pub mod traits;

pub use catalog::{
    BuffFlag, BuffSpec, Catalog, Item, ItemKind, ItemSpec, QuestRewards, QuestSpec, SkillReward,
};
pub use character::{Actor, ActiveBuff, Character, LogEntry, Mob, PendingPrompt, Permission};
pub use error::{CommandError, NetworkError, PersistError, ScriptError, WorldError};
pub use event::{
    BroadcastEvent, BuffChange, BuffEvent, ClientText, Event, InputEvent, Message,
    OutboundPayload, QuestEvent, RoomActionEvent, SystemEvent, Target,
};
pub use id::{ActorId, BuffId, ConnectionId, ItemId, MobId, QuestId, RoomId, TurnId};
pub use quest::{QuestLog, QuestToken, TokenRequest};
pub use room::{Exit, ExitKind, Room, RoomEffect};
pub use state::{Party, WorldState};
pub use traits::{BuffHook, Connections, Persistence, ScriptHost};

//! Error types shared by the world model and its collaborators.
//!
//! Nothing in the tick engine propagates these past the unit of work that
//! produced them: the turn processor logs them and moves on to the next
//! event. They exist so collaborators can say *what* went wrong.

use thiserror::Error;

use crate::id::{ActorId, BuffId, ConnectionId, ItemId, MobId, QuestId, RoomId};

/// A lookup against the world model found nothing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WorldError {
    /// No online actor with this id.
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
    /// No live mob instance with this id.
    #[error("mob {0} not found")]
    MobNotFound(MobId),
    /// No room with this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    /// No quest definition with this id.
    #[error("quest {0} not found")]
    QuestNotFound(QuestId),
    /// No buff specification with this id.
    #[error("buff {0} not found")]
    BuffNotFound(BuffId),
    /// No item specification with this id.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),
    /// No session bound to this connection.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),
}

/// Persisting a record failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PersistError {
    /// Saving an actor failed.
    #[error("saving actor {actor} failed: {reason}")]
    Actor {
        /// The actor being saved.
        actor: ActorId,
        /// Backend-specific description.
        reason: String,
    },
    /// Saving a room failed.
    #[error("saving room {room} failed: {reason}")]
    Room {
        /// The room being saved.
        room: RoomId,
        /// Backend-specific description.
        reason: String,
    },
}

/// A scripted buff hook reported an error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("buff {buff} script failed: {reason}")]
pub struct ScriptError {
    /// The buff whose hook ran.
    pub buff: BuffId,
    /// Script-engine description.
    pub reason: String,
}

/// The network layer could not carry out a request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The connection id does not name a live session.
    #[error("connection {0} not found")]
    UnknownConnection(ConnectionId),
    /// Transport-level failure.
    #[error("connection {connection}: {reason}")]
    Transport {
        /// The affected connection.
        connection: ConnectionId,
        /// Transport-specific description.
        reason: String,
    },
}

/// A command implementation failed after recognizing its input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("command '{command}' failed: {reason}")]
pub struct CommandError {
    /// The command word that was dispatched.
    pub command: String,
    /// Command-specific description.
    pub reason: String,
}

//! Collaborator traits: the boundaries between the tick engine and the
//! storage, scripting and transport layers it drives.
//!
//! Implementations are boxed into the engine and only ever called from
//! the scheduler thread while it holds the exclusivity token, so they
//! need to be [`Send`] but not [`Sync`].

use crate::character::{Actor, Character};
use crate::error::{NetworkError, PersistError, ScriptError};
use crate::event::Target;
use crate::id::{BuffId, ConnectionId};
use crate::room::Room;

/// Durable storage for actors and rooms.
pub trait Persistence: Send {
    /// Write one actor's record.
    fn save_actor(&mut self, actor: &Actor) -> Result<(), PersistError>;

    /// Write one room's record.
    fn save_room(&mut self, room: &Room) -> Result<(), PersistError>;
}

/// Buff lifecycle points at which scripts run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuffHook {
    /// The buff was just applied.
    OnStart,
    /// The buff's periodic effect fires.
    OnTrigger,
    /// The buff lapsed.
    OnEnd,
}

impl BuffHook {
    /// Script entry-point name.
    pub fn name(self) -> &'static str {
        match self {
            Self::OnStart => "onStart",
            Self::OnTrigger => "onTrigger",
            Self::OnEnd => "onEnd",
        }
    }
}

/// The scripting engine that gives buffs their behavior.
pub trait ScriptHost: Send {
    /// Run `hook` for `buff` on `character`.
    ///
    /// The script may mutate the character (e.g. deal damage). Errors are
    /// logged by the caller and otherwise ignored.
    fn buff_event(
        &mut self,
        hook: BuffHook,
        target: Target,
        character: &mut Character,
        buff: BuffId,
    ) -> Result<(), ScriptError>;
}

/// The transport layer holding client sessions.
pub trait Connections: Send {
    /// Send bytes to one session. Unknown connections are ignored.
    fn send_to(&mut self, connection: ConnectionId, bytes: &[u8]);

    /// Send bytes to every session.
    fn broadcast(&mut self, bytes: &[u8]);

    /// Whether the client negotiated the structured side-channel `module`
    /// (matched on its leading component, e.g. `Char` for `Char.Name`).
    fn supports_channel(&self, connection: ConnectionId, module: &str) -> bool;

    /// Whether the session is a web client.
    fn is_websocket(&self, connection: ConnectionId) -> bool;

    /// Close a session after a normal logout.
    fn disconnect(&mut self, connection: ConnectionId) -> Result<(), NetworkError>;

    /// Forcibly drop a session.
    fn kick(&mut self, connection: ConnectionId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_names_match_script_entry_points() {
        assert_eq!(BuffHook::OnStart.name(), "onStart");
        assert_eq!(BuffHook::OnTrigger.name(), "onTrigger");
        assert_eq!(BuffHook::OnEnd.name(), "onEnd");
    }

    #[test]
    fn traits_are_object_safe() {
        fn _persist(_: &dyn Persistence) {}
        fn _script(_: &dyn ScriptHost) {}
        fn _net(_: &dyn Connections) {}
    }
}

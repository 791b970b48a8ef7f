//! Test utilities and recording collaborators for Turnstile development.
//!
//! Every collaborator trait has an in-memory implementation here that
//! records what the engine asked of it. Each recorder hands out a cheap
//! cloneable log handle (shared through `Arc<Mutex<..>>`) so a test can
//! keep inspecting it after the collaborator itself has been boxed into
//! a world core.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexSet;

use turnstile_core::character::{Actor, Character};
use turnstile_core::error::{CommandError, NetworkError, PersistError, ScriptError};
use turnstile_core::event::Target;
use turnstile_core::id::{ActorId, BuffId, ConnectionId, MobId, RoomId};
use turnstile_core::room::Room;
use turnstile_core::traits::{BuffHook, Connections, Persistence, ScriptHost};
use turnstile_engine::hooks::{CommandHandler, TurnContext};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Network ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct NetworkRecord {
    sends: Vec<(ConnectionId, String)>,
    broadcasts: Vec<String>,
    kicks: Vec<ConnectionId>,
    disconnects: Vec<ConnectionId>,
}

/// Shared view of everything a [`RecordingNetwork`] was asked to do.
#[derive(Clone, Debug, Default)]
pub struct NetworkLog(Arc<Mutex<NetworkRecord>>);

impl NetworkLog {
    /// Every targeted send, in order, decoded as UTF-8.
    pub fn sends(&self) -> Vec<(ConnectionId, String)> {
        lock(&self.0).sends.clone()
    }

    /// Everything sent to one connection, in order.
    pub fn sent_to(&self, connection: ConnectionId) -> Vec<String> {
        lock(&self.0)
            .sends
            .iter()
            .filter(|(c, _)| *c == connection)
            .map(|(_, s)| s.clone())
            .collect()
    }

    /// Everything sent to one connection, concatenated.
    pub fn text_for(&self, connection: ConnectionId) -> String {
        self.sent_to(connection).concat()
    }

    /// Every broadcast, in order.
    pub fn broadcasts(&self) -> Vec<String> {
        lock(&self.0).broadcasts.clone()
    }

    /// Kicked connections.
    pub fn kicks(&self) -> Vec<ConnectionId> {
        lock(&self.0).kicks.clone()
    }

    /// Disconnected connections.
    pub fn disconnects(&self) -> Vec<ConnectionId> {
        lock(&self.0).disconnects.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut r = lock(&self.0);
        r.sends.clear();
        r.broadcasts.clear();
        r.kicks.clear();
        r.disconnects.clear();
    }
}

/// A [`Connections`] implementation that records every call.
///
/// Connections support no side channels and are not web clients unless
/// configured with [`with_channel`](Self::with_channel) or
/// [`with_websocket`](Self::with_websocket).
#[derive(Debug, Default)]
pub struct RecordingNetwork {
    log: NetworkLog,
    channels: IndexSet<(ConnectionId, String)>,
    websockets: IndexSet<ConnectionId>,
}

impl RecordingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared log.
    pub fn log(&self) -> NetworkLog {
        self.log.clone()
    }

    /// Declare that `connection` negotiated side-channel `family` (e.g. `Char`).
    pub fn with_channel(mut self, connection: ConnectionId, family: &str) -> Self {
        self.channels.insert((connection, family.to_string()));
        self
    }

    /// Declare `connection` a web client.
    pub fn with_websocket(mut self, connection: ConnectionId) -> Self {
        self.websockets.insert(connection);
        self
    }
}

impl Connections for RecordingNetwork {
    fn send_to(&mut self, connection: ConnectionId, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes).into_owned();
        lock(&self.log.0).sends.push((connection, text));
    }

    fn broadcast(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes).into_owned();
        lock(&self.log.0).broadcasts.push(text);
    }

    fn supports_channel(&self, connection: ConnectionId, module: &str) -> bool {
        let family = module.split('.').next().unwrap_or(module);
        self.channels
            .iter()
            .any(|(c, f)| *c == connection && f == family)
    }

    fn is_websocket(&self, connection: ConnectionId) -> bool {
        self.websockets.contains(&connection)
    }

    fn disconnect(&mut self, connection: ConnectionId) -> Result<(), NetworkError> {
        lock(&self.log.0).disconnects.push(connection);
        Ok(())
    }

    fn kick(&mut self, connection: ConnectionId) {
        lock(&self.log.0).kicks.push(connection);
    }
}

// ── Persistence ─────────────────────────────────────────────────

#[derive(Debug, Default)]
struct PersistRecord {
    actors: Vec<ActorId>,
    rooms: Vec<RoomId>,
    failure: Option<String>,
}

/// Shared view of a [`MemoryPersistence`], also used to inject failures.
#[derive(Clone, Debug, Default)]
pub struct PersistLog(Arc<Mutex<PersistRecord>>);

impl PersistLog {
    /// Actors saved, in order.
    pub fn actors_saved(&self) -> Vec<ActorId> {
        lock(&self.0).actors.clone()
    }

    /// Rooms saved, in order.
    pub fn rooms_saved(&self) -> Vec<RoomId> {
        lock(&self.0).rooms.clone()
    }

    /// Make every later save fail with `reason`.
    pub fn fail_with(&self, reason: &str) {
        lock(&self.0).failure = Some(reason.to_string());
    }

    /// Let saves succeed again.
    pub fn recover(&self) {
        lock(&self.0).failure = None;
    }

    /// Forget recorded saves.
    pub fn clear(&self) {
        let mut r = lock(&self.0);
        r.actors.clear();
        r.rooms.clear();
    }
}

/// A [`Persistence`] implementation that records saved ids.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    log: PersistLog,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared log.
    pub fn log(&self) -> PersistLog {
        self.log.clone()
    }
}

impl Persistence for MemoryPersistence {
    fn save_actor(&mut self, actor: &Actor) -> Result<(), PersistError> {
        let mut r = lock(&self.log.0);
        if let Some(reason) = &r.failure {
            return Err(PersistError::Actor {
                actor: actor.id,
                reason: reason.clone(),
            });
        }
        r.actors.push(actor.id);
        Ok(())
    }

    fn save_room(&mut self, room: &Room) -> Result<(), PersistError> {
        let mut r = lock(&self.log.0);
        if let Some(reason) = &r.failure {
            return Err(PersistError::Room {
                room: room.id,
                reason: reason.clone(),
            });
        }
        r.rooms.push(room.id);
        Ok(())
    }
}

// ── Scripts ─────────────────────────────────────────────────────

/// Shared view of the hooks a [`RecordingScripts`] ran.
#[derive(Clone, Debug, Default)]
pub struct ScriptLog(Arc<Mutex<Vec<(BuffHook, Target, BuffId)>>>);

impl ScriptLog {
    /// Every hook call, in order.
    pub fn calls(&self) -> Vec<(BuffHook, Target, BuffId)> {
        lock(&self.0).clone()
    }

    /// Calls of one hook kind.
    pub fn calls_of(&self, hook: BuffHook) -> Vec<(Target, BuffId)> {
        lock(&self.0)
            .iter()
            .filter(|(h, _, _)| *h == hook)
            .map(|&(_, t, b)| (t, b))
            .collect()
    }
}

/// A [`ScriptHost`] that records hook calls.
///
/// `OnTrigger` subtracts a configurable amount of health, so tests can
/// drive the mob death check.
#[derive(Debug, Default)]
pub struct RecordingScripts {
    log: ScriptLog,
    trigger_damage: i32,
    failing: Option<BuffHook>,
}

impl RecordingScripts {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared log.
    pub fn log(&self) -> ScriptLog {
        self.log.clone()
    }

    /// Deal `damage` on every `OnTrigger`.
    pub fn with_trigger_damage(mut self, damage: i32) -> Self {
        self.trigger_damage = damage;
        self
    }

    /// Make every call of `hook` fail after recording it.
    pub fn failing_on(mut self, hook: BuffHook) -> Self {
        self.failing = Some(hook);
        self
    }
}

impl ScriptHost for RecordingScripts {
    fn buff_event(
        &mut self,
        hook: BuffHook,
        target: Target,
        character: &mut Character,
        buff: BuffId,
    ) -> Result<(), ScriptError> {
        lock(&self.log.0).push((hook, target, buff));
        if self.failing == Some(hook) {
            return Err(ScriptError {
                buff,
                reason: format!("{} failed", hook.name()),
            });
        }
        if hook == BuffHook::OnTrigger {
            character.health -= self.trigger_damage;
        }
        Ok(())
    }
}

// ── Commands ────────────────────────────────────────────────────

/// Shared view of the commands a [`RecordingCommands`] was offered.
#[derive(Clone, Debug, Default)]
pub struct CommandLog(Arc<Mutex<Vec<(Target, String, String)>>>);

impl CommandLog {
    /// Every offered command as `(source, command, rest)`.
    pub fn calls(&self) -> Vec<(Target, String, String)> {
        lock(&self.0).clone()
    }

    /// Command lines (`command rest`) offered by one actor.
    pub fn lines_for(&self, actor: ActorId) -> Vec<String> {
        self.lines_where(Target::Actor(actor))
    }

    /// Command lines offered by one mob.
    pub fn lines_for_mob(&self, mob: MobId) -> Vec<String> {
        self.lines_where(Target::Mob(mob))
    }

    fn lines_where(&self, source: Target) -> Vec<String> {
        lock(&self.0)
            .iter()
            .filter(|(s, _, _)| *s == source)
            .map(|(_, c, r)| {
                if r.is_empty() {
                    c.clone()
                } else {
                    format!("{c} {r}")
                }
            })
            .collect()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

/// A [`CommandHandler`] that recognizes a fixed set of command words and
/// records every command it is offered, recognized or not.
#[derive(Debug, Default)]
pub struct RecordingCommands {
    known: IndexSet<String>,
    log: CommandLog,
}

impl RecordingCommands {
    /// Recognize exactly `known`.
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            log: CommandLog::default(),
        }
    }

    /// The shared log.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }
}

impl CommandHandler for RecordingCommands {
    fn actor_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        actor: ActorId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        lock(&self.log.0).push((Target::Actor(actor), command.to_string(), rest.to_string()));
        Ok(self.known.contains(command))
    }

    fn mob_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        mob: MobId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        lock(&self.log.0).push((Target::Mob(mob), command.to_string(), rest.to_string()));
        Ok(self.known.contains(command))
    }
}

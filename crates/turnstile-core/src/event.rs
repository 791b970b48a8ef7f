//! The closed set of events that flow through the engine's work queues.
//!
//! Each variant of [`Event`] has a dedicated queue; producers build the
//! payload struct and hand it to the queue set, which routes by variant.
//! Because routing is by type, a queue can never hold the wrong kind of
//! event.

use smallvec::SmallVec;

use crate::id::{ActorId, BuffId, ConnectionId, MobId, RoomId};

// ── Addressing ──────────────────────────────────────────────────

/// A character in the world: either an actor or a mob instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// A human-controlled actor.
    Actor(ActorId),
    /// A mob instance.
    Mob(MobId),
}

impl Target {
    /// The actor id, if this targets an actor.
    pub fn actor(self) -> Option<ActorId> {
        match self {
            Self::Actor(id) => Some(id),
            Self::Mob(_) => None,
        }
    }

    /// The mob id, if this targets a mob.
    pub fn mob(self) -> Option<MobId> {
        match self {
            Self::Mob(id) => Some(id),
            Self::Actor(_) => None,
        }
    }
}

// ── Input ───────────────────────────────────────────────────────

/// A line of command input awaiting dispatch.
///
/// `wait_turns` controls scheduling:
/// - `< 0`: dispatch on the turn it is polled, exempt from throttling.
/// - `== 0`: dispatch this turn, then throttle the actor for the rest of it.
/// - `> 0`: decremented once per turn until it reaches zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputEvent {
    /// Who issued the input.
    pub source: Target,
    /// Raw command text.
    pub text: String,
    /// Turns to wait before dispatch.
    pub wait_turns: i32,
}

impl InputEvent {
    /// Input from an actor.
    pub fn actor(actor: ActorId, text: impl Into<String>, wait_turns: i32) -> Self {
        Self {
            source: Target::Actor(actor),
            text: text.into(),
            wait_turns,
        }
    }

    /// Input from a mob.
    pub fn mob(mob: MobId, text: impl Into<String>, wait_turns: i32) -> Self {
        Self {
            source: Target::Mob(mob),
            text: text.into(),
            wait_turns,
        }
    }
}

// ── Room actions ────────────────────────────────────────────────

/// A delayed area effect scheduled against a room.
///
/// `action` is a space-separated verb plus up to two arguments, e.g.
/// `detonate grenade`, `detonate @3 grenade` or `wildfire`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomActionEvent {
    /// The room the effect lands in.
    pub room: RoomId,
    /// Who set the action in motion, if anyone.
    pub source: Option<Target>,
    /// Verb and arguments.
    pub action: String,
    /// Turns remaining before the action fires.
    pub wait_turns: u32,
}

// ── Buffs ───────────────────────────────────────────────────────

/// Whether a buff event grants or strips a buff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuffChange {
    /// Grant the buff.
    Apply(BuffId),
    /// Remove every copy of the buff.
    Remove(BuffId),
}

impl BuffChange {
    /// Decode the signed wire form: positive applies, negative removes.
    ///
    /// Zero is not a buff and yields `None`.
    pub fn from_signed(id: i64) -> Option<Self> {
        let magnitude = u32::try_from(id.unsigned_abs()).ok()?;
        match id {
            0 => None,
            n if n > 0 => Some(Self::Apply(BuffId(magnitude))),
            _ => Some(Self::Remove(BuffId(magnitude))),
        }
    }

    /// The buff specification this change concerns.
    pub fn buff(self) -> BuffId {
        match self {
            Self::Apply(id) | Self::Remove(id) => id,
        }
    }
}

/// Apply or remove a buff on a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuffEvent {
    /// The character affected.
    pub target: Target,
    /// What to do.
    pub change: BuffChange,
}

// ── Quests ──────────────────────────────────────────────────────

/// Grant (or, with a leading `-`, revoke) a quest token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestEvent {
    /// The actor receiving the token.
    pub actor: ActorId,
    /// Token text, `<quest>-<step>` with an optional `-` prefix.
    pub token: String,
}

// ── Outbound ────────────────────────────────────────────────────

/// An operator-level command such as `reload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemEvent {
    /// Command word.
    pub command: String,
}

/// Text sent to every connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastEvent {
    /// Text to send.
    pub text: String,
    /// Skip the erase-line prefix that normally precedes the text.
    pub skip_line_refresh: bool,
}

/// A structured side-channel payload for one actor's client.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundPayload {
    /// The receiving actor.
    pub actor: ActorId,
    /// Side-channel module, e.g. `Char.Name` or `Room.RemovePlayer`.
    pub module: String,
    /// JSON body.
    pub payload: serde_json::Value,
}

/// Raw text for a web client connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientText {
    /// The receiving connection.
    pub connection: ConnectionId,
    /// Text to send.
    pub text: String,
}

/// Text addressed to an actor, a room, or both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    /// Deliver directly to this actor.
    pub actor: Option<ActorId>,
    /// Deliver to every player in this room except `actor` and `exclude`.
    pub room: Option<RoomId>,
    /// Text to send.
    pub text: String,
    /// Player-to-player speech; deafened listeners do not receive it.
    pub is_communication: bool,
    /// Only listeners with super hearing receive it.
    pub is_quiet: bool,
    /// Room listeners to skip.
    pub exclude: SmallVec<[ActorId; 4]>,
}

impl Message {
    /// A message for a single actor.
    pub fn to_actor(actor: ActorId, text: impl Into<String>) -> Self {
        Self {
            actor: Some(actor),
            text: text.into(),
            ..Self::default()
        }
    }

    /// A message for everyone in a room.
    pub fn to_room(room: RoomId, text: impl Into<String>) -> Self {
        Self {
            room: Some(room),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Skip `actor` when delivering to the room.
    pub fn excluding(mut self, actor: ActorId) -> Self {
        self.exclude.push(actor);
        self
    }

    /// Mark as player communication.
    pub fn communication(mut self) -> Self {
        self.is_communication = true;
        self
    }

    /// Mark as a quiet message.
    pub fn quiet(mut self) -> Self {
        self.is_quiet = true;
        self
    }
}

// ── Event ───────────────────────────────────────────────────────

/// Every kind of work item the engine queues.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Command input.
    Input(InputEvent),
    /// Delayed area effect.
    RoomAction(RoomActionEvent),
    /// Buff grant/removal.
    Buff(BuffEvent),
    /// Quest token grant/removal.
    Quest(QuestEvent),
    /// Operator command.
    System(SystemEvent),
    /// Text to all connections.
    Broadcast(BroadcastEvent),
    /// Structured client payload.
    OutboundPayload(OutboundPayload),
    /// Web client text.
    ClientText(ClientText),
    /// Text to an actor and/or room.
    Message(Message),
}

impl Event {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::RoomAction(_) => "room_action",
            Self::Buff(_) => "buff",
            Self::Quest(_) => "quest",
            Self::System(_) => "system",
            Self::Broadcast(_) => "broadcast",
            Self::OutboundPayload(_) => "outbound_payload",
            Self::ClientText(_) => "client_text",
            Self::Message(_) => "message",
        }
    }
}

macro_rules! impl_from_payload {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Event {
                fn from(e: $payload) -> Self {
                    Event::$variant(e)
                }
            }
        )*
    };
}

impl_from_payload!(
    InputEvent => Input,
    RoomActionEvent => RoomAction,
    BuffEvent => Buff,
    QuestEvent => Quest,
    SystemEvent => System,
    BroadcastEvent => Broadcast,
    OutboundPayload => OutboundPayload,
    ClientText => ClientText,
    Message => Message,
);

//! The mutable world model: every online actor, live mob and loaded room.
//!
//! [`WorldState`] is plain data. It carries no lock of its own; the engine
//! serializes all access to it through a single exclusivity token.

use indexmap::IndexMap;

use crate::catalog::{BuffFlag, Catalog, Item};
use crate::character::{Actor, Character, Mob};
use crate::error::WorldError;
use crate::event::Target;
use crate::id::{ActorId, BuffId, ConnectionId, ItemId, MobId, RoomId};
use crate::room::Room;

/// A group of actors adventuring together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Party {
    /// The actor who formed the party.
    pub leader: ActorId,
    /// Everyone else.
    pub members: Vec<ActorId>,
}

impl Party {
    /// Whether `actor` leads or belongs to this party.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.leader == actor || self.members.contains(&actor)
    }
}

/// All live world data.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    /// Online actors (including zombies), in login order.
    pub actors: IndexMap<ActorId, Actor>,
    /// Live mob instances.
    pub mobs: IndexMap<MobId, Mob>,
    /// Loaded rooms.
    pub rooms: IndexMap<RoomId, Room>,
    /// Active parties.
    pub parties: Vec<Party>,
    /// Static content.
    pub catalog: Catalog,
    next_item_uid: u64,
}

impl WorldState {
    /// An empty world with the given catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            next_item_uid: 1,
            ..Self::default()
        }
    }

    // ── Registration ────────────────────────────────────────────

    /// Add or replace a room.
    pub fn insert_room(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    /// Add or replace an actor. Does not place them in a room.
    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    /// Add a mob and list it in its room's occupants.
    pub fn spawn_mob(&mut self, mob: Mob) {
        if let Some(room) = self.rooms.get_mut(&mob.character.room) {
            room.add_mob(mob.id);
        }
        self.mobs.insert(mob.id, mob);
    }

    /// Mint a new item instance.
    pub fn new_item(&mut self, spec: ItemId) -> Item {
        let uid = self.next_item_uid.max(1);
        self.next_item_uid = uid + 1;
        Item { spec, uid }
    }

    // ── Lookups ─────────────────────────────────────────────────

    /// An online actor.
    pub fn actor(&self, id: ActorId) -> Result<&Actor, WorldError> {
        self.actors.get(&id).ok_or(WorldError::ActorNotFound(id))
    }

    /// An online actor, mutably.
    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut Actor, WorldError> {
        self.actors.get_mut(&id).ok_or(WorldError::ActorNotFound(id))
    }

    /// A live mob.
    pub fn mob(&self, id: MobId) -> Result<&Mob, WorldError> {
        self.mobs.get(&id).ok_or(WorldError::MobNotFound(id))
    }

    /// A live mob, mutably.
    pub fn mob_mut(&mut self, id: MobId) -> Result<&mut Mob, WorldError> {
        self.mobs.get_mut(&id).ok_or(WorldError::MobNotFound(id))
    }

    /// A loaded room.
    pub fn room(&self, id: RoomId) -> Result<&Room, WorldError> {
        self.rooms.get(&id).ok_or(WorldError::RoomNotFound(id))
    }

    /// A loaded room, mutably.
    pub fn room_mut(&mut self, id: RoomId) -> Result<&mut Room, WorldError> {
        self.rooms.get_mut(&id).ok_or(WorldError::RoomNotFound(id))
    }

    /// The character behind a target.
    pub fn character(&self, target: Target) -> Result<&Character, WorldError> {
        match target {
            Target::Actor(id) => self.actor(id).map(|a| &a.character),
            Target::Mob(id) => self.mob(id).map(|m| &m.character),
        }
    }

    /// The character behind a target, mutably.
    pub fn character_mut(&mut self, target: Target) -> Result<&mut Character, WorldError> {
        match target {
            Target::Actor(id) => self.actor_mut(id).map(|a| &mut a.character),
            Target::Mob(id) => self.mob_mut(id).map(|m| &mut m.character),
        }
    }

    /// The actor attached to a connection.
    pub fn actor_by_connection(&self, connection: ConnectionId) -> Option<ActorId> {
        self.actors
            .values()
            .find(|a| a.connection == connection)
            .map(|a| a.id)
    }

    /// Resolve a name used inside a room to one of its occupants.
    ///
    /// Accepts `@<actor>` and `#<mob>` shorthands or a case-insensitive
    /// name prefix. Players are matched before mobs.
    pub fn find_in_room(&self, room: RoomId, name: &str) -> Option<Target> {
        let room = self.rooms.get(&room)?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(id) = name.strip_prefix('@').and_then(|n| n.parse().ok()) {
            let id = ActorId(id);
            return room.players.contains(&id).then_some(Target::Actor(id));
        }
        if let Some(id) = name.strip_prefix('#').and_then(|n| n.parse().ok()) {
            let id = MobId(id);
            return room.mobs.contains(&id).then_some(Target::Mob(id));
        }
        let needle = name.to_lowercase();
        let matches = |c: &Character| c.name.to_lowercase().starts_with(&needle);
        room.players
            .iter()
            .find(|id| self.actors.get(*id).is_some_and(|a| matches(&a.character)))
            .map(|&id| Target::Actor(id))
            .or_else(|| {
                room.mobs
                    .iter()
                    .find(|id| self.mobs.get(*id).is_some_and(|m| matches(&m.character)))
                    .map(|&id| Target::Mob(id))
            })
    }

    // ── Movement ────────────────────────────────────────────────

    /// Move an actor into `to`, leaving whatever room lists them now.
    pub fn move_actor(&mut self, actor: ActorId, to: RoomId) -> Result<(), WorldError> {
        let zone = self.room(to)?.zone.clone();
        let from = self.actor(actor)?.character.room;
        if let Some(old) = self.rooms.get_mut(&from) {
            old.remove_player(actor);
        }
        self.room_mut(to)?.add_player(actor);
        let character = &mut self.actor_mut(actor)?.character;
        character.room = to;
        character.zone = zone;
        Ok(())
    }

    // ── Social ──────────────────────────────────────────────────

    /// Take an actor out of their party. A departing leader disbands it.
    ///
    /// Returns whether the actor was in a party.
    pub fn leave_party(&mut self, actor: ActorId) -> bool {
        let Some(pos) = self.parties.iter().position(|p| p.contains(actor)) else {
            return false;
        };
        if self.parties[pos].leader == actor {
            self.parties.remove(pos);
        } else {
            self.parties[pos].members.retain(|&m| m != actor);
        }
        true
    }

    /// Release every mob in `room` charmed by `actor`.
    ///
    /// Strips the charm buffs and returns the released mobs with the buffs
    /// each lost.
    pub fn release_charmed(&mut self, actor: ActorId, room: RoomId) -> Vec<(MobId, Vec<BuffId>)> {
        let Some(room) = self.rooms.get(&room) else {
            return Vec::new();
        };
        let mut released = Vec::new();
        for id in &room.mobs {
            let Some(mob) = self.mobs.get_mut(id) else {
                continue;
            };
            if mob.character.charmed_by != Some(actor) {
                continue;
            }
            mob.character.charmed_by = None;
            let lost = mob.character.strip_buffs_with_flag(BuffFlag::Charmed);
            released.push((*id, lost));
        }
        released
    }
}

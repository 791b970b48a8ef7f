//! Rooms, exits, floor items and lingering area effects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Item};
use crate::id::{ActorId, MobId, RoomId};

/// A lingering hazard attached to a room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomEffect {
    /// Fire spreading through the area.
    Wildfire,
}

impl RoomEffect {
    /// Parse the action verb naming this effect.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wildfire" => Some(Self::Wildfire),
            _ => None,
        }
    }

    /// The action verb naming this effect.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wildfire => "wildfire",
        }
    }
}

/// A directed connection to another room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exit {
    /// Destination room.
    pub room: RoomId,
}

/// Whether an exit is part of the map or was opened temporarily.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitKind {
    /// A permanent exit.
    Permanent,
    /// A temporary exit (portal, rope ladder, ...).
    Temporary,
}

/// A room and everything currently in it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Room {
    /// Room id.
    pub id: RoomId,
    /// Zone the room belongs to.
    pub zone: String,
    /// Short title.
    pub title: String,
    /// Permanent exits, by name.
    pub exits: IndexMap<String, Exit>,
    /// Temporary exits, by name.
    pub temp_exits: IndexMap<String, Exit>,
    /// Actors present, in arrival order.
    pub players: Vec<ActorId>,
    /// Mobs present, in arrival order.
    pub mobs: Vec<MobId>,
    /// Items lying on the floor.
    pub items: Vec<Item>,
    /// Active area effects.
    pub effects: Vec<RoomEffect>,
}

impl Room {
    /// An empty room.
    pub fn new(id: RoomId, zone: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            zone: zone.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Add a permanent exit.
    pub fn with_exit(mut self, name: impl Into<String>, to: RoomId) -> Self {
        self.exits.insert(name.into(), Exit { room: to });
        self
    }

    /// Add a temporary exit.
    pub fn with_temp_exit(mut self, name: impl Into<String>, to: RoomId) -> Self {
        self.temp_exits.insert(name.into(), Exit { room: to });
        self
    }

    /// Add an actor if not already present.
    pub fn add_player(&mut self, actor: ActorId) {
        if !self.players.contains(&actor) {
            self.players.push(actor);
        }
    }

    /// Remove an actor. Returns whether they were present.
    pub fn remove_player(&mut self, actor: ActorId) -> bool {
        let before = self.players.len();
        self.players.retain(|&p| p != actor);
        self.players.len() != before
    }

    /// Add a mob if not already present.
    pub fn add_mob(&mut self, mob: MobId) {
        if !self.mobs.contains(&mob) {
            self.mobs.push(mob);
        }
    }

    /// Remove a mob. Returns whether it was present.
    pub fn remove_mob(&mut self, mob: MobId) -> bool {
        let before = self.mobs.len();
        self.mobs.retain(|&m| m != mob);
        self.mobs.len() != before
    }

    /// Activate an effect. Returns `false` if it was already active.
    pub fn add_effect(&mut self, effect: RoomEffect) -> bool {
        if self.effects.contains(&effect) {
            return false;
        }
        self.effects.push(effect);
        true
    }

    /// Whether an effect is active.
    pub fn has_effect(&self, effect: RoomEffect) -> bool {
        self.effects.contains(&effect)
    }

    /// Find a floor item by name or by `!<spec>:<uid>` reference.
    ///
    /// Name matching is a case-insensitive prefix match against the
    /// item's catalog name. The first match in floor order wins.
    pub fn find_on_floor(&self, name: &str, catalog: &Catalog) -> Option<Item> {
        if let Some(reference) = name.strip_prefix('!') {
            let (spec, uid) = reference.split_once(':')?;
            let spec: u32 = spec.parse().ok()?;
            let uid: u64 = uid.parse().ok()?;
            return self
                .items
                .iter()
                .copied()
                .find(|i| i.spec.0 == spec && i.uid == uid);
        }
        let needle = name.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.items.iter().copied().find(|i| {
            catalog
                .item(i.spec)
                .is_some_and(|s| s.name.to_lowercase().starts_with(&needle))
        })
    }

    /// Remove a specific item from the floor. Returns whether it was there.
    pub fn remove_item(&mut self, item: Item) -> bool {
        match self.items.iter().position(|&i| i == item) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    /// An exit leading to `target`, permanent exits ranked first.
    pub fn exit_toward(&self, target: RoomId) -> Option<(&str, ExitKind)> {
        let permanent = self
            .exits
            .iter()
            .find(|(_, e)| e.room == target)
            .map(|(name, _)| (name.as_str(), ExitKind::Permanent));
        permanent.or_else(|| {
            self.temp_exits
                .iter()
                .find(|(_, e)| e.room == target)
                .map(|(name, _)| (name.as_str(), ExitKind::Temporary))
        })
    }

    /// Destinations of every exit, permanent first, without duplicates.
    pub fn neighbours(&self) -> Vec<RoomId> {
        let mut out: Vec<RoomId> = Vec::new();
        for exit in self.exits.values().chain(self.temp_exits.values()) {
            if exit.room != self.id && !out.contains(&exit.room) {
                out.push(exit.room);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemKind, ItemSpec};
    use crate::id::ItemId;
    use smallvec::smallvec;

    fn catalog() -> Catalog {
        let mut c = Catalog::default();
        c.add_item(ItemSpec {
            id: ItemId(1),
            name: "Frag Grenade".into(),
            kind: ItemKind::Grenade,
            buff_ids: smallvec![],
            quest_token: None,
            area_effect: None,
        });
        c
    }

    #[test]
    fn new_room_starts_empty() {
        let r = Room::new(RoomId(7), "Keep", "Hall");
        assert_eq!(r.id, RoomId(7));
        assert!(r.exits.is_empty() && r.players.is_empty() && r.items.is_empty());
        assert_eq!(Room::default().id, RoomId(0));
    }

    #[test]
    fn players_are_not_duplicated() {
        let mut r = Room::new(RoomId(1), "Town", "Square");
        r.add_player(ActorId(1));
        r.add_player(ActorId(1));
        assert_eq!(r.players, vec![ActorId(1)]);
        assert!(r.remove_player(ActorId(1)));
        assert!(!r.remove_player(ActorId(1)));
    }

    #[test]
    fn effects_are_idempotent() {
        let mut r = Room::new(RoomId(1), "Town", "Square");
        assert!(r.add_effect(RoomEffect::Wildfire));
        assert!(!r.add_effect(RoomEffect::Wildfire));
        assert!(r.has_effect(RoomEffect::Wildfire));
    }

    #[test]
    fn floor_lookup_by_prefix_and_reference() {
        let c = catalog();
        let mut r = Room::new(RoomId(1), "Town", "Square");
        let item = Item {
            spec: ItemId(1),
            uid: 40,
        };
        r.items.push(item);
        assert_eq!(r.find_on_floor("frag", &c), Some(item));
        assert_eq!(r.find_on_floor("!1:40", &c), Some(item));
        assert_eq!(r.find_on_floor("!1:41", &c), None);
        assert_eq!(r.find_on_floor("sword", &c), None);
        assert!(r.remove_item(item));
        assert!(!r.remove_item(item));
    }

    #[test]
    fn permanent_exits_rank_before_temporary() {
        let r = Room::new(RoomId(1), "Town", "Square")
            .with_temp_exit("portal", RoomId(2))
            .with_exit("north", RoomId(2));
        assert_eq!(
            r.exit_toward(RoomId(2)),
            Some(("north", ExitKind::Permanent))
        );

        let r = Room::new(RoomId(1), "Town", "Square").with_temp_exit("portal", RoomId(2));
        assert_eq!(
            r.exit_toward(RoomId(2)),
            Some(("portal", ExitKind::Temporary))
        );
        assert_eq!(r.exit_toward(RoomId(9)), None);
    }

    #[test]
    fn effect_names_round_trip() {
        assert_eq!(RoomEffect::from_name("wildfire"), Some(RoomEffect::Wildfire));
        assert_eq!(RoomEffect::Wildfire.name(), "wildfire");
        assert_eq!(RoomEffect::from_name("detonate"), None);
    }
}

//! Benchmark profiles for the Turnstile world tick engine.
//!
//! - [`crowded_world`]: a ring of rooms, each with players and mobs,
//!   wired to collaborators that discard everything.
//! - [`flood_input`]: queue one line per actor, the common turn load.
//! - [`arm_grenades`]: a detonation pending in every room.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use smallvec::smallvec;

use turnstile_core::catalog::{BuffSpec, Catalog, ItemKind, ItemSpec};
use turnstile_core::character::{Actor, Character, Mob};
use turnstile_core::error::{CommandError, NetworkError, PersistError, ScriptError};
use turnstile_core::event::{InputEvent, RoomActionEvent, Target};
use turnstile_core::id::{ActorId, BuffId, ConnectionId, ItemId, MobId, RoomId};
use turnstile_core::room::Room;
use turnstile_core::state::WorldState;
use turnstile_core::traits::{BuffHook, Connections, Persistence, ScriptHost};
use turnstile_engine::{Collaborators, CommandHandler, TurnContext, WorldCore};

/// The grenade armed by [`arm_grenades`].
pub const BENCH_GRENADE: ItemId = ItemId(1);
/// Short, triggering buff carried by [`BENCH_GRENADE`].
pub const BENCH_BURN: BuffId = BuffId(1);

/// Size of a [`crowded_world`].
#[derive(Clone, Copy, Debug)]
pub struct Crowd {
    /// Rooms in the ring.
    pub rooms: u32,
    /// Online players per room.
    pub actors_per_room: u32,
    /// Mobs per room.
    pub mobs_per_room: u32,
}

impl Crowd {
    /// 100 rooms, 1000 players, 500 mobs.
    pub const REFERENCE: Crowd = Crowd {
        rooms: 100,
        actors_per_room: 10,
        mobs_per_room: 5,
    };
}

/// Collaborators that accept and forget everything.
///
/// Every command word is recognized.
#[derive(Debug, Default)]
pub struct Discard;

impl Persistence for Discard {
    fn save_actor(&mut self, _actor: &Actor) -> Result<(), PersistError> {
        Ok(())
    }

    fn save_room(&mut self, _room: &Room) -> Result<(), PersistError> {
        Ok(())
    }
}

impl ScriptHost for Discard {
    fn buff_event(
        &mut self,
        _hook: BuffHook,
        _target: Target,
        _character: &mut Character,
        _buff: BuffId,
    ) -> Result<(), ScriptError> {
        Ok(())
    }
}

impl Connections for Discard {
    fn send_to(&mut self, _connection: ConnectionId, _bytes: &[u8]) {}

    fn broadcast(&mut self, _bytes: &[u8]) {}

    fn supports_channel(&self, _connection: ConnectionId, _module: &str) -> bool {
        true
    }

    fn is_websocket(&self, _connection: ConnectionId) -> bool {
        false
    }

    fn disconnect(&mut self, _connection: ConnectionId) -> Result<(), NetworkError> {
        Ok(())
    }

    fn kick(&mut self, _connection: ConnectionId) {}
}

impl CommandHandler for Discard {
    fn actor_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        _actor: ActorId,
        _command: &str,
        _rest: &str,
    ) -> Result<bool, CommandError> {
        Ok(true)
    }

    fn mob_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        _mob: MobId,
        _command: &str,
        _rest: &str,
    ) -> Result<bool, CommandError> {
        Ok(true)
    }
}

fn bench_catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.add_item(ItemSpec {
        id: BENCH_GRENADE,
        name: "grenade".to_string(),
        kind: ItemKind::Grenade,
        buff_ids: smallvec![BENCH_BURN],
        quest_token: None,
        area_effect: None,
    });
    catalog.add_buff(BuffSpec {
        id: BENCH_BURN,
        name: "burn".to_string(),
        trigger_now: true,
        duration_turns: Some(3),
        flags: smallvec![],
    });
    catalog
}

/// Build a world of `crowd.rooms` rooms joined in a ring, with every
/// player and mob placed.
///
/// Actor, connection and mob ids each count up from 1.
pub fn crowded_world(crowd: Crowd) -> WorldCore {
    let mut state = WorldState::new(bench_catalog());
    let mut next_actor = 1u32;
    let mut next_mob = 1u32;

    for r in 0..crowd.rooms {
        let id = RoomId(r + 1);
        let next = RoomId((r + 1) % crowd.rooms + 1);
        let mut room = Room::new(id, "Bench", format!("Room {r}")).with_exit("onward", next);

        for _ in 0..crowd.actors_per_room {
            let actor = ActorId(next_actor);
            room.add_player(actor);
            state.insert_actor(Actor::new(
                actor,
                ConnectionId(u64::from(next_actor)),
                Character::new(format!("Player{next_actor}"), id, "Bench"),
            ));
            next_actor += 1;
        }
        state.insert_room(room);

        for _ in 0..crowd.mobs_per_room {
            state.spawn_mob(Mob::new(
                MobId(next_mob),
                Character::new(format!("Mob{next_mob}"), id, "Bench"),
            ));
            next_mob += 1;
        }
    }

    WorldCore::new(
        state,
        Collaborators::new(Discard, Discard, Discard, Discard),
    )
}

/// Queue one zero-wait `say` per online actor.
pub fn flood_input(core: &mut WorldCore) {
    let actors: Vec<ActorId> = core.state().actors.keys().copied().collect();
    for actor in actors {
        core.submit_input(InputEvent::actor(actor, "say hello", 0));
    }
}

/// Drop a grenade in every room and schedule it to go off now.
pub fn arm_grenades(core: &mut WorldCore) {
    let rooms: Vec<RoomId> = core.state().rooms.keys().copied().collect();
    for room in rooms {
        let item = core.state_mut().new_item(BENCH_GRENADE);
        if let Ok(r) = core.state_mut().room_mut(room) {
            r.items.push(item);
        }
        core.queues_mut().push(RoomActionEvent {
            room,
            source: None,
            action: "detonate grenade".to_string(),
            wait_turns: 0,
        });
    }
}

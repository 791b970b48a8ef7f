//! A small reusable world for engine tests.
//!
//! Layout:
//!
//! - Room 1 `Town/Square`: Ann (actor 1, connection 10), Bob (actor 2,
//!   connection 20) and a Rat (mob 5). Exit `north` to room 2, temporary
//!   exit `hole` to room 3.
//! - Room 2 `Woods/Clearing`: a Wolf (mob 6). Temporary exit `trail`
//!   and permanent exit `south`, both to room 1.
//! - Room 3 `Town/Alley`: empty, exit `up` to room 1.

use smallvec::smallvec;

use turnstile_core::catalog::{
    BuffFlag, BuffSpec, Catalog, Item, ItemKind, ItemSpec, QuestRewards, QuestSpec, SkillReward,
};
use turnstile_core::character::{Actor, Character, Mob};
use turnstile_core::id::{ActorId, BuffId, ConnectionId, ItemId, MobId, QuestId, RoomId};
use turnstile_core::room::{Room, RoomEffect};
use turnstile_core::state::WorldState;
use turnstile_engine::{Collaborators, WorldCore};

use crate::{
    CommandLog, MemoryPersistence, NetworkLog, PersistLog, RecordingCommands, RecordingNetwork,
    RecordingScripts, ScriptLog,
};

pub const ANN: ActorId = ActorId(1);
pub const BOB: ActorId = ActorId(2);
pub const ANN_CONN: ConnectionId = ConnectionId(10);
pub const BOB_CONN: ConnectionId = ConnectionId(20);
pub const RAT: MobId = MobId(5);
pub const WOLF: MobId = MobId(6);
pub const SQUARE: RoomId = RoomId(1);
pub const CLEARING: RoomId = RoomId(2);
pub const ALLEY: RoomId = RoomId(3);

/// Grenade with the burn and stun payloads.
pub const GRENADE: ItemId = ItemId(1);
/// Grenade with the burn payload that leaves a wildfire behind.
pub const INCENDIARY: ItemId = ItemId(2);
/// Grenade with no payload.
pub const DUD: ItemId = ItemId(3);
/// Not an explosive.
pub const ROCK: ItemId = ItemId(4);
/// Carries quest token `2-start`.
pub const MEDAL: ItemId = ItemId(5);

/// Triggers immediately, lasts 5 turns.
pub const BURN: BuffId = BuffId(1);
/// Lasts 2 turns.
pub const STUN: BuffId = BuffId(2);
/// Confers super hearing, permanent.
pub const HEARING: BuffId = BuffId(3);
/// Confers a charm, permanent.
pub const CHARM: BuffId = BuffId(4);

/// Three steps with the full reward set.
pub const RAT_PROBLEM: QuestId = QuestId(1);
/// Secret, two steps, no rewards.
pub const MEDAL_HUNT: QuestId = QuestId(2);

/// Commands recognized by [`recording_core`].
pub const KNOWN_COMMANDS: &[&str] = &["look", "say", "emote", "attack", "go", "suicide", "bank"];

/// The catalog described in the module docs.
pub fn sample_catalog() -> Catalog {
    let mut c = Catalog::default();
    let grenade = |id, name: &str, buffs: &[BuffId], effect| ItemSpec {
        id,
        name: name.to_string(),
        kind: ItemKind::Grenade,
        buff_ids: buffs.iter().copied().collect(),
        quest_token: None,
        area_effect: effect,
    };
    c.add_item(grenade(GRENADE, "grenade", &[BURN, STUN], None));
    c.add_item(grenade(INCENDIARY, "incendiary", &[BURN], Some(RoomEffect::Wildfire)));
    c.add_item(grenade(DUD, "dud", &[], None));
    c.add_item(ItemSpec {
        id: ROCK,
        name: "rock".to_string(),
        kind: ItemKind::Junk,
        buff_ids: smallvec![BURN],
        quest_token: None,
        area_effect: None,
    });
    c.add_item(ItemSpec {
        id: MEDAL,
        name: "medal".to_string(),
        kind: ItemKind::Junk,
        buff_ids: smallvec![],
        quest_token: Some("2-start".to_string()),
        area_effect: None,
    });

    c.add_buff(BuffSpec {
        id: BURN,
        name: "burn".to_string(),
        trigger_now: true,
        duration_turns: Some(5),
        flags: smallvec![],
    });
    c.add_buff(BuffSpec {
        id: STUN,
        name: "stun".to_string(),
        trigger_now: false,
        duration_turns: Some(2),
        flags: smallvec![],
    });
    c.add_buff(BuffSpec {
        id: HEARING,
        name: "keen ears".to_string(),
        trigger_now: false,
        duration_turns: None,
        flags: smallvec![BuffFlag::SuperHearing],
    });
    c.add_buff(BuffSpec {
        id: CHARM,
        name: "charm".to_string(),
        trigger_now: false,
        duration_turns: None,
        flags: smallvec![BuffFlag::Charmed],
    });

    c.add_quest(QuestSpec {
        id: RAT_PROBLEM,
        name: "Rat Problem".to_string(),
        secret: false,
        steps: vec!["start".into(), "middle".into(), "end".into()],
        rewards: QuestRewards {
            player_message: Some("The mayor thanks you.".to_string()),
            room_message: Some("The crowd cheers.".to_string()),
            quest_token: None,
            gold: 50,
            item: Some(MEDAL),
            buff: Some(HEARING),
            experience: 100,
            skill: Some(SkillReward {
                name: "brawling".to_string(),
                level: 2,
            }),
            room: Some(CLEARING),
        },
    });
    c.add_quest(QuestSpec {
        id: MEDAL_HUNT,
        name: "Medal Hunt".to_string(),
        secret: true,
        steps: vec!["start".into(), "end".into()],
        rewards: QuestRewards::default(),
    });
    c
}

/// The world described in the module docs, with everyone placed.
pub fn sample_state() -> WorldState {
    let mut w = WorldState::new(sample_catalog());
    w.insert_room(
        Room::new(SQUARE, "Town", "Square")
            .with_exit("north", CLEARING)
            .with_temp_exit("hole", ALLEY),
    );
    w.insert_room(
        Room::new(CLEARING, "Woods", "Clearing")
            .with_temp_exit("trail", SQUARE)
            .with_exit("south", SQUARE),
    );
    w.insert_room(Room::new(ALLEY, "Town", "Alley").with_exit("up", SQUARE));

    for (id, conn, name) in [(ANN, ANN_CONN, "Ann"), (BOB, BOB_CONN, "Bob")] {
        w.insert_actor(Actor::new(id, conn, Character::new(name, SQUARE, "Town")));
        w.move_actor(id, SQUARE).expect("fixture room exists");
    }
    w.spawn_mob(Mob::new(RAT, Character::new("Rat", SQUARE, "Town")));
    w.spawn_mob(Mob::new(WOLF, Character::new("Wolf", CLEARING, "Woods")));
    w
}

/// Put a fresh instance of `spec` on the floor of `room`.
pub fn drop_item(state: &mut WorldState, room: RoomId, spec: ItemId) -> Item {
    let item = state.new_item(spec);
    state
        .room_mut(room)
        .expect("fixture room exists")
        .items
        .push(item);
    item
}

/// A core over [`sample_state`] plus handles on every recorder.
pub struct RecordingCore {
    pub core: WorldCore,
    pub net: NetworkLog,
    pub saved: PersistLog,
    pub scripts: ScriptLog,
    pub commands: CommandLog,
}

/// Build a [`RecordingCore`] around `network` and `scripts`.
pub fn recording_core_with(network: RecordingNetwork, scripts: RecordingScripts) -> RecordingCore {
    let persistence = MemoryPersistence::new();
    let commands = RecordingCommands::new(KNOWN_COMMANDS);
    let handles = (network.log(), persistence.log(), scripts.log(), commands.log());
    let core = WorldCore::new(
        sample_state(),
        Collaborators::new(persistence, scripts, network, commands),
    );
    RecordingCore {
        core,
        net: handles.0,
        saved: handles.1,
        scripts: handles.2,
        commands: handles.3,
    }
}

/// A [`RecordingCore`] with default recorders.
pub fn recording_core() -> RecordingCore {
    recording_core_with(RecordingNetwork::new(), RecordingScripts::new())
}

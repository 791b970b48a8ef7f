//! Turnstile Quickstart: a two-room world running on the threaded engine.
//!
//! Demonstrates:
//!   1. Building a catalog and a world state by hand
//!   2. Implementing the collaborator traits (console network, no-op
//!      storage, a damage script, a small command interpreter)
//!   3. Starting a World and bringing a player in through the lifecycle
//!      channels
//!   4. Submitting input from a producer thread, including a grenade
//!   5. Shutting down with a final save
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example quickstart

use std::thread;
use std::time::Duration;

use smallvec::smallvec;
use tracing_subscriber::EnvFilter;

use turnstile_core::catalog::{BuffSpec, Catalog, ItemKind, ItemSpec};
use turnstile_core::character::{Actor, Character, Mob};
use turnstile_core::error::{CommandError, NetworkError, PersistError, ScriptError};
use turnstile_core::event::{Message, RoomActionEvent, Target};
use turnstile_core::id::{ActorId, BuffId, ConnectionId, ItemId, MobId, RoomId};
use turnstile_core::room::Room;
use turnstile_core::state::WorldState;
use turnstile_core::traits::{BuffHook, Connections, Persistence, ScriptHost};
use turnstile_engine::{
    Collaborators, CommandHandler, GameConfig, SharedConfig, TurnContext, World, WorldCore,
};

// ─── Ids ────────────────────────────────────────────────────────

const HALL: RoomId = RoomId(1);
const YARD: RoomId = RoomId(2);
const HERO: ActorId = ActorId(1);
const HERO_CONN: ConnectionId = ConnectionId(100);
const GOBLIN: MobId = MobId(1);
const GRENADE: ItemId = ItemId(1);
const SCORCH: BuffId = BuffId(1);

// ─── Collaborators ──────────────────────────────────────────────

/// Prints everything sent to a connection.
struct Console;

impl Connections for Console {
    fn send_to(&mut self, connection: ConnectionId, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_start_matches(turnstile_engine::LINE_REFRESH);
        println!("[{connection}] {}", text.trim_end());
    }

    fn broadcast(&mut self, bytes: &[u8]) {
        println!("[all] {}", String::from_utf8_lossy(bytes).trim_end());
    }

    fn supports_channel(&self, _connection: ConnectionId, _module: &str) -> bool {
        false
    }

    fn is_websocket(&self, _connection: ConnectionId) -> bool {
        false
    }

    fn disconnect(&mut self, connection: ConnectionId) -> Result<(), NetworkError> {
        println!("[{connection}] -- disconnected --");
        Ok(())
    }

    fn kick(&mut self, connection: ConnectionId) {
        println!("[{connection}] -- kicked --");
    }
}

/// Logs saves instead of writing them anywhere.
struct NoStorage;

impl Persistence for NoStorage {
    fn save_actor(&mut self, actor: &Actor) -> Result<(), PersistError> {
        tracing::info!(actor = %actor.id, "saved actor");
        Ok(())
    }

    fn save_room(&mut self, _room: &Room) -> Result<(), PersistError> {
        Ok(())
    }
}

/// Scorch deals one point of damage when it triggers.
struct Scripts;

impl ScriptHost for Scripts {
    fn buff_event(
        &mut self,
        hook: BuffHook,
        _target: Target,
        character: &mut Character,
        _buff: BuffId,
    ) -> Result<(), ScriptError> {
        if hook == BuffHook::OnTrigger {
            character.health -= 1;
        }
        Ok(())
    }
}

/// Understands `say`, `look`, `go <exit>` and `throw`.
struct Interpreter;

impl CommandHandler for Interpreter {
    fn actor_command(
        &mut self,
        ctx: &mut TurnContext<'_>,
        actor: ActorId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        let Ok(a) = ctx.state.actor(actor) else {
            return Ok(true);
        };
        let (name, here) = (a.character.name.clone(), a.character.room);
        match command {
            "say" => {
                ctx.queues.send_text(actor, format!("You say, \"{rest}\""));
                ctx.queues.push(
                    Message::to_room(here, format!("{name} says, \"{rest}\""))
                        .excluding(actor)
                        .communication(),
                );
            }
            "look" => {
                let title = ctx
                    .state
                    .rooms
                    .get(&here)
                    .map_or_else(|| "Nowhere".to_string(), |r| r.title.clone());
                ctx.queues.send_text(actor, title);
            }
            "go" => {
                let exit = ctx
                    .state
                    .rooms
                    .get(&here)
                    .and_then(|r| r.exits.get(rest))
                    .map(|e| e.room);
                let Some(to) = exit else {
                    ctx.queues.send_text(actor, "You can't go that way.");
                    return Ok(true);
                };
                ctx.state.move_actor(actor, to).map_err(|e| CommandError {
                    command: command.to_string(),
                    reason: e.to_string(),
                })?;
                ctx.queues.room_text(here, format!("{name} leaves."), &[actor]);
                ctx.queues.room_text(to, format!("{name} arrives."), &[actor]);
            }
            "throw" => {
                let grenade = ctx.state.new_item(GRENADE);
                if let Ok(room) = ctx.state.room_mut(here) {
                    room.items.push(grenade);
                }
                ctx.queues.send_text(actor, "You pull the pin and drop the grenade.");
                ctx.queues.push(RoomActionEvent {
                    room: here,
                    source: Some(Target::Actor(actor)),
                    action: "detonate grenade".to_string(),
                    wait_turns: 3,
                });
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn mob_command(
        &mut self,
        _ctx: &mut TurnContext<'_>,
        mob: MobId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError> {
        tracing::info!(mob = %mob, command, rest, "mob acts");
        Ok(true)
    }
}

// ─── World ──────────────────────────────────────────────────────

fn build_state() -> WorldState {
    let mut catalog = Catalog::default();
    catalog.add_item(ItemSpec {
        id: GRENADE,
        name: "grenade".to_string(),
        kind: ItemKind::Grenade,
        buff_ids: smallvec![SCORCH],
        quest_token: None,
        area_effect: None,
    });
    catalog.add_buff(BuffSpec {
        id: SCORCH,
        name: "scorch".to_string(),
        trigger_now: true,
        duration_turns: Some(10),
        flags: smallvec![],
    });

    let mut state = WorldState::new(catalog);
    state.insert_room(Room::new(HALL, "Keep", "Great Hall").with_exit("out", YARD));
    state.insert_room(Room::new(YARD, "Keep", "Courtyard").with_exit("in", HALL));
    state.insert_actor(Actor::new(
        HERO,
        HERO_CONN,
        Character::new("Hero", HALL, "Keep"),
    ));
    state.spawn_mob(Mob::new(GOBLIN, Character::new("Goblin", YARD, "Keep")));
    state
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 1. Build the core and start the threads.
    let core = WorldCore::new(
        build_state(),
        Collaborators::new(NoStorage, Scripts, Console, Interpreter),
    );
    let config = SharedConfig::new(GameConfig {
        turn_ms: 50,
        ..GameConfig::default()
    });
    let mut world = World::start(core, config)?;

    // 2. Bring the hero in; returns once the scheduler has placed them.
    world.enter_world(HERO, HALL)?;

    // 3. A connection thread types a few lines. One runs per turn.
    let input = world.input_handle();
    let typist = thread::spawn(move || {
        for line in ["look", "say Is anyone out there?", "go out", "throw", "dance"] {
            if input.submit_actor(HERO, line, 0).is_err() {
                break;
            }
        }
    });
    typist.join().map_err(|_| "typist panicked")?;

    // 4. Let the grenade go off and the goblin react.
    thread::sleep(Duration::from_millis(800));
    let (turn, goblin_health) = world.inspect(|c| {
        (c.turn(), c.state().mobs[&GOBLIN].character.health)
    });
    println!("turn {turn}: goblin health {goblin_health}");

    // 5. Stop, persisting everything.
    let report = world.shutdown();
    println!(
        "shut down in {}ms (funnel joined: {}, scheduler joined: {})",
        report.total_ms, report.funnel_joined, report.scheduler_joined
    );
    Ok(())
}

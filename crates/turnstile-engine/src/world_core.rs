//! The world core: every piece of mutable simulation state plus the
//! collaborators that act on it.
//!
//! [`WorldCore`] is the unit guarded by the exclusivity token. Each public
//! method is one unit of work the scheduler performs while holding the
//! token; tests and embedders can call the same methods directly to drive
//! the simulation in lockstep without any threads.

use crossbeam_channel::Receiver;
use serde_json::json;
use tracing::{debug, error, info, warn};

use turnstile_core::error::WorldError;
use turnstile_core::event::{InputEvent, OutboundPayload, SystemEvent, Target};
use turnstile_core::id::{ActorId, BuffId, ConnectionId, RoomId, TurnId};
use turnstile_core::state::WorldState;
use turnstile_core::traits::{BuffHook, Connections, Persistence, ScriptHost};

use crate::bad_input::BadInputTracker;
use crate::config::GameConfig;
use crate::hooks::{CommandHandler, NoHooks, WorldHooks};
use crate::metrics::{TimeTracker, TurnMetrics};
use crate::queue::QueueSet;
use crate::stats::ServerStats;
use crate::zombie::ZombieSet;

/// Builds a `TurnContext` from disjoint fields of a `WorldCore`, so
/// the command handler and hooks stay borrowable alongside it.
macro_rules! turn_context {
    ($core:expr, $config:expr) => {
        $crate::hooks::TurnContext {
            state: &mut $core.state,
            queues: &mut $core.queues,
            zombies: &mut $core.zombies,
            network: &mut *$core.network,
            config: $config,
            turn: $core.turn,
        }
    };
}
pub(crate) use turn_context;

// ── Collaborators ───────────────────────────────────────────────

/// The external systems a world core drives.
pub struct Collaborators {
    /// Durable storage.
    pub persistence: Box<dyn Persistence>,
    /// Buff scripting.
    pub scripts: Box<dyn ScriptHost>,
    /// Client sessions.
    pub network: Box<dyn Connections>,
    /// Command interpreter.
    pub commands: Box<dyn CommandHandler>,
    /// Periodic mechanics. Defaults to [`NoHooks`].
    pub hooks: Box<dyn WorldHooks>,
}

impl Collaborators {
    /// Bundle the required collaborators with no-op hooks.
    pub fn new(
        persistence: impl Persistence + 'static,
        scripts: impl ScriptHost + 'static,
        network: impl Connections + 'static,
        commands: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            persistence: Box::new(persistence),
            scripts: Box::new(scripts),
            network: Box::new(network),
            commands: Box::new(commands),
            hooks: Box::new(NoHooks),
        }
    }

    /// Replace the periodic hooks.
    pub fn with_hooks(mut self, hooks: impl WorldHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }
}

/// Outcome of a save pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Actors written.
    pub actors: usize,
    /// Rooms written.
    pub rooms: usize,
    /// Records that failed to write.
    pub failed: usize,
}

// ── WorldCore ───────────────────────────────────────────────────

/// All simulation state and the collaborators acting on it.
pub struct WorldCore {
    pub(crate) state: WorldState,
    pub(crate) queues: QueueSet,
    pub(crate) zombies: ZombieSet,
    pub(crate) bad_input: BadInputTracker,
    pub(crate) stats: ServerStats,
    pub(crate) metrics: TurnMetrics,
    pub(crate) timings: TimeTracker,
    pub(crate) turn: TurnId,
    pub(crate) inbox: Option<Receiver<InputEvent>>,
    pub(crate) persistence: Box<dyn Persistence>,
    pub(crate) scripts: Box<dyn ScriptHost>,
    pub(crate) network: Box<dyn Connections>,
    pub(crate) commands: Box<dyn CommandHandler>,
    pub(crate) hooks: Box<dyn WorldHooks>,
}

impl WorldCore {
    /// A core at turn zero with empty queues.
    pub fn new(state: WorldState, collaborators: Collaborators) -> Self {
        let Collaborators {
            persistence,
            scripts,
            network,
            commands,
            hooks,
        } = collaborators;
        Self {
            state,
            queues: QueueSet::new(),
            zombies: ZombieSet::new(),
            bad_input: BadInputTracker::new(),
            stats: ServerStats::default(),
            metrics: TurnMetrics::default(),
            timings: TimeTracker::new(),
            turn: TurnId(0),
            inbox: None,
            persistence,
            scripts,
            network,
            commands,
            hooks,
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    /// The world model.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// The world model, mutably.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// The work queues.
    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    /// The work queues, mutably.
    pub fn queues_mut(&mut self) -> &mut QueueSet {
        &mut self.queues
    }

    /// Disconnected actors awaiting expiry.
    pub fn zombies(&self) -> &ZombieSet {
        &self.zombies
    }

    /// Unrecognized command counts.
    pub fn bad_input(&self) -> &BadInputTracker {
        &self.bad_input
    }

    /// The last statistics snapshot.
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }

    /// Metrics of the most recent turn.
    pub fn metrics(&self) -> &TurnMetrics {
        &self.metrics
    }

    /// Cumulative phase timings.
    pub fn timings(&self) -> &TimeTracker {
        &self.timings
    }

    /// The current turn.
    pub fn turn(&self) -> TurnId {
        self.turn
    }

    // ── Input ───────────────────────────────────────────────────

    /// Enqueue input directly, bypassing the funnel.
    pub fn submit_input(&mut self, input: InputEvent) {
        self.queues.input.enqueue(input);
    }

    /// Attach the receiving end of the funnel's inbox.
    pub fn attach_inbox(&mut self, inbox: Receiver<InputEvent>) {
        self.inbox = Some(inbox);
    }

    /// Move everything the funnel forwarded into the input queue.
    pub(crate) fn pull_inbox(&mut self) -> usize {
        let Some(inbox) = &self.inbox else {
            return 0;
        };
        let mut pulled = 0;
        for input in inbox.try_iter() {
            self.queues.input.enqueue(input);
            pulled += 1;
        }
        pulled
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Bring an actor into the world.
    ///
    /// Places them in `room` when it exists, else in their persisted room,
    /// else in the configured home room.
    pub fn enter_world(
        &mut self,
        actor: ActorId,
        room: RoomId,
        config: &GameConfig,
    ) -> Result<(), WorldError> {
        let turn = self.turn;
        let a = self.state.actor_mut(actor).inspect_err(|_| {
            warn!(actor = %actor, "enter world: actor not registered");
        })?;
        a.log_event("conn", "Entered the world");
        a.online_since = turn;
        let persisted = a.character.room;
        let name = a.character.name.clone();
        self.zombies.clear(actor);

        let target = if self.state.rooms.contains_key(&room) {
            room
        } else if self.state.rooms.contains_key(&persisted) {
            persisted
        } else {
            warn!(
                actor = %actor,
                room = %persisted,
                home = %config.home_room,
                "persisted room missing, sending actor home"
            );
            let character = &mut self.state.actor_mut(actor)?.character;
            character.room = config.home_room;
            character.zone = config.home_zone.clone();
            config.home_room
        };

        for command in &config.on_login_commands {
            self.queues.push(InputEvent::actor(actor, command.as_str(), -1));
        }
        self.queues.push(OutboundPayload {
            actor,
            module: "Char.Name".to_string(),
            payload: json!({ "name": name, "fullname": name }),
        });
        self.update_stats(config);

        self.state.move_actor(actor, target).inspect_err(|e| {
            error!(actor = %actor, room = %target, error = %e, "enter world: placement failed");
        })?;
        let mut ctx = turn_context!(self, config);
        self.hooks.actor_entered_room(&mut ctx, actor, target);
        info!(actor = %actor, room = %target, "actor entered the world");
        Ok(())
    }

    /// Take an actor out of the world, leaving them registered.
    pub fn leave_world(&mut self, actor: ActorId) -> Result<(), WorldError> {
        let a = self.state.actor(actor).inspect_err(|_| {
            warn!(actor = %actor, "leave world: actor not online");
        })?;
        let room = a.character.room;
        let name = a.character.name.clone();

        self.state.leave_party(actor);
        for (mob, buffs) in self.state.release_charmed(actor, room) {
            for buff in buffs {
                self.run_buff_hook(BuffHook::OnEnd, Target::Mob(mob), buff);
            }
        }

        let present = self
            .state
            .rooms
            .get_mut(&room)
            .is_some_and(|r| r.remove_player(actor));
        if present {
            self.queues
                .room_text(room, format!("{name} vanishes into thin air."), &[]);
            let others = self
                .state
                .rooms
                .get(&room)
                .map(|r| r.players.clone())
                .unwrap_or_default();
            for other in others {
                self.queues.push(OutboundPayload {
                    actor: other,
                    module: "Room.RemovePlayer".to_string(),
                    payload: json!(name),
                });
            }
        }
        debug!(actor = %actor, room = %room, present, "actor left the world");
        Ok(())
    }

    /// End the session on `connection`, saving and unregistering its actor.
    pub fn logout(&mut self, connection: ConnectionId) {
        match self.state.actor_by_connection(connection) {
            Some(actor) => {
                if let Ok(a) = self.state.actor(actor) {
                    if let Err(e) = self.persistence.save_actor(a) {
                        error!(actor = %actor, error = %e, "logout: save failed");
                    }
                }
                if let Some(a) = self.state.actors.shift_remove(&actor) {
                    if let Some(room) = self.state.rooms.get_mut(&a.character.room) {
                        room.remove_player(actor);
                    }
                }
                self.zombies.clear(actor);
                info!(actor = %actor, connection = %connection, "actor logged out");
            }
            None => warn!(connection = %connection, "logout: no actor bound to connection"),
        }
        if let Err(e) = self.network.disconnect(connection) {
            warn!(connection = %connection, error = %e, "logout: disconnect failed");
        }
    }

    /// Flag or unflag an actor as a zombie.
    pub fn set_zombie(&mut self, actor: ActorId, zombie: bool) {
        if !zombie {
            self.zombies.clear(actor);
            return;
        }
        if !self.state.actors.contains_key(&actor) {
            warn!(actor = %actor, "set zombie: actor not online");
            return;
        }
        if self.zombies.flag(actor, self.turn) {
            debug!(actor = %actor, turn = %self.turn, "actor flagged as zombie");
        }
    }

    /// Forcibly disconnect an actor, leaving them as a zombie.
    pub fn kick(&mut self, actor: ActorId, config: &GameConfig) {
        turn_context!(self, config).kick(actor);
    }

    // ── Persistence ─────────────────────────────────────────────

    /// Save every online actor.
    pub fn save_actors(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        for actor in self.state.actors.values() {
            match self.persistence.save_actor(actor) {
                Ok(()) => report.actors += 1,
                Err(e) => {
                    error!(actor = %actor.id, error = %e, "saving actor failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Save every loaded room.
    pub fn save_rooms(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        for room in self.state.rooms.values() {
            match self.persistence.save_room(room) {
                Ok(()) => report.rooms += 1,
                Err(e) => {
                    error!(room = %room.id, error = %e, "saving room failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Save every room and actor.
    pub fn persist_all(&mut self) -> SaveReport {
        let rooms = self.save_rooms();
        let actors = self.save_actors();
        let report = SaveReport {
            actors: actors.actors,
            rooms: rooms.rooms,
            failed: actors.failed + rooms.failed,
        };
        info!(
            actors = report.actors,
            rooms = report.rooms,
            failed = report.failed,
            "world persisted"
        );
        report
    }

    // ── Timers ──────────────────────────────────────────────────

    /// Rebuild the statistics snapshot.
    pub fn update_stats(&mut self, config: &GameConfig) {
        self.stats = ServerStats::collect(&self.state, &self.zombies, config, self.turn);
    }

    /// Run room upkeep.
    pub fn room_maintenance(&mut self, config: &GameConfig) {
        let mut ctx = turn_context!(self, config);
        self.hooks.room_maintenance(&mut ctx);
    }

    /// Reload command aliases.
    pub fn reload(&mut self) {
        self.hooks.reload_aliases();
    }

    /// Ask the next message tick to reload flat-file content.
    pub fn request_data_reload(&mut self) {
        self.queues.push(SystemEvent {
            command: "reload".to_string(),
        });
    }

    // ── Scripts ─────────────────────────────────────────────────

    /// Run a buff hook, logging failures. Returns whether it succeeded.
    pub(crate) fn run_buff_hook(&mut self, hook: BuffHook, target: Target, buff: BuffId) -> bool {
        let character = match self.state.character_mut(target) {
            Ok(c) => c,
            Err(e) => {
                debug!(hook = hook.name(), buff = %buff, error = %e, "buff hook: target gone");
                return false;
            }
        };
        match self.scripts.buff_event(hook, target, character, buff) {
            Ok(()) => true,
            Err(e) => {
                error!(hook = hook.name(), buff = %buff, error = %e, "buff hook failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for WorldCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldCore")
            .field("turn", &self.turn)
            .field("actors", &self.state.actors.len())
            .field("rooms", &self.state.rooms.len())
            .field("queued", &self.queues.total_len())
            .field("zombies", &self.zombies.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_core, TestCore};
    use turnstile_core::character::{Actor, Character};
    use turnstile_core::state::Party;

    fn entered(t: &mut TestCore) {
        let config = GameConfig::default();
        t.core.enter_world(ActorId(1), RoomId(1), &config).unwrap();
        t.core.enter_world(ActorId(2), RoomId(1), &config).unwrap();
    }

    // ── Enter world ─────────────────────────────────────────────

    #[test]
    fn enter_places_actor_and_queues_login_commands() {
        let mut t = test_core();
        let config = GameConfig {
            on_login_commands: vec!["look".into(), "inventory".into()],
            ..GameConfig::default()
        };
        t.core.set_zombie(ActorId(1), true);
        t.core.enter_world(ActorId(1), RoomId(2), &config).unwrap();

        let core = &t.core;
        assert!(core.state().rooms[&RoomId(2)].players.contains(&ActorId(1)));
        assert!(!core.zombies().contains(ActorId(1)));
        assert_eq!(core.queues().input.len(), 2);
        assert_eq!(core.queues().outbound.len(), 1);
        assert_eq!(core.stats().online_count(), 2);
    }

    #[test]
    fn enter_falls_back_to_persisted_then_home() {
        let mut t = test_core();
        let config = GameConfig::default();
        t.core.state_mut().actors[&ActorId(1)].character.room = RoomId(2);
        t.core.enter_world(ActorId(1), RoomId(99), &config).unwrap();
        assert_eq!(t.core.state().actors[&ActorId(1)].character.room, RoomId(2));

        t.core.state_mut().actors[&ActorId(2)].character.room = RoomId(77);
        t.core.enter_world(ActorId(2), RoomId(99), &config).unwrap();
        let c = &t.core.state().actors[&ActorId(2)].character;
        assert_eq!(c.room, RoomId(1));
        assert_eq!(c.zone, "Town");
    }

    #[test]
    fn enter_unknown_actor_is_an_error() {
        let mut t = test_core();
        let err = t
            .core
            .enter_world(ActorId(50), RoomId(1), &GameConfig::default())
            .unwrap_err();
        assert_eq!(err, WorldError::ActorNotFound(ActorId(50)));
    }

    // ── Leave world ─────────────────────────────────────────────

    #[test]
    fn leave_removes_from_room_party_and_notifies() {
        let mut t = test_core();
        entered(&mut t);
        t.core.queues_mut().clear();
        t.core.state_mut().parties.push(Party {
            leader: ActorId(1),
            members: vec![ActorId(2)],
        });
        t.core.leave_world(ActorId(1)).unwrap();

        let core = &t.core;
        assert!(core.state().parties.is_empty());
        assert!(!core.state().rooms[&RoomId(1)].players.contains(&ActorId(1)));
        assert!(core.state().actors.contains_key(&ActorId(1)));
        assert_eq!(core.queues().message.len(), 1);
        assert_eq!(core.queues().outbound.len(), 1);
    }

    #[test]
    fn leave_twice_does_not_announce_again() {
        let mut t = test_core();
        entered(&mut t);
        t.core.leave_world(ActorId(1)).unwrap();
        t.core.queues_mut().clear();
        t.core.leave_world(ActorId(1)).unwrap();
        assert_eq!(t.core.queues().total_len(), 0);
    }

    // ── Logout and zombies ──────────────────────────────────────

    #[test]
    fn logout_saves_and_unregisters() {
        let mut t = test_core();
        entered(&mut t);
        t.core.logout(ConnectionId(10));
        assert!(!t.core.state().actors.contains_key(&ActorId(1)));
        assert!(!t.core.state().rooms[&RoomId(1)].players.contains(&ActorId(1)));
        assert_eq!(t.saved.actors_saved(), vec![ActorId(1)]);
        assert_eq!(t.net.disconnects(), vec![ConnectionId(10)]);
    }

    #[test]
    fn logout_of_unknown_connection_still_disconnects() {
        let mut t = test_core();
        t.core.logout(ConnectionId(999));
        assert_eq!(t.core.state().actors.len(), 2);
        assert_eq!(t.net.disconnects(), vec![ConnectionId(999)]);
    }

    #[test]
    fn zombie_flag_round_trip() {
        let mut t = test_core();
        t.core.set_zombie(ActorId(1), true);
        t.core.set_zombie(ActorId(42), true);
        assert!(t.core.zombies().contains(ActorId(1)));
        assert!(!t.core.zombies().contains(ActorId(42)));
        t.core.set_zombie(ActorId(1), false);
        assert!(t.core.zombies().is_empty());
    }

    // ── Persistence ─────────────────────────────────────────────

    #[test]
    fn persist_all_counts_failures() {
        let mut t = test_core();
        let report = t.core.persist_all();
        assert_eq!(report.actors, 2);
        assert_eq!(report.rooms, 3);
        assert_eq!(report.failed, 0);

        t.saved.fail_with("disk full");
        let report = t.core.persist_all();
        assert_eq!(report.failed, 5);
        assert_eq!(report.actors + report.rooms, 0);
    }

    #[test]
    fn actor_added_later_is_saved() {
        let mut t = test_core();
        t.core.state_mut().insert_actor(Actor::new(
            ActorId(3),
            ConnectionId(30),
            Character::new("Cid", RoomId(1), "Town"),
        ));
        assert_eq!(t.core.save_actors().actors, 3);
    }
}

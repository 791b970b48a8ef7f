//! Engine-side collaborator traits and the per-call context handed to them.
//!
//! [`CommandHandler`] interprets command lines; [`WorldHooks`] covers the
//! periodic game mechanics (level-ups, rounds, room upkeep, data reloads)
//! the scheduler triggers but does not itself implement. Both receive a
//! [`TurnContext`] so they can mutate the world and enqueue follow-up
//! events without reaching back into the engine.

use tracing::{debug, warn};

use turnstile_core::error::CommandError;
use turnstile_core::id::{ActorId, MobId, RoomId, TurnId};
use turnstile_core::state::WorldState;
use turnstile_core::traits::Connections;

use crate::config::GameConfig;
use crate::queue::QueueSet;
use crate::zombie::ZombieSet;

/// Mutable access to everything a unit of work may touch.
///
/// Only ever built while the exclusivity token is held.
pub struct TurnContext<'a> {
    /// The world model.
    pub state: &'a mut WorldState,
    /// Work queues, for cascading follow-up events.
    pub queues: &'a mut QueueSet,
    /// Disconnected actors awaiting expiry.
    pub zombies: &'a mut ZombieSet,
    /// The transport layer.
    pub network: &'a mut dyn Connections,
    /// Configuration snapshot for this unit of work.
    pub config: &'a GameConfig,
    /// The current turn.
    pub turn: TurnId,
}

impl TurnContext<'_> {
    /// Forcibly disconnect an actor.
    ///
    /// The actor is flagged as a zombie at the current turn so the sweep
    /// removes them later; the character stays in the world until then.
    pub fn kick(&mut self, actor: ActorId) {
        let Ok(a) = self.state.actor_mut(actor) else {
            warn!(actor = %actor, "kick: actor not online");
            return;
        };
        a.log_event("conn", "Kicked");
        let connection = a.connection;
        self.zombies.flag(actor, self.turn);
        self.network.kick(connection);
        debug!(actor = %actor, connection = %connection, "kicked");
    }
}

/// Interprets command lines.
///
/// Returning `Ok(false)` means the command word is not recognized; the
/// engine then tells the actor and counts the miss.
pub trait CommandHandler: Send {
    /// Run an actor's command.
    fn actor_command(
        &mut self,
        ctx: &mut TurnContext<'_>,
        actor: ActorId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError>;

    /// Run a mob's command.
    fn mob_command(
        &mut self,
        ctx: &mut TurnContext<'_>,
        mob: MobId,
        command: &str,
        rest: &str,
    ) -> Result<bool, CommandError>;
}

/// Periodic game mechanics driven by the scheduler.
///
/// Every method defaults to a no-op.
pub trait WorldHooks: Send {
    /// Evaluate level-ups. Runs once per second of turns.
    fn check_level_ups(&mut self, _ctx: &mut TurnContext<'_>) {}

    /// Round-level upkeep (mob AI, regeneration). Runs once per round.
    fn round_tick(&mut self, _ctx: &mut TurnContext<'_>) {}

    /// Room upkeep (respawns, temporary exits). Runs on the 3 s timer.
    fn room_maintenance(&mut self, _ctx: &mut TurnContext<'_>) {}

    /// Reload command aliases. Runs on the 4 s timer.
    fn reload_aliases(&mut self) {}

    /// Reload flat-file content after a `reload` system command.
    fn reload_data(&mut self, _ctx: &mut TurnContext<'_>) {}

    /// Recompute leaderboards during autosave.
    fn update_leaderboards(&mut self, _state: &WorldState) {}

    /// An actor was just placed into a room by enter-world.
    fn actor_entered_room(&mut self, _ctx: &mut TurnContext<'_>, _actor: ActorId, _room: RoomId) {}
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl WorldHooks for NoHooks {}

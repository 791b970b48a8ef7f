//! Aggregate server statistics for out-of-band readers.

use turnstile_core::character::Permission;
use turnstile_core::id::{ActorId, TurnId};
use turnstile_core::state::WorldState;

use crate::config::GameConfig;
use crate::zombie::ZombieSet;

/// One online actor as shown on a status page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OnlineActor {
    /// Actor id.
    pub actor: ActorId,
    /// Character name.
    pub name: String,
    /// Privilege level.
    pub permission: Permission,
    /// Turns since entering the world.
    pub online_turns: u64,
    /// Whether the connection has dropped.
    pub zombie: bool,
}

/// A consistent snapshot of server-wide numbers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Online actors, admins first, then longest online.
    pub online: Vec<OnlineActor>,
    /// Telnet listener ports.
    pub telnet_ports: Vec<u16>,
    /// Web listener port.
    pub web_port: u16,
    /// Current turn.
    pub turn: TurnId,
    /// Rounds elapsed.
    pub round: u64,
}

impl ServerStats {
    /// Build a snapshot from the live world.
    pub fn collect(
        state: &WorldState,
        zombies: &ZombieSet,
        config: &GameConfig,
        turn: TurnId,
    ) -> Self {
        let mut online: Vec<OnlineActor> = state
            .actors
            .values()
            .map(|a| OnlineActor {
                actor: a.id,
                name: a.character.name.clone(),
                permission: a.permission,
                online_turns: turn.since(a.online_since),
                zombie: zombies.contains(a.id),
            })
            .collect();
        online.sort_by(|a, b| {
            let admin = |o: &OnlineActor| o.permission != Permission::Admin;
            admin(a)
                .cmp(&admin(b))
                .then_with(|| b.online_turns.cmp(&a.online_turns))
        });
        Self {
            online,
            telnet_ports: config.telnet_ports.iter().copied().filter(|&p| p > 0).collect(),
            web_port: config.web_port,
            turn,
            round: turn.0 / config.turns_per_round(),
        }
    }

    /// Number of online actors.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstile_core::character::{Actor, Character};
    use turnstile_core::catalog::Catalog;
    use turnstile_core::id::{ConnectionId, RoomId};

    fn actor(id: u32, since: u64, permission: Permission) -> Actor {
        let mut a = Actor::new(
            ActorId(id),
            ConnectionId(u64::from(id)),
            Character::new(format!("p{id}"), RoomId(1), "Town"),
        );
        a.online_since = TurnId(since);
        a.permission = permission;
        a
    }

    #[test]
    fn admins_first_then_longest_online() {
        let mut state = WorldState::new(Catalog::default());
        state.insert_actor(actor(1, 50, Permission::User));
        state.insert_actor(actor(2, 10, Permission::User));
        state.insert_actor(actor(3, 90, Permission::Admin));
        let mut zombies = ZombieSet::new();
        zombies.flag(ActorId(2), TurnId(95));

        let stats = ServerStats::collect(&state, &zombies, &GameConfig::default(), TurnId(100));
        let order: Vec<_> = stats.online.iter().map(|o| o.actor).collect();
        assert_eq!(order, vec![ActorId(3), ActorId(2), ActorId(1)]);
        assert!(stats.online[1].zombie);
        assert_eq!(stats.online[1].online_turns, 90);
        assert_eq!(stats.round, 2);
        assert_eq!(stats.telnet_ports, vec![33333]);
        assert_eq!(stats.web_port, 80);
    }
}

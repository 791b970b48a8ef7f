//! Actors that dropped their connection without logging out.

use indexmap::IndexMap;

use turnstile_core::id::{ActorId, TurnId};

/// Maps each zombie actor to the turn they were flagged on.
#[derive(Clone, Debug, Default)]
pub struct ZombieSet {
    flagged: IndexMap<ActorId, TurnId>,
}

impl ZombieSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag an actor. Re-flagging keeps the original turn.
    ///
    /// Returns `true` if the actor was not already a zombie.
    pub fn flag(&mut self, actor: ActorId, turn: TurnId) -> bool {
        if self.flagged.contains_key(&actor) {
            return false;
        }
        self.flagged.insert(actor, turn);
        true
    }

    /// Clear an actor's flag. Returns whether they were flagged.
    pub fn clear(&mut self, actor: ActorId) -> bool {
        self.flagged.shift_remove(&actor).is_some()
    }

    /// Whether the actor is a zombie.
    pub fn contains(&self, actor: ActorId) -> bool {
        self.flagged.contains_key(&actor)
    }

    /// Turn on which the actor was flagged.
    pub fn flagged_at(&self, actor: ActorId) -> Option<TurnId> {
        self.flagged.get(&actor).copied()
    }

    /// Zombies flagged more than `timeout` turns before `now`, in flag order.
    pub fn expired(&self, now: TurnId, timeout: u64) -> Vec<ActorId> {
        self.flagged
            .iter()
            .filter(|(_, &at)| now.since(at) > timeout)
            .map(|(&actor, _)| actor)
            .collect()
    }

    /// Number of zombies.
    pub fn len(&self) -> usize {
        self.flagged.len()
    }

    /// Whether there are no zombies.
    pub fn is_empty(&self) -> bool {
        self.flagged.is_empty()
    }
}

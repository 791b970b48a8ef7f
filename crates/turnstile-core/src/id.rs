//! Strongly-typed identifiers for everything the tick engine addresses.
//!
//! Every id is a transparent newtype so an actor id can never be handed
//! to a function expecting a mob id. All ids are `Copy`, hashable, ordered
//! and print as their bare number.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(v: $inner) -> Self {
                Self(v)
            }
        }
    };
}

define_id!(
    /// A human-controlled actor (a logged-in player character).
    ActorId(u32)
);

define_id!(
    /// A live mob instance. Distinct from the mob's template.
    MobId(u32)
);

define_id!(
    /// A room in the world graph.
    RoomId(u32)
);

define_id!(
    /// A network session owned by the transport layer.
    ConnectionId(u64)
);

define_id!(
    /// An item specification in the catalog.
    ItemId(u32)
);

define_id!(
    /// A buff specification in the catalog.
    ///
    /// Always positive. Removal requests carry the sign separately, see
    /// [`BuffChange`](crate::event::BuffChange).
    BuffId(u32)
);

define_id!(
    /// A quest definition in the catalog.
    QuestId(u32)
);

/// Monotonically increasing turn counter.
///
/// Incremented once per turn-timer firing by the turn processor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

impl TurnId {
    /// The turn after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Whether this turn lands on a multiple of `period`.
    ///
    /// A zero period never matches.
    pub fn is_multiple_of(self, period: u64) -> bool {
        period != 0 && self.0 % period == 0
    }

    /// Turns elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: TurnId) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TurnId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

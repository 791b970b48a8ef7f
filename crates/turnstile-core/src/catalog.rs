//! Static content specifications: items, buffs and quests.
//!
//! The catalog is loaded once by the embedding server (typically from
//! data files via serde) and consulted read-only by the turn processor.
//! A `reload` system command may swap it wholesale.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{BuffId, ItemId, QuestId, RoomId};
use crate::room::RoomEffect;

// ── Items ───────────────────────────────────────────────────────

/// Broad item category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Wielded weapon.
    Weapon,
    /// Worn armor.
    Armor,
    /// Eaten, drunk or otherwise used up.
    Consumable,
    /// Thrown explosive; detonates via a room action.
    Grenade,
    /// Opens things.
    Key,
    /// Anything else.
    Junk,
}

/// Template for a class of items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Catalog id.
    pub id: ItemId,
    /// Display name, also used for floor lookups.
    pub name: String,
    /// Category.
    pub kind: ItemKind,
    /// Buffs applied to whoever the item affects.
    #[serde(default)]
    pub buff_ids: SmallVec<[BuffId; 2]>,
    /// Quest token granted on receipt.
    #[serde(default)]
    pub quest_token: Option<String>,
    /// Lingering hazard left in the room when the item goes off.
    #[serde(default)]
    pub area_effect: Option<RoomEffect>,
}

/// A concrete item instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// The template this item was made from.
    pub spec: ItemId,
    /// Instance id, unique for the life of the process.
    pub uid: u64,
}

// ── Buffs ───────────────────────────────────────────────────────

/// Behavioral flags a buff confers while active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffFlag {
    /// Hears quiet messages.
    SuperHearing,
    /// Bound to an actor by a charm.
    Charmed,
    /// Cannot start fights.
    Peaceful,
}

/// Template for a buff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuffSpec {
    /// Catalog id.
    pub id: BuffId,
    /// Display name.
    pub name: String,
    /// Run the trigger hook as soon as the buff is applied.
    #[serde(default)]
    pub trigger_now: bool,
    /// Lifetime in turns. `None` lasts until removed.
    #[serde(default)]
    pub duration_turns: Option<u64>,
    /// Flags active while the buff is held.
    #[serde(default)]
    pub flags: SmallVec<[BuffFlag; 2]>,
}

// ── Quests ──────────────────────────────────────────────────────

/// A skill raised to at least `level`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SkillReward {
    /// Lower-cased skill name.
    pub name: String,
    /// Minimum level granted.
    pub level: u32,
}

impl TryFrom<String> for SkillReward {
    type Error = String;

    /// Parse `name:level`.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        let (name, level) = s
            .split_once(':')
            .ok_or_else(|| format!("skill reward '{s}' is not name:level"))?;
        let level = level
            .trim()
            .parse()
            .map_err(|_| format!("skill reward '{s}' has a bad level"))?;
        Ok(Self {
            name: name.trim().to_lowercase(),
            level,
        })
    }
}

impl From<SkillReward> for String {
    fn from(r: SkillReward) -> Self {
        format!("{}:{}", r.name, r.level)
    }
}

/// Rewards paid out when a quest reaches its `end` step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestRewards {
    /// Text shown to the actor.
    pub player_message: Option<String>,
    /// Text shown to the rest of the actor's room.
    pub room_message: Option<String>,
    /// Follow-up quest token.
    pub quest_token: Option<String>,
    /// Gold credited.
    pub gold: u64,
    /// Item placed in the backpack.
    pub item: Option<ItemId>,
    /// Buff applied.
    pub buff: Option<BuffId>,
    /// Experience granted.
    pub experience: u64,
    /// Skill floor.
    pub skill: Option<SkillReward>,
    /// Room the actor is moved to.
    pub room: Option<RoomId>,
}

/// A quest definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestSpec {
    /// Catalog id.
    pub id: QuestId,
    /// Display name.
    pub name: String,
    /// Secret quests never announce progress.
    #[serde(default)]
    pub secret: bool,
    /// Ordered step names, normally starting with `start` and ending with `end`.
    pub steps: Vec<String>,
    /// Paid out on `end`.
    #[serde(default)]
    pub rewards: QuestRewards,
}

impl QuestSpec {
    /// Position of `step` in the step list.
    pub fn step_index(&self, step: &str) -> Option<usize> {
        self.steps.iter().position(|s| s == step)
    }
}

// ── Catalog ─────────────────────────────────────────────────────

/// All static specifications, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Item templates.
    pub items: IndexMap<ItemId, ItemSpec>,
    /// Buff templates.
    pub buffs: IndexMap<BuffId, BuffSpec>,
    /// Quest definitions.
    pub quests: IndexMap<QuestId, QuestSpec>,
}

impl Catalog {
    /// Register an item template, replacing any with the same id.
    pub fn add_item(&mut self, spec: ItemSpec) {
        self.items.insert(spec.id, spec);
    }

    /// Register a buff template, replacing any with the same id.
    pub fn add_buff(&mut self, spec: BuffSpec) {
        self.buffs.insert(spec.id, spec);
    }

    /// Register a quest, replacing any with the same id.
    pub fn add_quest(&mut self, spec: QuestSpec) {
        self.quests.insert(spec.id, spec);
    }

    /// Look up an item template.
    pub fn item(&self, id: ItemId) -> Option<&ItemSpec> {
        self.items.get(&id)
    }

    /// Look up a buff template.
    pub fn buff(&self, id: BuffId) -> Option<&BuffSpec> {
        self.buffs.get(&id)
    }

    /// Look up a quest.
    pub fn quest(&self, id: QuestId) -> Option<&QuestSpec> {
        self.quests.get(&id)
    }
}

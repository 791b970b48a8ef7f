//! Characters and the two kinds of entity that own one: actors and mobs.

use std::collections::VecDeque;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::catalog::{BuffFlag, BuffSpec, Item};
use crate::event::Target;
use crate::id::{ActorId, BuffId, ConnectionId, MobId, RoomId, TurnId};
use crate::quest::QuestLog;

/// Entries kept in an actor's event log before the oldest are dropped.
pub const EVENT_LOG_CAPACITY: usize = 64;

// ── Buffs ───────────────────────────────────────────────────────

/// A buff currently held by a character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveBuff {
    /// Which buff.
    pub buff: BuffId,
    /// Flags copied from the catalog entry when applied.
    pub flags: SmallVec<[BuffFlag; 2]>,
    /// Set once the start hook has run successfully.
    pub started: bool,
    /// Turn on which the buff lapses.
    pub expires: Option<TurnId>,
}

// ── Character ───────────────────────────────────────────────────

/// Stats, inventory and progress shared by actors and mobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Current room.
    pub room: RoomId,
    /// Zone of the current room.
    pub zone: String,
    /// Hit points. May go negative.
    pub health: i32,
    /// Maximum hit points.
    pub health_max: i32,
    /// Gold carried.
    pub gold: u64,
    /// Experience accumulated.
    pub experience: u64,
    /// Character level.
    pub level: u32,
    /// Action points available.
    pub action_points: u32,
    /// Action point ceiling.
    pub action_points_max: u32,
    /// Active buffs, in application order.
    pub buffs: Vec<ActiveBuff>,
    /// Quest progress.
    pub quests: QuestLog,
    /// Skill levels, by lower-cased name.
    pub skills: IndexMap<String, u32>,
    /// Carried items.
    pub backpack: Vec<Item>,
    /// Who this character is fighting.
    pub aggro: Option<Target>,
    /// The actor holding a charm over this character.
    pub charmed_by: Option<ActorId>,
    /// Damage dealt by each actor, for kill credit.
    pub player_damage: IndexMap<ActorId, u64>,
}

impl Character {
    /// A fresh level-one character standing in `room`.
    pub fn new(name: impl Into<String>, room: RoomId, zone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room,
            zone: zone.into(),
            health: 10,
            health_max: 10,
            gold: 0,
            experience: 0,
            level: 1,
            action_points: 0,
            action_points_max: 10,
            buffs: Vec::new(),
            quests: QuestLog::default(),
            skills: IndexMap::new(),
            backpack: Vec::new(),
            aggro: None,
            charmed_by: None,
            player_damage: IndexMap::new(),
        }
    }

    /// Apply a buff. A buff already held has its expiry refreshed.
    pub fn add_buff(&mut self, spec: &BuffSpec, now: TurnId) {
        let expires = spec.duration_turns.map(|d| TurnId(now.0 + d));
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.buff == spec.id) {
            existing.expires = expires;
            return;
        }
        self.buffs.push(ActiveBuff {
            buff: spec.id,
            flags: spec.flags.clone(),
            started: false,
            expires,
        });
    }

    /// Remove a buff. Returns whether it was held.
    pub fn remove_buff(&mut self, buff: BuffId) -> bool {
        let before = self.buffs.len();
        self.buffs.retain(|b| b.buff != buff);
        self.buffs.len() != before
    }

    /// Whether the buff is held.
    pub fn has_buff(&self, buff: BuffId) -> bool {
        self.buffs.iter().any(|b| b.buff == buff)
    }

    /// Whether any held buff confers `flag`.
    pub fn has_buff_flag(&self, flag: BuffFlag) -> bool {
        self.buffs.iter().any(|b| b.flags.contains(&flag))
    }

    /// Mark a buff's start hook as having run.
    pub fn track_buff_started(&mut self, buff: BuffId) {
        if let Some(b) = self.buffs.iter_mut().find(|b| b.buff == buff) {
            b.started = true;
        }
    }

    /// Remove and return every buff whose expiry turn has been reached.
    pub fn take_expired_buffs(&mut self, now: TurnId) -> Vec<BuffId> {
        let mut expired = Vec::new();
        self.buffs.retain(|b| match b.expires {
            Some(at) if at <= now => {
                expired.push(b.buff);
                false
            }
            _ => true,
        });
        expired
    }

    /// Remove every buff conferring `flag`, returning their ids.
    pub fn strip_buffs_with_flag(&mut self, flag: BuffFlag) -> Vec<BuffId> {
        let mut stripped = Vec::new();
        self.buffs.retain(|b| {
            if b.flags.contains(&flag) {
                stripped.push(b.buff);
                false
            } else {
                true
            }
        });
        stripped
    }

    /// Credit `actor` with `amount` damage.
    pub fn track_player_damage(&mut self, actor: ActorId, amount: u64) {
        *self.player_damage.entry(actor).or_insert(0) += amount;
    }

    /// Current level of a skill; zero when untrained.
    pub fn skill_level(&self, skill: &str) -> u32 {
        self.skills.get(skill).copied().unwrap_or(0)
    }

    /// Raise a skill to at least `level`, returning the resulting level.
    pub fn train_skill(&mut self, skill: &str, level: u32) -> u32 {
        let entry = self.skills.entry(skill.to_lowercase()).or_insert(0);
        if *entry < level {
            *entry = level;
        }
        *entry
    }

    /// Add experience.
    pub fn grant_xp(&mut self, amount: u64) {
        self.experience = self.experience.saturating_add(amount);
    }

    /// Put an item in the backpack.
    pub fn store_item(&mut self, item: Item) {
        self.backpack.push(item);
    }

    /// Gain one action point, capped at the maximum.
    pub fn regain_action_point(&mut self) {
        self.action_points = (self.action_points + 1).min(self.action_points_max);
    }
}

// ── Actor ───────────────────────────────────────────────────────

/// Privilege level of an actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Regular player.
    #[default]
    User,
    /// Administrator.
    Admin,
}

/// An interactive question sequence awaiting the actor's answers.
///
/// While a prompt has unanswered questions each input line is taken as
/// the next answer, and the originating command is re-issued so it can
/// read the answers back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingPrompt {
    /// Command word that opened the prompt.
    pub command: String,
    /// Arguments of the opening command.
    pub rest: String,
    /// Questions not yet answered.
    pub questions: VecDeque<String>,
    /// Answers so far, in question order.
    pub answers: Vec<String>,
}

impl PendingPrompt {
    /// The command line that re-enters the prompting command.
    pub fn command_line(&self) -> String {
        if self.rest.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.rest)
        }
    }
}

/// One line in an actor's event log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Category such as `conn` or `quest`.
    pub category: String,
    /// Free text.
    pub text: String,
}

/// A logged-in player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Actor id.
    pub id: ActorId,
    /// Session the actor is attached to.
    pub connection: ConnectionId,
    /// Privilege level.
    pub permission: Permission,
    /// The actor's character.
    pub character: Character,
    /// Deafened actors do not receive player communication.
    pub deafened: bool,
    /// Two-character shortcuts expanding to `;`-separated commands.
    pub macros: IndexMap<String, String>,
    /// Last turn on which the actor typed something non-blank.
    pub last_input_turn: TurnId,
    /// Turn on which the actor entered the world.
    pub online_since: TurnId,
    /// Open interactive prompt.
    pub prompt: Option<PendingPrompt>,
    /// Recent notable events, newest last.
    pub event_log: VecDeque<LogEntry>,
}

impl Actor {
    /// A new actor attached to `connection`.
    pub fn new(id: ActorId, connection: ConnectionId, character: Character) -> Self {
        Self {
            id,
            connection,
            permission: Permission::User,
            character,
            deafened: false,
            macros: IndexMap::new(),
            last_input_turn: TurnId(0),
            online_since: TurnId(0),
            prompt: None,
            event_log: VecDeque::new(),
        }
    }

    /// Short reference used in generated commands, e.g. `@12`.
    pub fn shorthand(&self) -> String {
        format!("@{}", self.id)
    }

    /// The status line redrawn after output.
    pub fn command_prompt(&self) -> String {
        let c = &self.character;
        format!(
            "[HP:{}/{} AP:{}/{}]: ",
            c.health, c.health_max, c.action_points, c.action_points_max
        )
    }

    /// Append to the event log, dropping the oldest entry when full.
    pub fn log_event(&mut self, category: impl Into<String>, text: impl Into<String>) {
        if self.event_log.len() == EVENT_LOG_CAPACITY {
            self.event_log.pop_front();
        }
        self.event_log.push_back(LogEntry {
            category: category.into(),
            text: text.into(),
        });
    }
}

// ── Mob ─────────────────────────────────────────────────────────

/// A live mob instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mob {
    /// Instance id.
    pub id: MobId,
    /// The mob's character.
    pub character: Character,
    /// Keeps the mob active even with no players nearby.
    pub prevent_idle: bool,
}

impl Mob {
    /// A new mob instance.
    pub fn new(id: MobId, character: Character) -> Self {
        Self {
            id,
            character,
            prevent_idle: false,
        }
    }

    /// Short reference used in generated commands, e.g. `#7`.
    pub fn shorthand(&self) -> String {
        format!("#{}", self.id)
    }
}

//! Quest tokens and the per-character quest log.
//!
//! A token names a quest and a step, written `<quest>-<step>`, e.g.
//! `12-start`. A leading `-` turns a grant into a revocation.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::catalog::QuestSpec;
use crate::id::QuestId;

/// A parsed `<quest>-<step>` token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QuestToken {
    /// The quest.
    pub quest: QuestId,
    /// The step name.
    pub step: String,
}

impl QuestToken {
    /// Build a token.
    pub fn new(quest: QuestId, step: impl Into<String>) -> Self {
        Self {
            quest,
            step: step.into(),
        }
    }
}

impl FromStr for QuestToken {
    type Err = ();

    /// A bare quest id means its `start` step.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (quest, step) = match s.split_once('-') {
            Some((q, step)) if !step.is_empty() => (q, step),
            Some(_) => return Err(()),
            None => (s, "start"),
        };
        let quest = quest.trim().parse::<u32>().map_err(|_| ())?;
        Ok(Self::new(QuestId(quest), step.trim()))
    }
}

impl fmt::Display for QuestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.quest, self.step)
    }
}

/// What a quest event asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenRequest {
    /// Grant the token.
    Grant(QuestToken),
    /// Clear the quest from the log.
    Revoke(QuestToken),
}

impl TokenRequest {
    /// Parse raw event text. Returns `None` for malformed tokens.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(rest) => rest.parse().ok().map(Self::Revoke),
            None => raw.parse().ok().map(Self::Grant),
        }
    }

    /// The token concerned.
    pub fn token(&self) -> &QuestToken {
        match self {
            Self::Grant(t) | Self::Revoke(t) => t,
        }
    }
}

/// Quests a character holds and the step each has reached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestLog {
    steps: IndexMap<QuestId, String>,
}

impl QuestLog {
    /// Record `token` if it is new or the next step of a quest in progress.
    ///
    /// Returns `false` and leaves the log unchanged for duplicate,
    /// out-of-order or unknown steps.
    pub fn give(&mut self, spec: &QuestSpec, token: &QuestToken) -> bool {
        let Some(wanted) = spec.step_index(&token.step) else {
            return false;
        };
        match self.steps.get(&token.quest) {
            None => {
                self.steps.insert(token.quest, token.step.clone());
                true
            }
            Some(current) => match spec.step_index(current) {
                Some(held) if wanted == held + 1 => {
                    self.steps.insert(token.quest, token.step.clone());
                    true
                }
                _ => false,
            },
        }
    }

    /// Forget a quest entirely. Returns whether it was held.
    pub fn clear(&mut self, quest: QuestId) -> bool {
        self.steps.shift_remove(&quest).is_some()
    }

    /// The step reached on `quest`.
    pub fn step(&self, quest: QuestId) -> Option<&str> {
        self.steps.get(&quest).map(String::as_str)
    }

    /// Whether the exact token is held.
    pub fn holds(&self, token: &QuestToken) -> bool {
        self.step(token.quest) == Some(token.step.as_str())
    }

    /// Number of quests in the log.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

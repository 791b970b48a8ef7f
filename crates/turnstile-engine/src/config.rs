//! Game configuration, validation and hot reload.
//!
//! [`GameConfig`] is deserialized from TOML with every field defaulted, so
//! an empty file is a valid configuration. [`validate()`](GameConfig::validate)
//! checks the invariants the scheduler depends on. The scheduler reads a
//! fresh snapshot from [`SharedConfig`] every loop iteration, and
//! [`ConfigWatcher`] swaps that snapshot when the backing file changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use turnstile_core::id::RoomId;

/// Longest turn period accepted.
pub const MAX_TURN_MS: u64 = 60_000;

// ── PvpPolicy ───────────────────────────────────────────────────

/// Whether players may harm one another.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PvpPolicy {
    /// Players can hurt each other anywhere.
    Enabled,
    /// Players never hurt each other.
    #[default]
    Disabled,
    /// Only in designated areas. Area effects treat this as disabled.
    Limited,
}

impl PvpPolicy {
    /// Whether an area effect started by one player may hit another.
    pub fn allows_area_damage(self) -> bool {
        self == Self::Enabled
    }
}

// ── GameConfig ──────────────────────────────────────────────────

/// Tunables read by the scheduler and turn processor.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Milliseconds per turn. Default: 100.
    pub turn_ms: u64,
    /// Seconds per round. Default: 4.
    pub round_seconds: u64,
    /// Minutes between autosaves. Default: 5.
    pub autosave_minutes: u64,
    /// Seconds a zombie lingers before being logged out. Default: 60.
    pub zombie_seconds: u64,
    /// Player-versus-player policy. Default: disabled.
    pub pvp: PvpPolicy,
    /// Commands run for every actor entering the world.
    pub on_login_commands: Vec<String>,
    /// Fallback room for actors whose room no longer exists. Default: 1.
    pub home_room: RoomId,
    /// Zone of the fallback room. Default: `Frostfang`.
    pub home_zone: String,
    /// Telnet listener ports, reported in statistics.
    pub telnet_ports: Vec<u16>,
    /// Web listener port, reported in statistics. Default: 80.
    pub web_port: u16,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_ms: 100,
            round_seconds: 4,
            autosave_minutes: 5,
            zombie_seconds: 60,
            pvp: PvpPolicy::Disabled,
            on_login_commands: Vec::new(),
            home_room: RoomId(1),
            home_zone: "Frostfang".to_string(),
            telnet_ports: vec![33333],
            web_port: 80,
        }
    }
}

impl GameConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_ms == 0 {
            return Err(ConfigError::TurnMsZero);
        }
        if self.turn_ms > MAX_TURN_MS {
            return Err(ConfigError::TurnMsTooLarge {
                value: self.turn_ms,
            });
        }
        if self.round_seconds == 0 {
            return Err(ConfigError::RoundSecondsZero);
        }
        if self.autosave_minutes == 0 {
            return Err(ConfigError::AutosaveMinutesZero);
        }
        Ok(())
    }

    /// Wall-clock length of one turn.
    pub fn turn_period(&self) -> Duration {
        Duration::from_millis(self.turn_ms.max(1))
    }

    /// Turns per second, at least 1.
    pub fn turns_per_second(&self) -> u64 {
        (1000 / self.turn_ms.max(1)).max(1)
    }

    /// Turns per round, at least 1.
    pub fn turns_per_round(&self) -> u64 {
        self.round_seconds
            .saturating_mul(self.turns_per_second())
            .max(1)
    }

    /// Turns between autosaves, at least 1.
    pub fn turns_per_autosave(&self) -> u64 {
        self.autosave_minutes
            .saturating_mul(60)
            .saturating_mul(self.turns_per_second())
            .max(1)
    }

    /// Convert seconds to turns, saturating at `u64::MAX`.
    pub fn seconds_to_turns(&self, seconds: u64) -> u64 {
        seconds.saturating_mul(self.turns_per_second())
    }

    /// Turns a zombie may linger.
    pub fn zombie_turns(&self) -> u64 {
        self.seconds_to_turns(self.zombie_seconds)
    }
}

// ── ConfigError ─────────────────────────────────────────────────

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `turn_ms` is zero.
    #[error("turn_ms must be at least 1")]
    TurnMsZero,
    /// `turn_ms` exceeds [`MAX_TURN_MS`].
    #[error("turn_ms {value} exceeds the 60000 ms limit")]
    TurnMsTooLarge {
        /// The configured value.
        value: u64,
    },
    /// `round_seconds` is zero.
    #[error("round_seconds must be at least 1")]
    RoundSecondsZero,
    /// `autosave_minutes` is zero.
    #[error("autosave_minutes must be at least 1")]
    AutosaveMinutesZero,
    /// The file could not be read.
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`GameConfig`].
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A background thread could not be spawned.
    #[error("spawning {name} thread: {reason}")]
    ThreadSpawnFailed {
        /// Which thread.
        name: &'static str,
        /// OS error text.
        reason: String,
    },
}

// ── SharedConfig ────────────────────────────────────────────────

/// A cheaply cloneable handle to the live configuration.
///
/// Readers get an immutable snapshot; a reload swaps the whole snapshot so
/// a reader never sees a half-updated configuration.
#[derive(Clone, Debug)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<GameConfig>>>,
}

impl SharedConfig {
    /// Wrap a configuration. Does not validate.
    pub fn new(config: GameConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The current snapshot.
    pub fn current(&self) -> Arc<GameConfig> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Validate and install a new configuration.
    pub fn replace(&self, config: GameConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(config);
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

// ── ConfigWatcher ───────────────────────────────────────────────

/// Reloads a [`SharedConfig`] from disk when its file changes.
#[derive(Debug)]
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    shared: SharedConfig,
}

impl ConfigWatcher {
    /// Load `path` into a new shared configuration and watch it.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, SharedConfig), ConfigError> {
        let path = path.into();
        let config = GameConfig::load(&path)?;
        let last_modified = modified(&path);
        let shared = SharedConfig::new(config);
        let watcher = Self {
            path,
            last_modified,
            shared: shared.clone(),
        };
        Ok((watcher, shared))
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload if the file's modification time changed.
    ///
    /// Returns `Ok(true)` when a new configuration was installed. A file
    /// that fails to parse or validate leaves the previous configuration
    /// in force and is not retried until it changes again.
    pub fn poll(&mut self) -> Result<bool, ConfigError> {
        let now = modified(&self.path);
        if now.is_none() || now == self.last_modified {
            return Ok(false);
        }
        self.last_modified = now;
        let config = GameConfig::load(&self.path)?;
        self.shared.replace(config)?;
        info!(path = %self.path.display(), "configuration reloaded");
        Ok(true)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

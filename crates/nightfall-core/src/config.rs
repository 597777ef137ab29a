//! Configuration loading, typed config structures, and validation.
//!
//! The canonical configuration lives in `nightfall-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and [`GameConfig::validate`], which rejects
//! unplayable setups before any game state exists.

use std::path::Path;
use std::time::Duration;

use nightfall_types::Role;
use serde::Deserialize;

/// Smallest supported table.
pub const MIN_PLAYERS: u32 = 5;
/// Largest supported table.
pub const MAX_PLAYERS: u32 = 12;
/// Largest accepted round limit.
pub const MAX_ROUND_LIMIT: u32 = 100;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Role counts do not add up to the player count.
    #[error("role counts sum to {actual} but total_players is {expected}")]
    RoleCountMismatch {
        /// Configured `total_players`.
        expected: u32,
        /// Sum of all role counts.
        actual: u32,
    },

    /// A role every game needs is absent.
    #[error("at least one {role} is required")]
    MissingRole {
        /// The missing role.
        role: Role,
    },

    /// Too many werewolves for the table.
    #[error("unbalanced factions: {werewolves} werewolves against {villagers} plain villagers")]
    UnbalancedFactions {
        /// Configured werewolves.
        werewolves: u32,
        /// Configured plain villagers.
        villagers: u32,
    },

    /// `total_players` is outside the supported range.
    #[error("total_players must be between {MIN_PLAYERS} and {MAX_PLAYERS}, got {total}")]
    PlayerCountOutOfRange {
        /// Configured `total_players`.
        total: u32,
    },

    /// `max_rounds` is outside the supported range.
    #[error("max_rounds must be between 1 and {MAX_ROUND_LIMIT}, got {max_rounds}")]
    InvalidMaxRounds {
        /// Configured `max_rounds`.
        max_rounds: u32,
    },

    /// A decision timeout is zero.
    #[error("{phase} timeout must be greater than zero")]
    ZeroTimeout {
        /// Which timeout.
        phase: &'static str,
    },

    /// A supplied participant list disagrees with the role counts.
    #[error("{supplied} participants have role {role} but the configuration expects {configured}")]
    ParticipantMismatch {
        /// The role whose count differs.
        role: Role,
        /// Count in the configuration.
        configured: u32,
        /// Count in the supplied list.
        supplied: u32,
    },

    /// A supplied participant list repeats a seat.
    #[error("participant seat {seat} appears more than once")]
    DuplicateParticipant {
        /// The repeated seat number.
        seat: u32,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level game configuration.
///
/// Mirrors the structure of `nightfall-config.yaml`. All fields have
/// defaults describing the classic seven-seat table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Table-level settings (name, seed, player count, round limit).
    #[serde(default)]
    pub game: TableConfig,

    /// Number of participants per role.
    #[serde(default)]
    pub roles: RolesConfig,

    /// Per-phase decision deadlines.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Rule variants.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `NIGHTFALL_SEED` overrides `game.seed` when set to a valid integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.game.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check that the configuration describes a playable game.
    ///
    /// # Errors
    ///
    /// Returns the first rule the configuration breaks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.game.total_players;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&total) {
            return Err(ConfigError::PlayerCountOutOfRange { total });
        }

        let actual = self.roles.total();
        if actual != total {
            return Err(ConfigError::RoleCountMismatch {
                expected: total,
                actual,
            });
        }

        for role in [Role::Werewolf, Role::Villager] {
            if self.roles.count(role) == 0 {
                return Err(ConfigError::MissingRole { role });
            }
        }

        let werewolves = self.roles.werewolf;
        let villagers = self.roles.villager;
        if werewolves > villagers || werewolves.saturating_mul(2) > total {
            return Err(ConfigError::UnbalancedFactions {
                werewolves,
                villagers,
            });
        }

        if let Some(max_rounds) = self.game.max_rounds {
            if !(1..=MAX_ROUND_LIMIT).contains(&max_rounds) {
                return Err(ConfigError::InvalidMaxRounds { max_rounds });
            }
        }

        self.timing.validate()
    }
}

/// Table-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableConfig {
    /// Human-readable game name.
    #[serde(default = "default_game_name")]
    pub name: String,

    /// Seed for seating and any seeded decision source.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of participants.
    #[serde(default = "default_total_players")]
    pub total_players: u32,

    /// Optional round limit; the game is a draw once it is exceeded.
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

impl TableConfig {
    fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var("NIGHTFALL_SEED")
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_game_name(),
            seed: default_seed(),
            total_players: default_total_players(),
            max_rounds: None,
        }
    }
}

/// Participants per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RolesConfig {
    /// Plain villagers.
    #[serde(default = "default_villagers")]
    pub villager: u32,
    /// Werewolves.
    #[serde(default = "default_werewolves")]
    pub werewolf: u32,
    /// Seers.
    #[serde(default = "default_one")]
    pub seer: u32,
    /// Witches.
    #[serde(default = "default_one")]
    pub witch: u32,
}

impl RolesConfig {
    /// Configured count for a role.
    pub const fn count(&self, role: Role) -> u32 {
        match role {
            Role::Villager => self.villager,
            Role::Werewolf => self.werewolf,
            Role::Seer => self.seer,
            Role::Witch => self.witch,
        }
    }

    /// Sum of all role counts.
    pub fn total(&self) -> u32 {
        Role::ALL
            .iter()
            .fold(0_u32, |acc, role| acc.saturating_add(self.count(*role)))
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            villager: default_villagers(),
            werewolf: default_werewolves(),
            seer: default_one(),
            witch: default_one(),
        }
    }
}

/// Decision deadlines, one per kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Milliseconds a night actor has to submit an intent.
    #[serde(default = "default_timeout_ms")]
    pub night_action_timeout_ms: u64,

    /// Milliseconds a speaker has to produce a speech.
    #[serde(default = "default_timeout_ms")]
    pub speech_timeout_ms: u64,

    /// Milliseconds a voter has to cast a ballot.
    #[serde(default = "default_timeout_ms")]
    pub vote_timeout_ms: u64,
}

impl TimingConfig {
    /// Deadline for night intents.
    pub const fn night_action_timeout(&self) -> Duration {
        Duration::from_millis(self.night_action_timeout_ms)
    }

    /// Deadline for speeches.
    pub const fn speech_timeout(&self) -> Duration {
        Duration::from_millis(self.speech_timeout_ms)
    }

    /// Deadline for ballots.
    pub const fn vote_timeout(&self) -> Duration {
        Duration::from_millis(self.vote_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("night action", self.night_action_timeout_ms),
            ("speech", self.speech_timeout_ms),
            ("vote", self.vote_timeout_ms),
        ];
        match checks.iter().find(|(_, ms)| *ms == 0) {
            Some((phase, _)) => Err(ConfigError::ZeroTimeout { phase: *phase }),
            None => Ok(()),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            night_action_timeout_ms: default_timeout_ms(),
            speech_timeout_ms: default_timeout_ms(),
            vote_timeout_ms: default_timeout_ms(),
        }
    }
}

/// Rule variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Whether the witch may use the antidote on herself.
    #[serde(default)]
    pub witch_self_save: bool,

    /// Whether a dead participant's role becomes public.
    #[serde(default = "default_true")]
    pub reveal_roles_on_death: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            witch_self_save: false,
            reveal_roles_on_death: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_game_name() -> String {
    String::from("Ravenhollow")
}

const fn default_seed() -> u64 {
    42
}

const fn default_total_players() -> u32 {
    7
}

const fn default_villagers() -> u32 {
    3
}

const fn default_werewolves() -> u32 {
    2
}

const fn default_one() -> u32 {
    1
}

const fn default_timeout_ms() -> u64 {
    5000
}

const fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

//! Server configuration loaded from TOML.

use crate::error::{ArenaError, ArenaErrorKind};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GOMOKU_ARENA_CONFIG";

/// Shortest run length accepted as a win condition.
pub const MIN_WIN_CONDITION: usize = 3;

/// Limits and defaults for new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct RuleLimits {
    /// Board size when the creator does not pick one.
    #[serde(default = "default_board_size")]
    default_board_size: usize,

    /// Win condition when the creator does not pick one.
    #[serde(default = "default_win_condition")]
    default_win_condition: usize,

    /// Smallest board accepted.
    #[serde(default = "default_min_board_size")]
    min_board_size: usize,

    /// Largest board accepted.
    #[serde(default = "default_max_board_size")]
    max_board_size: usize,
}

fn default_board_size() -> usize {
    15
}

fn default_win_condition() -> usize {
    5
}

fn default_min_board_size() -> usize {
    5
}

fn default_max_board_size() -> usize {
    25
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self {
            default_board_size: default_board_size(),
            default_win_condition: default_win_condition(),
            min_board_size: default_min_board_size(),
            max_board_size: default_max_board_size(),
        }
    }
}

impl RuleLimits {
    /// Resolves requested parameters against the defaults and checks them.
    ///
    /// Returns `(board_size, win_condition)`.
    ///
    /// # Errors
    ///
    /// [`ArenaErrorKind::InvalidBoardSize`] or
    /// [`ArenaErrorKind::InvalidWinCondition`].
    #[instrument(skip(self))]
    pub fn resolve(
        &self,
        board_size: Option<usize>,
        win_condition: Option<usize>,
    ) -> Result<(usize, usize), ArenaError> {
        let size = board_size.unwrap_or(self.default_board_size);
        if size < self.min_board_size || size > self.max_board_size {
            return Err(ArenaError::new(ArenaErrorKind::InvalidBoardSize {
                size,
                min: self.min_board_size,
                max: self.max_board_size,
            }));
        }
        let win = win_condition.unwrap_or(self.default_win_condition.min(size));
        if win < MIN_WIN_CONDITION || win > size {
            return Err(ArenaError::new(ArenaErrorKind::InvalidWinCondition {
                win_condition: win,
                board_size: size,
            }));
        }
        Ok((size, win))
    }
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ArenaConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path. In-memory ledger and store when absent.
    #[serde(default)]
    database_url: Option<String>,

    /// Balance granted to accounts opened through the API.
    #[serde(default = "default_starting_balance")]
    starting_balance: i64,

    /// Sessions idle longer than this are reported stale.
    #[serde(default = "default_liveness_window_secs")]
    liveness_window_secs: u64,

    /// Session parameter limits.
    #[serde(default)]
    rules: RuleLimits,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_starting_balance() -> i64 {
    1000
}

#[instrument]
fn default_liveness_window_secs() -> u64 {
    3600
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            starting_balance: default_starting_balance(),
            liveness_window_secs: default_liveness_window_secs(),
            rules: RuleLimits::default(),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads from `path`, else from [`CONFIG_ENV`], else defaults.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => {
                debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// The liveness window as a duration.
    pub fn liveness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.liveness_window_secs).unwrap_or(i64::MAX))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.rules;
        if rules.min_board_size > rules.max_board_size {
            return Err(ConfigError::new(format!(
                "min_board_size {} exceeds max_board_size {}",
                rules.min_board_size, rules.max_board_size
            )));
        }
        if rules.min_board_size < MIN_WIN_CONDITION {
            return Err(ConfigError::new(format!(
                "min_board_size must be at least {}",
                MIN_WIN_CONDITION
            )));
        }
        if let Err(e) = rules.resolve(None, None) {
            return Err(ConfigError::new(format!("Invalid rule defaults: {}", e.kind)));
        }
        if self.starting_balance < 0 {
            return Err(ConfigError::new("starting_balance must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

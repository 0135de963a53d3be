//! Server configuration: an optional JSON file plus `DASHRUN_*` overrides.

use std::path::Path;
use std::str::FromStr;

use dashrun_room::RoomConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "DASHRUN_";

/// Top-level configuration.
///
/// Every field has a default, so an empty JSON object is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `path` (if given) and applies overrides from the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Applies `DASHRUN_*` variables from `vars`. Other variables and
    /// unrecognized `DASHRUN_*` names are ignored.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `DASHRUN_LOG` | `log_filter` |
    /// | `DASHRUN_GAME_TYPES` | `room.game_types` (comma separated) |
    /// | `DASHRUN_PLAYERS_PER_MATCH` | `room.players_per_match` |
    /// | `DASHRUN_COUNTDOWN_SECONDS` | `room.countdown_seconds` |
    /// | `DASHRUN_TICK_RATE` | `room.tick_rate` |
    /// | `DASHRUN_FINISH_DISTANCE` | `room.finish_distance` |
    /// | `DASHRUN_BOTS_ENABLED` | `room.bots.enabled` |
    /// | `DASHRUN_BOT_FILL_TIMEOUT_MS` | `room.bots.fill_timeout_ms` |
    /// | `DASHRUN_OBSTACLE_COUNT` | `room.obstacles.count` |
    /// | `DASHRUN_TESTING` | `room.testing.enabled` |
    /// | `DASHRUN_NO_OBSTACLES` | `room.testing.no_obstacles` |
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            let room = &mut self.room;
            match name {
                "LOG" => self.log_filter = value.to_string(),
                "GAME_TYPES" => {
                    room.game_types = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "PLAYERS_PER_MATCH" => room.players_per_match = parse(key, value)?,
                "COUNTDOWN_SECONDS" => room.countdown_seconds = parse(key, value)?,
                "TICK_RATE" => room.tick_rate = parse(key, value)?,
                "FINISH_DISTANCE" => room.finish_distance = parse(key, value)?,
                "BOTS_ENABLED" => room.bots.enabled = parse_flag(key, value)?,
                "BOT_FILL_TIMEOUT_MS" => room.bots.fill_timeout_ms = parse(key, value)?,
                "OBSTACLE_COUNT" => room.obstacles.count = parse(key, value)?,
                "TESTING" => room.testing.enabled = parse_flag(key, value)?,
                "NO_OBSTACLES" => room.testing.no_obstacles = parse_flag(key, value)?,
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    }
}

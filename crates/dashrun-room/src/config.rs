//! Room configuration and the race phase state machine.

use std::fmt;
use std::time::Duration;

use dashrun_rules::{BotParams, GameStats, ObstacleSettings, PhysicsParams, SpiritAttributes};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Everything a race room and the matchmaker need to know.
///
/// Shared read-only between the matchmaker and every room it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Game types players may queue for.
    pub game_types: Vec<String>,

    /// Participants per race, humans and bots together.
    pub players_per_match: usize,

    /// First number broadcast by the countdown.
    pub countdown_seconds: u32,

    /// Simulation rate in Hz.
    pub tick_rate: u32,

    /// Distance at which the race ends.
    pub finish_distance: f64,

    /// Stats a human starts with.
    pub default_stats: GameStats,

    /// Size of each room actor's command queue.
    pub command_buffer: usize,

    pub physics: PhysicsParams,
    pub obstacles: ObstacleSettings,
    pub bots: BotParams,
    pub testing: TestingOverrides,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            game_types: vec![RoomConfig::DEFAULT_GAME_TYPE.to_string()],
            players_per_match: 3,
            countdown_seconds: 3,
            tick_rate: 30,
            finish_distance: 3000.0,
            default_stats: GameStats::new(10.0, 10.0),
            command_buffer: 64,
            physics: PhysicsParams::default(),
            obstacles: ObstacleSettings::default(),
            bots: BotParams::default(),
            testing: TestingOverrides::default(),
        }
    }
}

impl RoomConfig {
    pub const DEFAULT_GAME_TYPE: &'static str = "flow-run";

    /// Whether players may queue for `game_type`.
    pub fn knows_game_type(&self, game_type: &str) -> bool {
        self.game_types.iter().any(|g| g == game_type)
    }

    /// Stats a freshly matched human starts with.
    ///
    /// Testing overrides win, then stats derived from the player's spirit,
    /// then the defaults.
    pub fn starting_stats(&self, spirit: Option<&SpiritAttributes>) -> GameStats {
        if self.testing.enabled {
            return self.testing.stats;
        }
        match spirit {
            Some(attrs) => attrs.to_game_stats(&self.physics.stat_bounds),
            None => self.default_stats,
        }
    }

    /// Whether the course should be generated empty.
    pub fn no_obstacles(&self) -> bool {
        self.testing.no_obstacles
    }

    pub fn bot_fill_timeout(&self) -> Duration {
        Duration::from_millis(self.bots.fill_timeout_ms)
    }
}

/// Knobs for manual play-testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingOverrides {
    /// When set, humans start with `stats` instead of the default stats.
    pub enabled: bool,
    pub stats: GameStats,
    /// Generate an empty course.
    pub no_obstacles: bool,
}

impl Default for TestingOverrides {
    fn default() -> Self {
        Self {
            enabled: false,
            stats: GameStats::new(10.0, 10.0),
            no_obstacles: false,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a race room.
///
/// Transitions are strictly forward:
///
/// ```text
/// Countdown → Playing → Finished
/// ```
///
/// A rematch is a new room, never a transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Countdown,
    Playing,
    Finished,
}

impl MatchPhase {
    /// The following phase, or `None` once finished.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Countdown => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Countdown => write!(f, "countdown"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

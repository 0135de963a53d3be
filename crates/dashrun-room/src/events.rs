//! Inbound and outbound wire events.
//!
//! Both directions use the same JSON frame: `{"event": "<kebab-name>",
//! "data": <payload>}`. Payload fields are camelCase.

use std::fmt;

use dashrun_protocol::{Channel, ParticipantId, PlayerId, RoomId};
use dashrun_rules::{
    GameStats, ObstacleSettings, Placement, Reward, Seed, StatsDescription, StatsPatch,
};
use serde::{Deserialize, Serialize};

/// Name of a queue, e.g. `"flow-run"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameType(pub String);

impl GameType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputAction {
    Jump,
}

/// Older clients steer with a direction instead of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

/// Payload of `player-input`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInput {
    pub action: Option<InputAction>,
    pub direction: Option<Direction>,
}

impl PlayerInput {
    pub fn jump() -> Self {
        Self {
            action: Some(InputAction::Jump),
            direction: None,
        }
    }

    /// `action: jump` or the legacy `direction: up`.
    pub fn wants_jump(&self) -> bool {
        self.action == Some(InputAction::Jump) || self.direction == Some(Direction::Up)
    }
}

/// Payload of `set-participant-stats`. No target means the sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticipantStatsPatch {
    pub target_id: Option<ParticipantId>,
    #[serde(flatten)]
    pub patch: StatsPatch,
}

/// Everything a connected player can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinQueue(GameType),
    LeaveQueue,
    PlayerInput(PlayerInput),
    PlayerReady,
    #[serde(alias = "debug:set-stats")]
    SetStats(StatsPatch),
    SetParticipantStats(ParticipantStatsPatch),
    #[serde(alias = "debug:get-participants")]
    GetParticipants,
    GetStatsInfo,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// A human in the `match-found` roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: PlayerId,
    pub spirit_id: String,
}

/// A participant as announced in `game-start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartingParticipant {
    pub id: ParticipantId,
    pub spirit_id: String,
    pub y: f64,
    pub stats: GameStats,
    pub is_bot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One participant in a `game-state` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub y: f64,
    /// Floored.
    pub distance: u64,
    pub is_alive: bool,
    pub is_jumping: bool,
    pub is_bot: bool,
}

/// One row of the `participants` report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStats {
    pub id: ParticipantId,
    pub spirit_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_bot: bool,
    pub stats: GameStats,
    pub calculated_speed: f64,
    pub jump_speed_multiplier: f64,
}

/// Payload of `participants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsReport {
    pub players: Vec<ParticipantStats>,
    pub bots: Vec<ParticipantStats>,
    pub stats_info: StatsDescription,
}

/// Everything the engine sends to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    QueueStatus {
        position: usize,
        players_in_queue: usize,
        players_needed: usize,
    },
    QueueLeft,
    MatchFound {
        room_id: RoomId,
        game_type: GameType,
        my_player_id: PlayerId,
        players: Vec<RosterEntry>,
        bots_count: usize,
    },
    GameCountdown {
        count: u32,
    },
    GameStart {
        seed: Seed,
        players: Vec<StartingParticipant>,
        finish_distance: f64,
        no_obstacles: bool,
        obstacle_settings: ObstacleSettings,
    },
    GameState {
        game_time: f64,
        players: Vec<ParticipantSnapshot>,
    },
    PlayerEliminated {
        player_id: ParticipantId,
        distance: u64,
        is_bot: bool,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    GameEnd {
        results: Vec<Placement>,
        rewards: Vec<Reward>,
    },
    StatsUpdated {
        target_id: ParticipantId,
        stats: GameStats,
    },
    StatsError {
        message: String,
    },
    Participants(ParticipantsReport),
    ParticipantsError {
        message: String,
    },
    StatsInfo(StatsDescription),
    Error {
        code: u16,
        message: String,
    },
}

impl ServerEvent {
    /// Delivery guarantee the connection layer should use.
    ///
    /// Snapshots are superseded every tick and may be dropped; everything
    /// else must arrive, in order.
    pub fn channel(&self) -> Channel {
        match self {
            Self::GameState { .. } => Channel::Unreliable,
            _ => Channel::ReliableOrdered,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}

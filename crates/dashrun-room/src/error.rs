//! Error types for rooms and matchmaking.

use dashrun_protocol::{ParticipantId, PlayerId, RoomId};
use dashrun_rules::StatsError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The player has no room.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// No participant with this id races in the room.
    #[error("participant {0} not found in room {1}")]
    UnknownParticipant(ParticipantId, RoomId),

    /// A stat change was rejected; nothing changed.
    #[error(transparent)]
    InvalidStats(#[from] StatsError),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

/// Errors returned by the matchmaker.
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("player {0} is already in the queue")]
    AlreadyQueued(PlayerId),

    #[error("player {0} is already in a match")]
    AlreadyInMatch(PlayerId),

    #[error("unknown game type: {0}")]
    UnknownGameType(String),
}

//! Unified error type for the Dashrun engine.

use std::path::PathBuf;

use dashrun_protocol::{PlayerId, ProtocolError};
use dashrun_room::{MatchmakingError, RoomError};
use dashrun_rules::StatsError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DashrunError {
    /// Encoding or decoding a frame failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A stat value was out of range.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// A room-level error (not in a room, unknown target, stopped).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A queueing error (already queued, already in a match, unknown type).
    #[error(transparent)]
    Matchmaking(#[from] MatchmakingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl DashrunError {
    /// Code sent to the client in an `error` event.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Protocol(_) | Self::Stats(_) => 400,
            Self::Auth(_) => 401,
            Self::Room(RoomError::InvalidStats(_)) => 400,
            Self::Room(_) => 404,
            Self::Matchmaking(MatchmakingError::UnknownGameType(_)) => 400,
            Self::Matchmaking(_) => 409,
            Self::Config(_) => 500,
        }
    }
}

/// Errors raised while loading [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidOverride { key: String, value: String },
}

/// Errors raised while admitting a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("authentication rejected: {0}")]
    Rejected(String),

    #[error("player {0} is already connected")]
    AlreadyConnected(PlayerId),

    #[error("player {0} is not connected")]
    NotConnected(PlayerId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let dashrun_err: DashrunError = err.into();
        assert!(matches!(dashrun_err, DashrunError::Protocol(_)));
        assert_eq!(dashrun_err.status_code(), 400);
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotInRoom(PlayerId(1));
        let dashrun_err: DashrunError = err.into();
        assert!(matches!(dashrun_err, DashrunError::Room(_)));
        assert_eq!(dashrun_err.status_code(), 404);
    }

    #[test]
    fn test_matchmaking_codes() {
        let queued: DashrunError = MatchmakingError::AlreadyQueued(PlayerId(1)).into();
        assert_eq!(queued.status_code(), 409);

        let unknown: DashrunError = MatchmakingError::UnknownGameType("chess".into()).into();
        assert_eq!(unknown.status_code(), 400);
        assert!(unknown.to_string().contains("chess"));
    }

    #[test]
    fn test_auth_error_is_unauthorized() {
        let err: DashrunError = AuthError::MissingField("sessionId").into();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.to_string(), "missing sessionId");
    }
}

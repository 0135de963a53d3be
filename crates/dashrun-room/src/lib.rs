//! Race rooms and matchmaking for Dashrun.
//!
//! Each race runs as an isolated Tokio task (actor model) that owns its
//! [`GameRoom`], its countdown and its tick loop. The [`Matchmaker`] is the
//! only shared state: queue, bot-fill timers and the room directory behind
//! one lock.
//!
//! # Key types
//!
//! - [`Matchmaker`]: queues players, fills with bots, creates rooms
//! - [`GameRoom`]: one race from countdown to results, plain synchronous state
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`MatchPhase`]: lifecycle state machine
//! - [`ClientEvent`] / [`ServerEvent`]: the wire vocabulary
//! - [`RoomConfig`]: every tunable, deserializable with defaults

mod config;
mod error;
mod events;
mod game;
mod matchmaking;
mod participant;
mod room;

pub use config::{MatchPhase, RoomConfig, TestingOverrides};
pub use error::{MatchmakingError, RoomError};
pub use events::{
    ClientEvent, Direction, GameType, InputAction, ParticipantSnapshot, ParticipantStats,
    ParticipantStatsPatch, ParticipantsReport, PlayerInput, RosterEntry, ServerEvent,
    StartingParticipant,
};
pub use game::{Entrant, GameRoom, Outbox, Standings};
pub use matchmaking::{Contestant, Matchmaker, QueueStatus};
pub use participant::{Controller, Participant};
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomNotice, spawn_room};

//! Identity and routing types that travel on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a human player.
///
/// Supplied by the connection layer after authentication; the engine never
/// invents player ids. Serialized as a plain number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for an AI-controlled participant.
///
/// Allocated by the room layer when a match is filled with bots. Kept in a
/// separate id space from [`PlayerId`] so a bot can never shadow a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotId(pub u64);

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B-{}", self.0)
    }
}

/// Anyone who occupies a lane in a race: a human player or a bot.
///
/// Externally tagged on the wire, so `Player(PlayerId(7))` is
/// `{"player":7}` and `Bot(BotId(3))` is `{"bot":3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantId {
    Player(PlayerId),
    Bot(BotId),
}

impl ParticipantId {
    /// Returns the player id if this participant is human.
    pub fn as_player(&self) -> Option<PlayerId> {
        match self {
            Self::Player(pid) => Some(*pid),
            Self::Bot(_) => None,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot(_))
    }
}

impl From<PlayerId> for ParticipantId {
    fn from(pid: PlayerId) -> Self {
        Self::Player(pid)
    }
}

impl From<BotId> for ParticipantId {
    fn from(bid: BotId) -> Self {
        Self::Bot(bid)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(pid) => pid.fmt(f),
            Self::Bot(bid) => bid.fmt(f),
        }
    }
}

/// A unique identifier for a room (one race session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room operations return `(Recipient, event)` pairs; the room actor resolves
/// them against its current connections. Bots have no connection, so only
/// players can be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player still connected to the room.
    All,

    /// Everyone except the given player.
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is addressed by this recipient.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::AllExcept(excluded) => *excluded != player,
        }
    }
}

// ---------------------------------------------------------------------------
// Channel: delivery guarantees
// ---------------------------------------------------------------------------

/// The delivery guarantee the connection layer should use for a message.
///
/// Per-tick state snapshots can afford loss (the next one supersedes them);
/// lifecycle events such as eliminations and final standings cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum Channel {
    /// Delivered in order, no loss.
    #[default]
    ReliableOrdered,

    /// Delivered, possibly out of order.
    ReliableUnordered,

    /// May be lost or reordered.
    Unreliable,
}

// =========================================================================
// Tests
// =========================================================================

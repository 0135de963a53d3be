//! Wire-level vocabulary shared by every Dashrun crate.
//!
//! This crate defines:
//!
//! - **Identity types** ([`PlayerId`], [`BotId`], [`ParticipantId`], [`RoomId`])
//!   used by matchmaking, rooms, and the outbound event stream.
//! - **Routing** ([`Recipient`], [`Channel`]): who gets a message and with
//!   which delivery guarantee.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rooms or physics. The game-specific
//! event enums live in `dashrun-room`; this crate only supplies the pieces
//! they are built from.
//!
//! ```text
//! Connection layer (bytes) → Protocol (Codec) → Engine → Matchmaker / GameRoom
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{BotId, Channel, ParticipantId, PlayerId, Recipient, RoomId};

//! # Dashrun
//!
//! Real-time matchmaking and authoritative simulation for short running
//! races.
//!
//! Players queue for a game type, get matched (topped up with bots after a
//! timeout), count down, and race over a seeded obstacle course simulated
//! at a fixed tick rate. The furthest runner wins; humans receive reward
//! intents.
//!
//! The [`Engine`] is the only entry point a connection layer needs:
//!
//! ```rust,ignore
//! use dashrun::prelude::*;
//!
//! let config = ServerConfig::load(None)?;
//! dashrun::logging::init(&config.log_filter)?;
//!
//! let engine = Engine::builder()
//!     .room_config(config.room)
//!     .build(HandshakeAuthenticator);
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! engine.connect(PlayerId(1), Credentials::new("session", "spirit"), tx).await?;
//! engine.handle_bytes(PlayerId(1), br#"{"event":"join-queue","data":"flow-run"}"#).await?;
//! ```

mod auth;
mod config;
mod engine;
mod error;
mod handler;
pub mod logging;

pub use auth::{Authenticator, Credentials, HandshakeAuthenticator};
pub use config::{ENV_PREFIX, ServerConfig};
pub use engine::{Engine, EngineBuilder};
pub use error::{AuthError, ConfigError, DashrunError};

pub use dashrun_protocol as protocol;
pub use dashrun_room as room;
pub use dashrun_rules as rules;

pub mod prelude {
    pub use crate::{
        Authenticator, Credentials, DashrunError, Engine, HandshakeAuthenticator, ServerConfig,
    };
    pub use dashrun_protocol::{BotId, ParticipantId, PlayerId, RoomId};
    pub use dashrun_room::{ClientEvent, GameType, PlayerInput, RoomConfig, ServerEvent};
}

//! `Engine` builder and connection contract.
//!
//! The engine is what a connection layer talks to. It ties together the
//! layers below it: protocol (codec) → auth → matchmaker → room actors.
//! It owns no sockets: the connection layer hands it decoded bytes and an
//! outbound channel per player.

use std::collections::HashMap;
use std::sync::Arc;

use dashrun_protocol::{Codec, JsonCodec, PlayerId};
use dashrun_room::{ClientEvent, Matchmaker, PlayerSender, RoomConfig, RoomNotice, ServerEvent};
use tokio::sync::{Mutex, mpsc};

use crate::handler::{dispatch, send_error};
use crate::{AuthError, Authenticator, Credentials, DashrunError, HandshakeAuthenticator};

/// A connected, authenticated player.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) credentials: Credentials,
    pub(crate) sender: PlayerSender,
}

/// Shared engine state.
pub(crate) struct EngineState<A: Authenticator, C: Codec> {
    pub(crate) sessions: Mutex<HashMap<PlayerId, Session>>,
    pub(crate) matchmaker: Matchmaker,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for an [`Engine`].
///
/// # Example
///
/// ```rust,ignore
/// use dashrun::prelude::*;
///
/// let engine = Engine::builder()
///     .room_config(config.room)
///     .build(HandshakeAuthenticator);
/// engine.connect(player_id, credentials, tx).await?;
/// engine.handle_bytes(player_id, &frame).await?;
/// ```
#[derive(Debug, Default)]
pub struct EngineBuilder {
    room_config: RoomConfig,
    results: Option<mpsc::UnboundedSender<RoomNotice>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Receives every finished race's standings and reward intents.
    pub fn results(mut self, sink: mpsc::UnboundedSender<RoomNotice>) -> Self {
        self.results = Some(sink);
        self
    }

    /// Builds the engine with [`JsonCodec`].
    ///
    /// Must be called within a Tokio runtime.
    pub fn build<A: Authenticator>(self, auth: A) -> Engine<A, JsonCodec> {
        self.build_with_codec(auth, JsonCodec)
    }

    pub fn build_with_codec<A: Authenticator, C: Codec>(self, auth: A, codec: C) -> Engine<A, C> {
        let config = Arc::new(self.room_config);
        let matchmaker = match self.results {
            Some(sink) => Matchmaker::with_results(config, sink),
            None => Matchmaker::new(config),
        };
        tracing::info!(
            players_per_match = matchmaker.config().players_per_match,
            tick_rate = matchmaker.config().tick_rate,
            "engine ready"
        );

        Engine {
            state: Arc::new(EngineState {
                sessions: Mutex::new(HashMap::new()),
                matchmaker,
                auth,
                codec,
            }),
        }
    }
}

/// The race engine. Cheap to clone.
pub struct Engine<A: Authenticator = HandshakeAuthenticator, C: Codec = JsonCodec> {
    state: Arc<EngineState<A, C>>,
}

impl<A: Authenticator, C: Codec> Clone for Engine<A, C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}

impl<A: Authenticator, C: Codec> Engine<A, C> {
    /// Admits a player. Events are only accepted after this succeeds.
    ///
    /// A rejected player receives `error 401` (or `409` when already
    /// connected) on `sender` before the error is returned.
    pub async fn connect(
        &self,
        player_id: PlayerId,
        credentials: Credentials,
        sender: PlayerSender,
    ) -> Result<(), DashrunError> {
        if let Err(e) = self.state.auth.authenticate(player_id, &credentials).await {
            tracing::info!(%player_id, error = %e, "connection rejected");
            send_error(&sender, 401, &e.to_string());
            return Err(e.into());
        }

        let mut sessions = self.state.sessions.lock().await;
        if sessions.contains_key(&player_id) {
            let err = AuthError::AlreadyConnected(player_id);
            send_error(&sender, 409, &err.to_string());
            return Err(err.into());
        }
        tracing::info!(%player_id, spirit_id = %credentials.spirit_id, "player connected");
        sessions.insert(
            player_id,
            Session {
                credentials,
                sender,
            },
        );
        Ok(())
    }

    /// Decodes one inbound frame and handles it.
    ///
    /// A frame that does not decode answers `error 400` and is otherwise
    /// ignored. Fails only for players that never connected.
    pub async fn handle_bytes(&self, player_id: PlayerId, frame: &[u8]) -> Result<(), DashrunError> {
        let session = self.session(player_id).await?;
        let event: ClientEvent = match self.state.codec.decode(frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode frame");
                send_error(&session.sender, 400, &format!("invalid event: {e}"));
                return Ok(());
            }
        };
        dispatch(&self.state.matchmaker, player_id, &session, event).await;
        Ok(())
    }

    /// Handles an already-decoded event.
    pub async fn handle_event(&self, player_id: PlayerId, event: ClientEvent) -> Result<(), DashrunError> {
        let session = self.session(player_id).await?;
        dispatch(&self.state.matchmaker, player_id, &session, event).await;
        Ok(())
    }

    /// Forgets the player and tells the matchmaker. Never fails.
    pub async fn disconnect(&self, player_id: PlayerId) {
        let known = self.state.sessions.lock().await.remove(&player_id).is_some();
        if known {
            tracing::info!(%player_id, "player disconnected");
        }
        self.state.matchmaker.handle_disconnect(player_id).await;
    }

    /// Serializes an outbound event with the engine's codec.
    pub fn encode(&self, event: &ServerEvent) -> Result<Vec<u8>, DashrunError> {
        Ok(self.state.codec.encode(event)?)
    }

    pub async fn is_connected(&self, player_id: PlayerId) -> bool {
        self.state.sessions.lock().await.contains_key(&player_id)
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.state.matchmaker
    }

    async fn session(&self, player_id: PlayerId) -> Result<Session, DashrunError> {
        self.state
            .sessions
            .lock()
            .await
            .get(&player_id)
            .cloned()
            .ok_or_else(|| {
                tracing::debug!(%player_id, "event from unknown player");
                AuthError::NotConnected(player_id).into()
            })
    }
}

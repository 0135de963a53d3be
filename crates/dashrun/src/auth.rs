//! Admission check for new connections.
//!
//! The engine never talks to an identity provider itself. It hands the
//! credentials a client presented during its handshake to an
//! [`Authenticator`] and only accepts events from players that passed.

use dashrun_protocol::PlayerId;
use dashrun_rules::SpiritAttributes;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// What a client presents when connecting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Credentials {
    pub session_id: String,
    /// The character the player races with.
    pub spirit_id: String,
    /// Attributes of that character, when the client knows them. Used to
    /// derive starting stats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spirit: Option<SpiritAttributes>,
}

impl Credentials {
    pub fn new(session_id: impl Into<String>, spirit_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            spirit_id: spirit_id.into(),
            spirit: None,
        }
    }
}

/// Decides whether a player may connect.
///
/// `Send + Sync + 'static` because the engine shares one authenticator
/// across every connection task.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(
        &self,
        player_id: PlayerId,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;
}

/// Default authenticator: both ids must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandshakeAuthenticator;

impl Authenticator for HandshakeAuthenticator {
    async fn authenticate(&self, _player_id: PlayerId, credentials: &Credentials) -> Result<(), AuthError> {
        if credentials.session_id.trim().is_empty() {
            return Err(AuthError::MissingField("sessionId"));
        }
        if credentials.spirit_id.trim().is_empty() {
            return Err(AuthError::MissingField("spiritId"));
        }
        Ok(())
    }
}

//! Backend Traits
//!
//! The helpdesk backend is an external service; everything this crate needs
//! from it is expressed by [`HelpdeskBackend`]. The chat client and login flow
//! only see the trait, so tests drive them with scripted backends and
//! deployments can swap the transport.

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{
    AccessToken, ChallengeId, ChatReply, ChatRequest, ConversationId, HealthStatus, HistoryEntry,
    TicketSummary, UserProfile,
};

/// Errors from a backend call
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The client could not be set up (bad base URL, TLS init failure)
    #[error("invalid backend configuration: {0}")]
    Config(String),

    /// The request never reached the backend or no response came back
    #[error("transport failure: {0}")]
    Transport(String),

    /// The configured request timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// The backend rejected the credentials (401)
    #[error("not authorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The response body did not match the expected record
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Whether the backend answered at all (as opposed to a transport-level failure)
    #[must_use]
    pub fn is_backend_response(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Status { .. })
    }
}

/// Helpdesk backend
///
/// One method per endpoint the client consumes. `token` is sent as a bearer
/// credential when present.
#[async_trait]
pub trait HelpdeskBackend: Send + Sync {
    /// Backend name for logs (e.g. "HTTP")
    fn name(&self) -> &str;

    /// Check whether the backend is reachable and serving
    async fn health(&self) -> Result<HealthStatus, BackendError>;

    /// `POST /auth/magic-link`: issue a login challenge for `email`
    ///
    /// `Ok(None)` means the challenge was issued but only delivered out-of-band.
    async fn request_challenge(&self, email: &str) -> Result<Option<ChallengeId>, BackendError>;

    /// `GET /auth/verify`: exchange a challenge for an access token
    async fn redeem_challenge(&self, challenge: &ChallengeId) -> Result<AccessToken, BackendError>;

    /// `GET /me`: profile of the token's owner
    async fn profile(&self, token: &AccessToken) -> Result<UserProfile, BackendError>;

    /// `POST /chat`: send one chat turn
    async fn chat(
        &self,
        token: Option<&AccessToken>,
        request: &ChatRequest,
    ) -> Result<ChatReply, BackendError>;

    /// `GET /sessions/{id}/messages`: stored history of a conversation, oldest first
    async fn history(
        &self,
        token: &AccessToken,
        conversation: &ConversationId,
    ) -> Result<Vec<HistoryEntry>, BackendError>;

    /// `GET /tickets/{external_id}`: look up a ticket
    async fn ticket(
        &self,
        token: &AccessToken,
        external_id: &str,
    ) -> Result<TicketSummary, BackendError>;

    /// Whether the backend is reachable and reports itself healthy
    async fn health_check(&self) -> bool {
        self.health().await.map(|h| h.is_ok()).unwrap_or(false)
    }
}

#[async_trait]
impl<B: HelpdeskBackend + ?Sized> HelpdeskBackend for std::sync::Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        (**self).health().await
    }

    async fn request_challenge(&self, email: &str) -> Result<Option<ChallengeId>, BackendError> {
        (**self).request_challenge(email).await
    }

    async fn redeem_challenge(&self, challenge: &ChallengeId) -> Result<AccessToken, BackendError> {
        (**self).redeem_challenge(challenge).await
    }

    async fn profile(&self, token: &AccessToken) -> Result<UserProfile, BackendError> {
        (**self).profile(token).await
    }

    async fn chat(
        &self,
        token: Option<&AccessToken>,
        request: &ChatRequest,
    ) -> Result<ChatReply, BackendError> {
        (**self).chat(token, request).await
    }

    async fn history(
        &self,
        token: &AccessToken,
        conversation: &ConversationId,
    ) -> Result<Vec<HistoryEntry>, BackendError> {
        (**self).history(token, conversation).await
    }

    async fn ticket(
        &self,
        token: &AccessToken,
        external_id: &str,
    ) -> Result<TicketSummary, BackendError> {
        (**self).ticket(token, external_id).await
    }
}

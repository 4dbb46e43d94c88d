//! HTTP Backend Implementation
//!
//! [`HelpdeskBackend`] over the helpdesk REST API.
//!
//! # Endpoints
//!
//! - `GET  /health` - liveness
//! - `POST /auth/magic-link` - issue a login challenge
//! - `GET  /auth/verify?token=...` - redeem a challenge for an access token
//! - `GET  /me` - profile of the bearer
//! - `POST /chat` - one chat turn
//! - `GET  /sessions/{id}/messages` - conversation history
//! - `GET  /tickets/{external_id}` - ticket lookup
//!
//! Status handling is uniform: 401 maps to [`BackendError::Unauthorized`], any
//! other non-2xx to [`BackendError::Status`] with the body text, and a 2xx body
//! that does not decode into the expected record to [`BackendError::Decode`].

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::traits::{BackendError, HelpdeskBackend};
use crate::config::ClientConfig;
use crate::messages::{
    AccessToken, ChallengeId, ChallengeReply, ChallengeRequest, ChatReply, ChatRequest,
    ConversationId, HealthStatus, HistoryEntry, HistoryReply, TicketSummary, UserProfile,
    VerifyReply,
};

/// Helpdesk backend client over HTTP
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Base URL every endpoint is resolved against
    base_url: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend from the client configuration
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Config`] if the base URL does not parse or the
    /// HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| BackendError::Config(format!("invalid API URL {}: {e}", config.api_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::Config(format!(
                "API URL cannot be used as a base: {}",
                config.api_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| BackendError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint below the base URL, one path segment per element
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Config(format!("bad base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode a JSON body
    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(map_transport)?;
        decode(response).await
    }
}

#[async_trait]
impl HelpdeskBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.endpoint(&["health"])?;
        Self::fetch(self.http_client.get(url)).await
    }

    async fn request_challenge(&self, email: &str) -> Result<Option<ChallengeId>, BackendError> {
        let url = self.endpoint(&["auth", "magic-link"])?;
        tracing::debug!(url = %url, "Requesting login challenge");

        let reply: ChallengeReply =
            Self::fetch(self.http_client.post(url).json(&ChallengeRequest { email })).await?;
        Ok(reply.token.filter(|t| !t.is_empty()).map(ChallengeId))
    }

    async fn redeem_challenge(&self, challenge: &ChallengeId) -> Result<AccessToken, BackendError> {
        let url = self.endpoint(&["auth", "verify"])?;
        let reply: VerifyReply = Self::fetch(
            self.http_client
                .get(url)
                .query(&[("token", challenge.0.as_str())]),
        )
        .await?;
        Ok(AccessToken::new(reply.access_token))
    }

    async fn profile(&self, token: &AccessToken) -> Result<UserProfile, BackendError> {
        let url = self.endpoint(&["me"])?;
        Self::fetch(self.http_client.get(url).bearer_auth(token.as_str())).await
    }

    async fn chat(
        &self,
        token: Option<&AccessToken>,
        request: &ChatRequest,
    ) -> Result<ChatReply, BackendError> {
        let url = self.endpoint(&["chat"])?;
        tracing::debug!(
            url = %url,
            conversation = ?request.session_id,
            authorized = token.is_some(),
            "Sending chat turn"
        );

        let mut builder = self.http_client.post(url).json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        Self::fetch(builder).await
    }

    async fn history(
        &self,
        token: &AccessToken,
        conversation: &ConversationId,
    ) -> Result<Vec<HistoryEntry>, BackendError> {
        let url = self.endpoint(&["sessions", conversation.as_str(), "messages"])?;
        let reply: HistoryReply =
            Self::fetch(self.http_client.get(url).bearer_auth(token.as_str())).await?;
        Ok(reply.messages)
    }

    async fn ticket(
        &self,
        token: &AccessToken,
        external_id: &str,
    ) -> Result<TicketSummary, BackendError> {
        let url = self.endpoint(&["tickets", external_id])?;
        Self::fetch(self.http_client.get(url).bearer_auth(token.as_str())).await
    }
}

/// Map a reqwest failure before or while receiving the response
fn map_transport(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Turn a response into the expected record or a classified error
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Backend returned error status");
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(map_transport)?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

//! Copilot client
//!
//! Ties the pieces together the way a surface uses them: restore the stored
//! session, sign in when there is none, then chat. Signing in (or restoring a
//! valid token) opens a fresh [`ChatSession`]; signing out drops it together
//! with the profile.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, AuthFlow, LoginOutcome};
use crate::backend::{BackendError, HelpdeskBackend};
use crate::chat::ChatSession;
use crate::config::ClientConfig;
use crate::messages::{AccessToken, ConversationId, HealthStatus, TicketSummary, UserProfile};
use crate::session::{SessionStore, StoreError};

/// Errors from operations that need a signed-in user
#[derive(Debug, Error)]
pub enum ClientError {
    /// No access token is held
    #[error("not signed in")]
    NotSignedIn,

    /// The backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The session store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Helpdesk copilot client
pub struct Copilot<B: HelpdeskBackend + 'static, S: SessionStore> {
    backend: Arc<B>,
    store: S,
    config: ClientConfig,
    auth: AuthFlow<B>,
    token: Option<AccessToken>,
    profile: Option<UserProfile>,
    chat: Option<ChatSession<B>>,
}

impl<B: HelpdeskBackend + 'static, S: SessionStore> Copilot<B, S> {
    /// Create a signed-out client
    pub fn new(backend: Arc<B>, store: S, config: ClientConfig) -> Self {
        Self {
            auth: AuthFlow::new(Arc::clone(&backend)),
            backend,
            store,
            config,
            token: None,
            profile: None,
            chat: None,
        }
    }

    /// Pick up the token persisted by an earlier run
    ///
    /// The token is checked against `/me`. If the backend rejects it, it is
    /// removed from the store. If the backend cannot be reached, the token is
    /// kept and the client is signed in without a profile.
    ///
    /// Returns whether the client is signed in afterwards.
    ///
    /// # Errors
    ///
    /// Returns the store error if the token cannot be read or cleared.
    pub async fn restore(&mut self) -> Result<bool, StoreError> {
        let Some(token) = self.store.load().await? else {
            tracing::debug!("No stored session");
            return Ok(false);
        };

        match self.backend.profile(&token).await {
            Ok(profile) => {
                tracing::info!(email = %profile.email, "Restored session");
                self.sign_in(token);
                self.profile = Some(profile);
                Ok(true)
            }
            Err(e) if e.is_backend_response() => {
                tracing::warn!(error = %e, "Stored token rejected, clearing session");
                self.sign_out();
                self.store.clear().await?;
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not validate stored token, keeping it");
                self.sign_in(token);
                Ok(true)
            }
        }
    }

    /// Sign in with a magic link sent to `email`
    ///
    /// On [`LoginOutcome::SignedIn`] the token is stored, a new conversation is
    /// opened and the profile is fetched. A profile fetch the backend rejects
    /// signs the client out again (see [`refresh_profile`](Self::refresh_profile));
    /// a transport failure is only logged.
    ///
    /// # Errors
    ///
    /// See [`AuthFlow::login`].
    pub async fn login(&mut self, email: &str) -> Result<LoginOutcome, AuthError> {
        let outcome = self.auth.login(email, &self.store).await?;

        if let LoginOutcome::SignedIn(token) = &outcome {
            self.sign_in(token.clone());
            if let Err(e) = self.refresh_profile().await {
                tracing::warn!(error = %e, "Signed in but profile unavailable");
            }
        }
        Ok(outcome)
    }

    /// Sign out: forget the token, the profile and the conversation
    ///
    /// # Errors
    ///
    /// Returns the store error if the stored token cannot be removed. The
    /// in-memory session is cleared regardless.
    pub async fn logout(&mut self) -> Result<(), StoreError> {
        self.sign_out();
        self.store.clear().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Fetch the profile of the signed-in user
    ///
    /// Any error status from `/me` counts as a rejected token and signs the
    /// client out; a transport failure leaves the session as it is.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotSignedIn`] without a token, otherwise the backend or
    /// store failure.
    pub async fn refresh_profile(&mut self) -> Result<&UserProfile, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotSignedIn)?;
        let result = self.backend.profile(token).await;

        match result {
            Ok(profile) => Ok(self.profile.insert(profile)),
            Err(e) if e.is_backend_response() => {
                tracing::warn!(error = %e, "Access token no longer accepted, signing out");
                self.sign_out();
                self.store.clear().await?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Continue a stored conversation in place of the current one
    ///
    /// # Errors
    ///
    /// [`ClientError::NotSignedIn`] without a token, otherwise the backend
    /// failure. The current conversation is kept on error.
    pub async fn resume(&mut self, conversation: ConversationId) -> Result<(), ClientError> {
        let token = self.token.clone().ok_or(ClientError::NotSignedIn)?;
        let chat =
            ChatSession::resume(Arc::clone(&self.backend), token, conversation, &self.config)
                .await?;
        self.chat = Some(chat);
        Ok(())
    }

    /// Look up a ticket by its external id
    ///
    /// # Errors
    ///
    /// [`ClientError::NotSignedIn`] without a token, otherwise the backend failure.
    pub async fn ticket(&self, external_id: &str) -> Result<TicketSummary, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotSignedIn)?;
        Ok(self.backend.ticket(token, external_id).await?)
    }

    /// Backend reachability
    ///
    /// # Errors
    ///
    /// Returns the backend error if `/health` cannot be fetched.
    pub async fn health(&self) -> Result<HealthStatus, BackendError> {
        self.backend.health().await
    }

    /// Whether an access token is held
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Profile of the signed-in user, once fetched
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Current conversation (signed in only)
    pub fn chat(&self) -> Option<&ChatSession<B>> {
        self.chat.as_ref()
    }

    /// Current conversation, mutably (signed in only)
    pub fn chat_mut(&mut self) -> Option<&mut ChatSession<B>> {
        self.chat.as_mut()
    }

    /// Effective configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn sign_in(&mut self, token: AccessToken) {
        self.chat = Some(ChatSession::new(
            Arc::clone(&self.backend),
            Some(token.clone()),
            &self.config,
        ));
        self.token = Some(token);
    }

    fn sign_out(&mut self) {
        self.token = None;
        self.profile = None;
        self.chat = None;
    }
}

//! Authentication Flow
//!
//! Two-step magic-link login: the backend issues an opaque challenge for an
//! email address, and redeeming the challenge yields an access token. A
//! successful login writes the token to the [`SessionStore`].
//!
//! When the challenge cannot be redeemed in-band (the backend only emailed it,
//! or it refused the verify call) the login ends as
//! [`LoginOutcome::PendingConfirmation`]: the link in the email may still work.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{BackendError, HelpdeskBackend};
use crate::messages::{AccessToken, ChallengeId};
use crate::session::{SessionStore, StoreError};

/// Login failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// No email address was given; nothing was sent
    #[error("email address is required")]
    EmptyEmail,

    /// The challenge could not be requested
    #[error("failed to request login link: {0}")]
    Challenge(#[source] BackendError),

    /// The backend refused to redeem the challenge
    #[error("login link was not accepted: {0}")]
    Rejected(#[source] BackendError),

    /// The verify call failed before the backend could answer
    #[error("failed to verify login link: {0}")]
    Verification(#[source] BackendError),

    /// The token could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a completed login attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Token obtained and stored
    SignedIn(AccessToken),
    /// Challenge sent; confirmation happens through the emailed link
    PendingConfirmation,
}

/// Magic-link login against a backend
pub struct AuthFlow<B> {
    backend: Arc<B>,
}

impl<B: HelpdeskBackend> AuthFlow<B> {
    /// Create a login flow
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Ask the backend to issue a challenge for `email`
    ///
    /// `Ok(None)` means the challenge went out by email only.
    ///
    /// # Errors
    ///
    /// [`AuthError::EmptyEmail`] for a blank address (no request is made),
    /// [`AuthError::Challenge`] if the backend call fails.
    pub async fn request_challenge(&self, email: &str) -> Result<Option<ChallengeId>, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::EmptyEmail);
        }

        tracing::info!(email = %email, "Requesting login link");
        self.backend
            .request_challenge(email)
            .await
            .map_err(AuthError::Challenge)
    }

    /// Exchange a challenge for an access token
    ///
    /// # Errors
    ///
    /// [`AuthError::Rejected`] when the backend answers with an error status,
    /// [`AuthError::Verification`] when the call fails otherwise.
    pub async fn redeem_challenge(&self, challenge: &ChallengeId) -> Result<AccessToken, AuthError> {
        match self.backend.redeem_challenge(challenge).await {
            Ok(token) => Ok(token),
            Err(e) if e.is_backend_response() => Err(AuthError::Rejected(e)),
            Err(e) => Err(AuthError::Verification(e)),
        }
    }

    /// Run both steps and store the token on success
    ///
    /// # Errors
    ///
    /// Any error of [`request_challenge`](Self::request_challenge), a
    /// verification transport failure, or a store failure while saving the
    /// token. A rejected verify call is not an error.
    pub async fn login<S>(&self, email: &str, store: &S) -> Result<LoginOutcome, AuthError>
    where
        S: SessionStore + ?Sized,
    {
        let Some(challenge) = self.request_challenge(email).await? else {
            tracing::info!("Login link sent by email only");
            return Ok(LoginOutcome::PendingConfirmation);
        };

        match self.redeem_challenge(&challenge).await {
            Ok(token) => {
                store.save(&token).await?;
                tracing::info!("Signed in");
                Ok(LoginOutcome::SignedIn(token))
            }
            Err(AuthError::Rejected(e)) => {
                tracing::info!(reason = %e, "Login pending email confirmation");
                Ok(LoginOutcome::PendingConfirmation)
            }
            Err(e) => Err(e),
        }
    }
}

//! Session State and Token Storage
//!
//! A [`Session`] is the small piece of state that identifies *who* is talking and
//! *which* conversation they are in. The access token half of it must survive a
//! restart, so it is persisted through a [`SessionStore`].
//!
//! # Stores
//!
//! - [`MemoryStore`]: volatile, for tests and throwaway runs
//! - [`FileStore`]: a single owner-only file holding the token
//!
//! Any other backend (keychain, encrypted file) only needs to implement the
//! three store operations.

mod file;
mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::messages::{AccessToken, ConversationId};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a token store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage location could not be read or written
    #[error("token store I/O failed at {path}: {source}")]
    Io {
        /// Location that was accessed
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Stored content is not a usable token
    #[error("stored token is malformed: {0}")]
    Malformed(String),
}

/// Durable storage for the access token
///
/// An absent token is a normal outcome of [`load`](SessionStore::load), not an
/// error. [`clear`](SessionStore::clear) is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the previously saved token, if any
    async fn load(&self) -> Result<Option<AccessToken>, StoreError>;

    /// Persist a token for future [`load`](SessionStore::load) calls
    async fn save(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Remove any saved token
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    async fn load(&self) -> Result<Option<AccessToken>, StoreError> {
        (**self).load().await
    }

    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        (**self).save(token).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}

/// Who is talking and in which conversation
#[derive(Clone, Debug, Default)]
pub struct Session {
    auth_token: Option<AccessToken>,
    conversation_id: Option<ConversationId>,
}

impl Session {
    /// Session for a (possibly anonymous) user with no conversation yet
    #[must_use]
    pub fn new(auth_token: Option<AccessToken>) -> Self {
        Self {
            auth_token,
            conversation_id: None,
        }
    }

    /// Session continuing a known conversation
    #[must_use]
    pub fn with_conversation(auth_token: Option<AccessToken>, id: ConversationId) -> Self {
        Self {
            auth_token,
            conversation_id: Some(id),
        }
    }

    /// Bearer token, if signed in
    #[must_use]
    pub fn auth_token(&self) -> Option<&AccessToken> {
        self.auth_token.as_ref()
    }

    /// Conversation the backend assigned, once known
    #[must_use]
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    /// Record the conversation id returned by the backend
    ///
    /// The first id wins; later ones are ignored. Returns whether `id` was adopted.
    pub fn adopt_conversation(&mut self, id: ConversationId) -> bool {
        if self.conversation_id.is_some() {
            return false;
        }
        self.conversation_id = Some(id);
        true
    }
}

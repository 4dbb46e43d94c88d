//! In-memory token store

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{SessionStore, StoreError};
use crate::messages::AccessToken;

/// Volatile store; the token lives as long as this value
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Mutex<Option<AccessToken>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`
    #[must_use]
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.token.lock().clone())
    }

    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.token.lock().take();
        Ok(())
    }
}

//! File-backed token store
//!
//! The token is kept as a single line in one file:
//!
//! - Parent directory is created on demand (0o700 on Unix)
//! - The file is written with 0o600 permissions (owner read/write only)
//! - A missing file means "no token"
//! - Tokens that cannot be stored on one line (blank, or containing
//!   whitespace) are refused on save, so a saved token always loads back
//!   unchanged

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{SessionStore, StoreError};
use crate::messages::AccessToken;

/// Stores the access token in a file
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by `path`; nothing is touched until first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn ensure_parent(&self) -> Result<(), StoreError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || tokio::fs::try_exists(parent).await.unwrap_or(false) {
            return Ok(());
        }

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn load(&self) -> Result<Option<AccessToken>, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let token = contents.strip_suffix('\n').unwrap_or(&contents);
        if token.is_empty() {
            return Ok(None);
        }
        check_storable(token)?;
        Ok(Some(AccessToken::new(token)))
    }

    async fn save(&self, token: &AccessToken) -> Result<(), StoreError> {
        check_storable(token.as_str())?;
        self.ensure_parent().await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(token.as_str().as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(b"\n").await.map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "Access token written to file");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Access token file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// A token must be non-empty and free of whitespace to fit the one-line format
fn check_storable(token: &str) -> Result<(), StoreError> {
    if token.is_empty() {
        return Err(StoreError::Malformed("token is empty".to_string()));
    }
    if token.contains(char::is_whitespace) {
        return Err(StoreError::Malformed(
            "token contains whitespace".to_string(),
        ));
    }
    Ok(())
}

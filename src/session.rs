//! Auth token persistence.
//!
//! - [`FileTokenStore`]: JSON file in the user config directory (default)
//! - [`MemoryTokenStore`]: process-local, for tests and one-shot commands
//!
//! The [`Session`] wraps whichever store the composition root picked and is
//! handed to the API client; nothing else touches the token.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TOKEN_FILE_NAME: &str = "auth_token.json";

#[derive(Debug, Serialize, Deserialize)]
struct SavedToken {
    token: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    saved_at: DateTime<Utc>,
}

/// Device-local storage for the single active auth token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, token: &str) -> Result<()>;

    /// Returns `None` when no token is stored.
    async fn get(&self) -> Result<Option<String>>;

    async fn clear(&self) -> Result<()>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the davomat config directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TOKEN_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create token directory")?;
        }
        let saved = SavedToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&saved)?;
        tokio::fs::write(&self.path, contents)
            .await
            .context("Failed to write token file")?;
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to read token file"),
        };
        let saved: SavedToken =
            serde_json::from_str(&contents).context("Token file is corrupt")?;
        if saved.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(saved.token))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove token file"),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, token: &str) -> Result<()> {
        let mut slot = self.token.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>> {
        let slot = self.token.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        Ok(slot.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut slot = self.token.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;
        *slot = None;
        Ok(())
    }
}

/// The authenticated identity of this device, injected into the API client.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Current token. A store that cannot be read counts as logged out.
    pub async fn token(&self) -> Option<String> {
        match self.store.get().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Could not read auth token: {:#}", e);
                None
            }
        }
    }

    pub async fn is_logged_in(&self) -> bool {
        self.token().await.is_some()
    }

    pub async fn save(&self, token: &str) -> Result<()> {
        self.store.save(token).await?;
        tracing::info!("Auth token saved");
        Ok(())
    }

    /// Forget the token. Failures are logged, never returned.
    pub async fn clear(&self) {
        match self.store.clear().await {
            Ok(()) => tracing::info!("Auth token cleared"),
            Err(e) => tracing::warn!("Could not clear auth token: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());

        assert_eq!(store.get().await.unwrap(), None);

        store.save("abc|123").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("abc|123".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);
        // Clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_token_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        assert!(store.get().await.is_err());

        let session = Session::new(Arc::new(store));
        assert_eq!(session.token().await, None);
        assert!(!session.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_session_save_and_clear() {
        let session = Session::in_memory();
        assert!(!session.is_logged_in().await);

        session.save("tok").await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("tok"));

        session.clear().await;
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_memory_store_with_token() {
        let store = MemoryTokenStore::with_token("seed");
        assert_eq!(store.get().await.unwrap().as_deref(), Some("seed"));
    }
}

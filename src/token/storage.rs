//! Credential Storage
//!
//! Durable backends for the session held by [`AuthStore`](super::AuthStore).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

use crate::types::User;

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the last-known user.
pub const CURRENT_USER_KEY: &str = "current_user";

/// Persisted session, serialized under the keys above.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user: Option<User>,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("current_user", &self.current_user)
            .finish()
    }
}

/// Storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Read failed: {message}")]
    ReadFailed { message: String },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },

    #[error("Delete failed: {message}")]
    DeleteFailed { message: String },

    #[error("Corrupted data: {message}")]
    CorruptedData { message: String },
}

/// Durable credential storage interface.
#[async_trait]
pub trait CredentialStorage: Send + Sync {
    /// Load the persisted session, if any.
    async fn load(&self) -> Result<Option<PersistedSession>, StorageError>;

    /// Replace the persisted session.
    async fn save(&self, session: &PersistedSession) -> Result<(), StorageError>;

    /// Remove every persisted key at once.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory storage implementation.
#[derive(Default)]
pub struct InMemoryCredentialStorage {
    session: Mutex<Option<PersistedSession>>,
}

impl InMemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated storage.
    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl CredentialStorage for InMemoryCredentialStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|e| StorageError::ReadFailed {
                message: e.to_string(),
            })
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(|e| StorageError::WriteFailed {
            message: e.to_string(),
        })?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.session.lock().map_err(|e| StorageError::DeleteFailed {
            message: e.to_string(),
        })?;
        *guard = None;
        Ok(())
    }
}

/// JSON file storage.
///
/// Writes go to a sibling temp file that is renamed into place, so a reader
/// never sees a half-written session. Clearing removes the file.
pub struct FileCredentialStorage {
    path: PathBuf,
}

impl FileCredentialStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStorage for FileCredentialStorage {
    async fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    message: format!("{}: {}", self.path.display(), e),
                })
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| StorageError::CorruptedData {
                message: format!("{}: {}", self.path.display(), e),
            })
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(session).map_err(|e| StorageError::WriteFailed {
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::WriteFailed {
                    message: format!("{}: {}", parent.display(), e),
                })?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes)
            .await
            .map_err(|e| StorageError::WriteFailed {
                message: format!("{}: {}", temp.display(), e),
            })?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::WriteFailed {
                message: format!("{}: {}", self.path.display(), e),
            })
    }

    async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed {
                message: format!("{}: {}", self.path.display(), e),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PersistedSession {
        PersistedSession {
            access_token: Some("access-1".to_string()),
            refresh_token: Some("refresh-1".to_string()),
            current_user: None,
        }
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let storage = InMemoryCredentialStorage::new();
        assert!(storage.load().await.unwrap().is_none());

        storage.save(&session()).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(session()));

        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_storage_uses_session_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("nested").join("session.json"));

        storage.save(&session()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(storage.path()).unwrap()).unwrap();
        assert_eq!(raw[ACCESS_TOKEN_KEY], "access-1");
        assert_eq!(raw[REFRESH_TOKEN_KEY], "refresh-1");
        assert!(raw.get(CURRENT_USER_KEY).is_none());

        assert_eq!(storage.load().await.unwrap(), Some(session()));
    }

    #[tokio::test]
    async fn test_file_storage_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCredentialStorage::new(dir.path().join("session.json"));

        storage.clear().await.unwrap();
        storage.save(&session()).await.unwrap();
        storage.clear().await.unwrap();

        assert!(!storage.path().exists());
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_storage_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let result = FileCredentialStorage::new(path).load().await;
        assert!(matches!(result, Err(StorageError::CorruptedData { .. })));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", session());
        assert!(!debug.contains("access-1"));
        assert!(!debug.contains("refresh-1"));
    }
}

//! Auth Store
//!
//! Process-wide holder of the current session. Reads are cheap and
//! synchronous; writes go through to the configured [`CredentialStorage`].
//! Writes are serialized end to end, so storage always ends up holding the
//! session of the last write to reach memory.

use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::warn;

use super::storage::{CredentialStorage, InMemoryCredentialStorage, PersistedSession, StorageError};
use crate::types::User;

/// Access and refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[derive(Default)]
struct Session {
    tokens: Option<AuthTokens>,
    user: Option<User>,
}

impl Session {
    fn persisted(&self) -> PersistedSession {
        PersistedSession {
            access_token: self.tokens.as_ref().map(|t| t.access_token.clone()),
            refresh_token: self.tokens.as_ref().and_then(|t| t.refresh_token.clone()),
            current_user: self.user.clone(),
        }
    }
}

/// Holder of the current tokens and user identity.
///
/// Empty means logged out.
pub struct AuthStore {
    session: RwLock<Session>,
    storage: Arc<dyn CredentialStorage>,
    // Held from the in-memory update until storage has been written.
    write_through: Mutex<()>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryCredentialStorage::new()))
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl AuthStore {
    /// Create an empty store backed by `storage`.
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            storage,
            write_through: Mutex::new(()),
        }
    }

    /// Load a previously persisted session. Returns whether tokens were found.
    pub async fn restore(&self) -> Result<bool, StorageError> {
        let _write = self.write_through.lock().await;
        let Some(persisted) = self.storage.load().await? else {
            return Ok(false);
        };

        let tokens = persisted
            .access_token
            .filter(|t| !t.is_empty())
            .map(|access_token| AuthTokens::new(access_token, persisted.refresh_token));
        let found = tokens.is_some();

        if let Ok(mut session) = self.session.write() {
            session.user = if found { persisted.current_user } else { None };
            session.tokens = tokens;
        }

        Ok(found)
    }

    /// Replace the tokens.
    pub async fn set(&self, tokens: AuthTokens) {
        let _write = self.write_through.lock().await;
        let snapshot = match self.session.write() {
            Ok(mut session) => {
                session.tokens = Some(tokens);
                session.persisted()
            }
            Err(_) => return,
        };
        self.persist(&snapshot).await;
    }

    /// Current tokens, if logged in.
    pub fn get(&self) -> Option<AuthTokens> {
        self.session.read().ok().and_then(|s| s.tokens.clone())
    }

    /// Current access token, if logged in.
    pub fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .ok()
            .and_then(|s| s.tokens.as_ref().map(|t| t.access_token.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .map(|s| s.tokens.is_some())
            .unwrap_or(false)
    }

    /// Remember the signed-in user.
    pub async fn set_user(&self, user: User) {
        let _write = self.write_through.lock().await;
        let snapshot = match self.session.write() {
            Ok(mut session) => {
                session.user = Some(user);
                session.persisted()
            }
            Err(_) => return,
        };
        self.persist(&snapshot).await;
    }

    /// Last-known user.
    pub fn user(&self) -> Option<User> {
        self.session.read().ok().and_then(|s| s.user.clone())
    }

    /// Drop tokens and user together.
    pub async fn clear(&self) {
        let _write = self.write_through.lock().await;
        if let Ok(mut session) = self.session.write() {
            *session = Session::default();
        }
        if let Err(e) = self.storage.clear().await {
            warn!(error = %e, "Failed to clear persisted credentials");
        }
    }

    async fn persist(&self, snapshot: &PersistedSession) {
        if let Err(e) = self.storage.save(snapshot).await {
            warn!(error = %e, "Failed to persist credentials");
        }
    }
}

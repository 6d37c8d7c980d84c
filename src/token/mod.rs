//! Token Management
//!
//! Session storage and single-flight access token refresh.

pub mod refresh;
pub mod storage;
pub mod store;

pub use refresh::{
    HttpTokenRefresher, MockTokenRefresher, RefreshCoordinator, RefreshState, TokenRefresher,
    REFRESH_PATH,
};
pub use storage::{
    CredentialStorage, FileCredentialStorage, InMemoryCredentialStorage, PersistedSession,
    StorageError, ACCESS_TOKEN_KEY, CURRENT_USER_KEY, REFRESH_TOKEN_KEY,
};
pub use store::{AuthStore, AuthTokens};

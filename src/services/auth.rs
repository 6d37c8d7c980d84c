//! Authentication operations.

use secrecy::ExposeSecret;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::core::HttpMethod;
use crate::error::ApiResult;
use crate::resilience::RequestPolicy;
use crate::token::AuthTokens;
use crate::types::{
    token_grant_decoders, user_decoders, LoginRequest, RegisterRequest, TokenGrant, User,
};

/// Result of a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub access_token: String,
    /// The signed-in user, when it could be determined.
    pub user: Option<User>,
}

/// Service for sign-in and the current user.
pub struct AuthService<'a> {
    client: &'a ApiClient,
    cancel: Option<CancellationToken>,
}

impl<'a> AuthService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            cancel: None,
        }
    }

    /// Cancel this service's requests with `cancel`.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sign in and store the returned tokens.
    ///
    /// The user is then fetched from `/users/me` with the new token; if that
    /// fails the login still succeeds with whatever user the grant carried.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome> {
        let body = ApiClient::encode(&LoginRequest::new(username, password))?;
        let policy = self
            .client
            .write_policy(RequestPolicy::decoders(token_grant_decoders()), self.cancel.as_ref())
            .unauthenticated();

        let grant = self
            .client
            .send(HttpMethod::Post, "/users/login", &[], Some(body), policy)
            .await?;

        self.establish(grant).await
    }

    /// Create an account and sign in.
    ///
    /// Backends that answer with tokens are signed in directly; otherwise the
    /// new credentials are used to log in.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<LoginOutcome> {
        let body = ApiClient::encode(request)?;
        let policy = self
            .client
            .write_policy(RequestPolicy::raw(), self.cancel.as_ref())
            .unauthenticated();

        let response = self
            .client
            .send(HttpMethod::Post, "/users/register", &[], Some(body), policy)
            .await?;

        match response
            .as_json()
            .and_then(|value| token_grant_decoders().decode(value).ok())
        {
            Some(grant) => self.establish(grant).await,
            None => {
                debug!("Registration returned no tokens; logging in");
                self.login(&request.username, request.password.expose_secret())
                    .await
            }
        }
    }

    /// Fetch the current user and remember it.
    pub async fn me(&self) -> ApiResult<User> {
        let policy = self
            .client
            .read_policy(RequestPolicy::decoders(user_decoders()), self.cancel.as_ref());

        let user = self
            .client
            .send(HttpMethod::Get, "/users/me", &[], None, policy)
            .await?;

        self.client.store().set_user(user.clone()).await;
        Ok(user)
    }

    /// Sign out.
    pub async fn logout(&self) {
        self.client.logout().await;
    }

    async fn establish(&self, grant: TokenGrant) -> ApiResult<LoginOutcome> {
        let store = self.client.store();
        store
            .set(AuthTokens::new(grant.access_token.clone(), grant.refresh_token))
            .await;

        let granted_user = grant.user.as_ref().and_then(decode_user);
        if let Some(user) = &granted_user {
            store.set_user(user.clone()).await;
        }

        let user = match self.me().await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(code = %e.code(), "Fetching /users/me after login failed");
                granted_user
            }
        };

        Ok(LoginOutcome {
            access_token: grant.access_token,
            user,
        })
    }
}

fn decode_user(value: &Value) -> Option<User> {
    user_decoders().decode(value).ok()
}

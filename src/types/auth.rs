//! Authentication Types
//!
//! Login and refresh payloads exchanged with the backend.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::decode::CandidateDecoders;

/// Payload for `POST /users/login`.
#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

pub(crate) fn serialize_secret<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Token grant returned by login or register, whatever field naming the
/// backend uses.
#[derive(Clone, Debug)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub user: Option<Value>,
}

#[derive(Deserialize)]
struct SnakeGrant {
    access_token: String,
    token_type: Option<String>,
    refresh_token: Option<String>,
    user: Option<Value>,
}

#[derive(Deserialize)]
struct ShortGrant {
    token: String,
    token_type: Option<String>,
    refresh_token: Option<String>,
    user: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CamelGrant {
    access_token: String,
    token_type: Option<String>,
    refresh_token: Option<String>,
    user: Option<Value>,
}

fn grant(
    access_token: String,
    token_type: Option<String>,
    refresh_token: Option<String>,
    user: Option<Value>,
) -> TokenGrant {
    TokenGrant {
        access_token,
        token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
        refresh_token,
        user,
    }
}

/// Decoders for `{access_token} | {token} | {accessToken}`.
pub fn token_grant_decoders() -> CandidateDecoders<TokenGrant> {
    CandidateDecoders::new("token")
        .shape("access_token", |g: SnakeGrant| {
            grant(g.access_token, g.token_type, g.refresh_token, g.user)
        })
        .shape("token", |g: ShortGrant| {
            grant(g.token, g.token_type, g.refresh_token, g.user)
        })
        .shape("accessToken", |g: CamelGrant| {
            grant(g.access_token, g.token_type, g.refresh_token, g.user)
        })
}

/// Payload for `POST /auth/refresh`.
#[derive(Clone, Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Body of a successful refresh.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

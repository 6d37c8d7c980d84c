//! User Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode::CandidateDecoders;

/// Authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl User {
    /// Check the invariants serde cannot express.
    pub fn check(self) -> Result<Self, String> {
        if self.id == 0 {
            return Err("user id must be positive".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("invalid email: {}", self.email));
        }
        Ok(self)
    }

    /// Display name, falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

/// Decoders for `User | {user: User}`.
pub fn user_decoders() -> CandidateDecoders<User> {
    CandidateDecoders::new("user")
        .candidate("envelope", |value: &Value| {
            UserEnvelope::deserialize(value)
                .map_err(|e| e.to_string())
                .and_then(|env| env.user.check())
        })
        .candidate("bare", |value: &Value| {
            User::deserialize(value)
                .map_err(|e| e.to_string())
                .and_then(User::check)
        })
}

/// Payload for `POST /users/register`.
#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "crate::types::auth::serialize_secret")]
    pub password: secrecy::SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

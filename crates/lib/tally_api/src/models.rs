//! Request and response bodies.
//!
//! Field names accept the capitalized spelling older clients send.

use serde::{Deserialize, Serialize};
use tally_core::models::auth::UserRecord;

/// Error body returned on every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Plain confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /` body.
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(alias = "Password")]
    pub password: String,
    #[serde(default, alias = "Phone")]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    pub token: String,
}

/// `PUT /update-user` body. Absent or empty fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    #[serde(alias = "ID")]
    pub id: Option<i64>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
    #[serde(alias = "Phone")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: UserRecord,
}

/// `GET /validate-token` body: the authorized user under `message`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateTokenResponse {
    pub message: UserRecord,
}

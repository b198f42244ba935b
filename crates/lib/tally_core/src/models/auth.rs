//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! shapes in `tally_api::models`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable numeric user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(UserId)
    }
}

/// Stored user record.
///
/// The password hash is skipped during serialization and redacted from
/// `Debug` output so the record can be logged and returned to clients.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
    #[serde(skip)]
    pub password_hash: String,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Fields for a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub password_hash: String,
}

/// Partial update of a user record. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// Whether the change set touches nothing.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.password_hash.is_none()
    }
}

/// JWT claims embedded in access tokens (wire form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID as a decimal string (standard JWT `sub` claim).
    pub sub: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Access token as seen by the rest of the system, converted from
/// [`TokenClaims`] at the validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessToken {
    pub subject: UserId,
    pub expires_at: i64,
}

/// A freshly signed token plus its expiry.
#[derive(Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of a successful token validation.
#[derive(Debug, Clone)]
pub struct AuthorizedSubject {
    pub user: UserRecord,
    pub expires_at: i64,
}

/// Identity attached to a request after the authorization chain passes.
///
/// `user` is the record the token's subject resolved to; `claimed_uid` is the
/// value of the unauthenticated identity header.
#[derive(Debug, Clone)]
pub struct AuthorizedIdentity {
    pub user: UserRecord,
    pub claimed_uid: UserId,
}

impl AuthorizedIdentity {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

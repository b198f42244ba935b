//! Authentication and authorization logic.
//!
//! Password hashing, access-token issuance and validation, the identity
//! header pre-check, and the ordered gate chain that protects handlers.

pub mod chain;
pub mod identity;
pub mod jwt;
pub mod password;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::store::StoreError;

pub use chain::{
    AuthRequest, AuthorizationChain, GateKind, GateRejection, IdentityGate, TokenGate,
};
pub use identity::IdentityResolver;
pub use jwt::{TokenIssuer, TokenValidator};
pub use password::PasswordHasher;

/// Authentication errors. Each gate failure has its own kind.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity header missing")]
    MissingIdentityHeader,

    #[error("Identity header is not a numeric user id")]
    MalformedIdentityHeader,

    #[error("No user for identity header")]
    UnknownIdentity,

    #[error("Authorization token missing")]
    MissingToken,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token subject not found")]
    SubjectNotFound,

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Credential store unavailable: {0}")]
    CredentialStoreUnavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::CredentialStoreUnavailable(e.to_string())
    }
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Signing secret not set (SECRET_KEY or JWT_SECRET)")]
    MissingSigningSecret,
}

/// Process-wide token signing secret. Redacted from `Debug` output.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    /// Wrap a secret value. Empty secrets are rejected.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
        let bytes = secret.as_ref();
        if bytes.is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }
        Ok(Self(Arc::from(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Immutable auth configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub signing_secret: SigningSecret,
}

impl AuthConfig {
    pub fn new(signing_secret: SigningSecret) -> Self {
        Self { signing_secret }
    }

    /// Reads the signing secret: env var `SECRET_KEY` → `JWT_SECRET`.
    ///
    /// Fails when neither is set to a non-empty value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = ["SECRET_KEY", "JWT_SECRET"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.is_empty())
            .ok_or(ConfigError::MissingSigningSecret)?;
        Ok(Self::new(SigningSecret::new(secret)?))
    }
}

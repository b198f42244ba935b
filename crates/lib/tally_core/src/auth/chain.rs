//! Ordered authorization gates in front of protected handlers.
//!
//! The identity header gate always runs first; the token gate runs only if
//! it passed. The first failure ends the chain and is tagged with the gate
//! that produced it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::identity::IdentityResolver;
use super::jwt::TokenValidator;
use super::{AuthConfig, AuthError};
use crate::models::auth::{AuthorizedIdentity, AuthorizedSubject, UserId};
use crate::store::CredentialStore;

/// Gate that resolves the identity header.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    async fn resolve(&self, header: Option<&str>) -> Result<UserId, AuthError>;
}

/// Gate that validates an access token.
#[async_trait]
pub trait TokenGate: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthorizedSubject, AuthError>;
}

/// Which gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Identity,
    Token,
}

impl GateKind {
    /// Order in which gates run.
    pub const ORDER: [GateKind; 2] = [GateKind::Identity, GateKind::Token];

    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Identity => "identity",
            GateKind::Token => "token",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A gate failure.
#[derive(Debug, Error)]
#[error("{gate} gate rejected request: {error}")]
pub struct GateRejection {
    pub gate: GateKind,
    #[source]
    pub error: AuthError,
}

impl GateRejection {
    fn at(gate: GateKind, error: AuthError) -> Self {
        Self { gate, error }
    }
}

/// Credentials pulled from a request, before any checking.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Raw `Uid` header value.
    pub identity_header: Option<String>,
    /// Raw `Authorization` header value, or the `Authorization` cookie.
    pub authorization: Option<String>,
}

impl AuthRequest {
    pub fn new(identity_header: Option<String>, authorization: Option<String>) -> Self {
        Self {
            identity_header,
            authorization,
        }
    }

    /// The token with any `Bearer ` scheme removed. Empty values count as absent.
    pub fn token(&self) -> Option<&str> {
        let value = self.authorization.as_deref()?.trim();
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Identity gate, then token gate, short-circuiting on the first failure.
#[derive(Clone)]
pub struct AuthorizationChain {
    identity: Arc<dyn IdentityGate>,
    token: Arc<dyn TokenGate>,
}

impl AuthorizationChain {
    pub fn new(identity: Arc<dyn IdentityGate>, token: Arc<dyn TokenGate>) -> Self {
        Self { identity, token }
    }

    /// Standard chain: [`IdentityResolver`] then [`TokenValidator`] over one store.
    pub fn from_store(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::new(
            Arc::new(IdentityResolver::new(store.clone())),
            Arc::new(TokenValidator::new(config, store)),
        )
    }

    /// Run every gate in order. The identity is only produced when all pass.
    pub async fn authorize(
        &self,
        request: &AuthRequest,
    ) -> Result<AuthorizedIdentity, GateRejection> {
        let claimed_uid = self
            .identity
            .resolve(request.identity_header.as_deref())
            .await
            .map_err(|e| GateRejection::at(GateKind::Identity, e))?;

        let token = request
            .token()
            .ok_or_else(|| GateRejection::at(GateKind::Token, AuthError::MissingToken))?;
        let subject = self
            .token
            .validate(token)
            .await
            .map_err(|e| GateRejection::at(GateKind::Token, e))?;

        debug!(uid = %claimed_uid, user_id = %subject.user.id, "request authorized");
        Ok(AuthorizedIdentity {
            user: subject.user,
            claimed_uid,
        })
    }
}

//! Identity header pre-check.
//!
//! Resolves the caller-supplied `Uid` header to a user that exists. This
//! proves nothing about ownership; the token gate does that.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::AuthError;
use super::chain::IdentityGate;
use crate::models::auth::UserId;
use crate::store::CredentialStore;

/// Existence-only resolver for the identity header.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Parse the header value and confirm the user exists.
    pub async fn resolve(&self, header: Option<&str>) -> Result<UserId, AuthError> {
        let raw = header.ok_or(AuthError::MissingIdentityHeader)?;
        let uid = raw
            .parse::<UserId>()
            .map_err(|_| AuthError::MalformedIdentityHeader)?;

        if !self.store.exists(uid).await? {
            debug!(uid = %uid, "identity header names no user");
            return Err(AuthError::UnknownIdentity);
        }
        Ok(uid)
    }
}

#[async_trait]
impl IdentityGate for IdentityResolver {
    async fn resolve(&self, header: Option<&str>) -> Result<UserId, AuthError> {
        IdentityResolver::resolve(self, header).await
    }
}

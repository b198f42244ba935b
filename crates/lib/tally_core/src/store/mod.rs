//! User record storage.
//!
//! The auth gates only ever see [`CredentialStore`]; the registration and
//! account handlers use the wider [`UserDirectory`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, UserChanges, UserId, UserRecord};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column (email, phone) already holds the value.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Read-only lookup of user records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by unique email.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Whether a user with this identifier exists.
    async fn exists(&self, id: UserId) -> Result<bool, StoreError>;
}

/// Full user record lifecycle: the write path behind registration,
/// profile updates and account deletion.
#[async_trait]
pub trait UserDirectory: CredentialStore {
    /// Insert a new user, returning the stored record.
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Apply a partial update. Returns `None` if the user does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Delete a user. Returns whether a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

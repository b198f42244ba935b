//! In-memory user store.
//!
//! Used when no database is configured and by tests. Enforces the same
//! uniqueness rules as the `users` table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, UserDirectory};
use crate::models::auth::{NewUser, UserChanges, UserId, UserRecord};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<UserId, UserRecord>,
}

impl Inner {
    /// Find a record other than `except` holding the given email or phone.
    fn conflict(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<UserId>,
    ) -> Option<&'static str> {
        for user in self.users.values() {
            if Some(user.id) == except {
                continue;
            }
            if email == Some(user.email.as_str()) {
                return Some("users_email_key");
            }
            if phone == Some(user.phone.as_str()) {
                return Some("users_phone_key");
            }
        }
        None
    }
}

/// `RwLock`-guarded map of user records with sequential ids starting at 1.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn exists(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.contains_key(&id))
    }
}

#[async_trait]
impl UserDirectory for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(constraint) = inner.conflict(Some(&user.email), Some(&user.phone), None) {
            return Err(StoreError::Conflict(constraint.to_string()));
        }
        inner.next_id += 1;
        let record = UserRecord {
            id: UserId(inner.next_id),
            email: user.email,
            name: user.name,
            phone: user.phone,
            password_hash: user.password_hash,
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(constraint) =
            inner.conflict(changes.email.as_deref(), changes.phone.as_deref(), Some(id))
        {
            return Err(StoreError::Conflict(constraint.to_string()));
        }
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.users.remove(&id).is_some())
    }
}

//! Account service — read, update and delete user records.

use tally_core::models::auth::{AuthorizedIdentity, UserChanges, UserId, UserRecord};
use tally_core::store::{CredentialStore, UserDirectory};
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::UpdateUserRequest;

/// Parse a `{uid}` path segment.
pub fn parse_uid(raw: &str) -> AppResult<UserId> {
    raw.parse::<UserId>()
        .map_err(|_| AppError::Validation("Failed to parse id from param".into()))
}

/// Drop absent and blank values.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fetch a user by id.
pub async fn get_user(state: &AppState, uid: UserId) -> AppResult<UserRecord> {
    state
        .store
        .find_by_id(uid)
        .await?
        .ok_or_else(|| AppError::NotFound("Can't find this user".into()))
}

/// Update the authorized user's profile. A new password is re-hashed.
///
/// Tokens issued before a password change stay valid until they expire.
pub async fn update_user(
    state: &AppState,
    identity: &AuthorizedIdentity,
    body: UpdateUserRequest,
) -> AppResult<UserRecord> {
    let target = identity.user_id();
    if let Some(id) = body.id
        && UserId(id) != target
    {
        return Err(AppError::Forbidden("Cannot update another user".into()));
    }

    let password_hash = match body.password.filter(|p| !p.is_empty()) {
        Some(password) => Some(state.hasher.hash(&password)?),
        None => None,
    };
    let changes = UserChanges {
        email: non_empty(body.email),
        name: non_empty(body.name),
        phone: non_empty(body.phone),
        password_hash,
    };
    let password_changed = changes.password_hash.is_some();

    let user = state
        .store
        .update(target, changes)
        .await?
        .ok_or_else(|| AppError::Validation("Can't find this user".into()))?;

    info!(user_id = %user.id, password_changed, "user updated");
    Ok(user)
}

/// Delete the authorized user's own account.
///
/// Existing tokens stop working immediately: validation re-checks that the
/// subject exists.
pub async fn delete_user(
    state: &AppState,
    identity: &AuthorizedIdentity,
    uid: UserId,
) -> AppResult<()> {
    if uid != identity.user_id() {
        return Err(AppError::Forbidden("Cannot delete another user".into()));
    }
    if !state.store.delete(uid).await? {
        return Err(AppError::NotFound("Can't find this user".into()));
    }
    info!(user_id = %uid, "user deleted");
    Ok(())
}

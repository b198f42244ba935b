//! Authentication service — register and login flows over `tally_core::auth`.

use tally_core::models::auth::{IssuedToken, NewUser, UserRecord};
use tally_core::store::{CredentialStore, UserDirectory};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::RegisterRequest;

/// Register a new user account with a bcrypt-hashed password.
pub async fn register(state: &AppState, body: RegisterRequest) -> AppResult<UserRecord> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }

    let password_hash = state.hasher.hash(&body.password)?;

    let user = state
        .store
        .create(NewUser {
            email: email.to_string(),
            name: body.name,
            phone: body.phone,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Authenticate with email + password and issue an access token.
///
/// Unknown email, wrong password and an unreadable stored hash all produce
/// the same [`AppError::InvalidCredentials`].
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<(UserRecord, IssuedToken)> {
    let Some(user) = state.store.find_by_email(email.trim()).await? else {
        return Err(AppError::InvalidCredentials);
    };

    match state.hasher.verify(password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::InvalidCredentials),
        Err(e) => {
            warn!(user_id = %user.id, "stored password hash unreadable: {e}");
            return Err(AppError::InvalidCredentials);
        }
    }

    let issued = state.issuer.issue(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok((user, issued))
}

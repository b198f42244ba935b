//! User account request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use tally_core::models::auth::AuthorizedIdentity;

use crate::AppState;
use crate::error::AppResult;
use crate::handlers::auth::read_body;
use crate::models::{MessageResponse, UpdateUserRequest, UserResponse};
use crate::services::users;

/// `PUT /update-user` — update the authorized user's profile.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthorizedIdentity>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    users::update_user(&state, &identity, read_body(body)?).await?;
    Ok(Json(MessageResponse::new("User data updated")))
}

/// `GET /get-user/{uid}` — fetch a user record.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = users::get_user(&state, users::parse_uid(&uid)?).await?;
    Ok(Json(UserResponse { user }))
}

/// `DELETE /delete-user/{uid}` — delete the authorized user's account.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthorizedIdentity>,
    Path(uid): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    users::delete_user(&state, &identity, users::parse_uid(&uid)?).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}

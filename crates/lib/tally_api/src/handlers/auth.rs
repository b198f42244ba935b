//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use tally_core::models::auth::AuthorizedIdentity;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ValidateTokenResponse,
};
use crate::services::{auth, cookies};

/// Unwrap a JSON body, turning any rejection into a 400.
pub(crate) fn read_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(b)| b)
        .map_err(|_| AppError::Validation("Failed to read body".into()))
}

/// `POST /register` — create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    auth::register(&state, read_body(body)?).await?;
    Ok(Json(MessageResponse::new("User created")))
}

/// `POST /login` — authenticate with email + password.
///
/// Returns the user and token, and sets the token as an httpOnly cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let body = read_body(body)?;
    let (user, issued) = auth::login(&state, &body.email, &body.password).await?;
    let jar = jar.add(cookies::access_cookie(
        &issued.token,
        state.config.secure_cookies,
    ));
    Ok((
        jar,
        Json(LoginResponse {
            user,
            token: issued.token,
        }),
    ))
}

/// `GET /validate-token` — echo the authorized user.
pub async fn validate_token_handler(
    Extension(identity): Extension<AuthorizedIdentity>,
) -> Json<ValidateTokenResponse> {
    Json(ValidateTokenResponse {
        message: identity.user,
    })
}

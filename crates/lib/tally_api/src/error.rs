//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tally_core::auth::AuthError;
use tally_core::store::StoreError;
use thiserror::Error;
use tracing::warn;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown email or wrong password. Deliberately does not say which.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Status, error code and client message for an auth failure.
///
/// Messages are fixed strings; the error's own detail is only logged.
fn auth_response(e: &AuthError) -> (StatusCode, &'static str, &'static str) {
    match e {
        AuthError::MissingIdentityHeader => (
            StatusCode::BAD_REQUEST,
            "missing_identity_header",
            "Failed to parse Uid from request headers",
        ),
        AuthError::MalformedIdentityHeader => (
            StatusCode::BAD_REQUEST,
            "malformed_identity_header",
            "Failed to parse Uid in header",
        ),
        AuthError::UnknownIdentity => (
            StatusCode::BAD_REQUEST,
            "unknown_identity",
            "Can't find this user",
        ),
        AuthError::MissingToken => (
            StatusCode::UNAUTHORIZED,
            "missing_token",
            "Failed to parse Authorization from header",
        ),
        AuthError::MalformedToken(_) => (
            StatusCode::UNAUTHORIZED,
            "malformed_token",
            "Invalid authorization token",
        ),
        AuthError::UnsupportedAlgorithm(_) => (
            StatusCode::UNAUTHORIZED,
            "unsupported_algorithm",
            "Invalid authorization token",
        ),
        AuthError::InvalidSignature => (
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            "Invalid authorization token",
        ),
        AuthError::TokenExpired => (
            StatusCode::UNAUTHORIZED,
            "token_expired",
            "Authorization token expired, please sign in again",
        ),
        AuthError::SubjectNotFound => (
            StatusCode::UNAUTHORIZED,
            "subject_not_found",
            "This user is not authorized",
        ),
        AuthError::HashingError(_) => (
            StatusCode::BAD_REQUEST,
            "hashing_error",
            "Failed to hash password",
        ),
        AuthError::SigningError(_) => (
            StatusCode::BAD_REQUEST,
            "signing_error",
            "Failed to create token",
        ),
        AuthError::CredentialStoreUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "credential_store_unavailable",
            "Credential store unavailable",
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid email or password",
            ),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::Auth(e) => {
                let (status, error, message) = auth_response(e);
                if matches!(
                    e,
                    AuthError::HashingError(_)
                        | AuthError::SigningError(_)
                        | AuthError::CredentialStoreUnavailable(_)
                ) {
                    warn!("{e}");
                }
                (status, error, message)
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => {
                AppError::Validation("Email or phone already registered".into())
            }
            StoreError::Unavailable(_) => AppError::Auth(e.into()),
        }
    }
}

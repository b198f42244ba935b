//! Authorization middleware — runs the gate chain in front of protected routes.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tally_core::auth::AuthRequest;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// Name of the unauthenticated identity header.
pub const IDENTITY_HEADER: &str = "uid";

/// Pull the identity header and token out of a request.
///
/// The token comes from the `Authorization` header, falling back to the
/// `Authorization` cookie. A header that is not valid UTF-8 is kept as an
/// empty value so the gate rejects it as malformed rather than missing.
pub fn auth_request(headers: &HeaderMap) -> AuthRequest {
    let identity_header = headers
        .get(IDENTITY_HEADER)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            CookieJar::from_headers(headers)
                .get(ACCESS_COOKIE)
                .map(|c| c.value().to_string())
        });

    AuthRequest::new(identity_header, authorization)
}

/// Axum middleware: runs the authorization chain and injects the
/// `AuthorizedIdentity` into request extensions. The handler never runs on
/// failure.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let credentials = auth_request(request.headers());

    let identity = state.chain.authorize(&credentials).await.map_err(|rejection| {
        debug!(
            gate = %rejection.gate,
            error = %rejection.error,
            path = %request.uri().path(),
            "request rejected"
        );
        AppError::Auth(rejection.error)
    })?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

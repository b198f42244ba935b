//! Cookie service — build the httpOnly access-token cookie.

use axum_extra::extract::cookie::{Cookie, SameSite};
use tally_core::auth::jwt::ACCESS_TOKEN_EXPIRY_DAYS;
use time::Duration;

/// Cookie name for the access token. Matches the header name clients use.
pub const ACCESS_COOKIE: &str = "Authorization";

/// Build a httpOnly, SameSite=Lax cookie carrying the access token (30 days).
pub fn access_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(ACCESS_TOKEN_EXPIRY_DAYS))
        .build()
}

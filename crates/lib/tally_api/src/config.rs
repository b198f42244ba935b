//! API server configuration.

use std::time::Duration;

use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderValue, Method};
use tally_core::auth::AuthConfig;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Preflight cache lifetime for credentialed CORS.
const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "0.0.0.0:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Browser origins allowed to call the API with credentials.
    /// Empty means any origin, without credentials.
    pub cors_origins: Vec<String>,
    /// Mark the auth cookie `Secure`.
    pub secure_cookies: bool,
    /// Token signing configuration.
    pub auth: AuthConfig,
}

impl ApiConfig {
    /// Local defaults around the given auth configuration.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: None,
            cors_origins: Vec::new(),
            secure_cookies: false,
            auth,
        }
    }

    /// Build the CORS layer for the configured origins.
    pub fn cors_layer(&self) -> CorsLayer {
        if self.cors_origins.is_empty() {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| {
                let origin = origin.trim().trim_end_matches('/');
                match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!(origin, "ignoring invalid CORS origin: {e}");
                        None
                    }
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::DELETE,
                Method::OPTIONS,
                Method::POST,
                Method::PATCH,
                Method::PUT,
            ])
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers([CONTENT_LENGTH])
            .allow_credentials(true)
            .max_age(CORS_MAX_AGE)
    }
}

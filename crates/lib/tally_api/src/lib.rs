//! # tally_api
//!
//! HTTP API library for Tally.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tally_core::auth::{AuthorizationChain, PasswordHasher, TokenIssuer};
use tally_core::store::{CredentialStore, UserDirectory};

use crate::config::ApiConfig;
use crate::handlers::{auth, hello, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User record store.
    pub store: Arc<dyn UserDirectory>,
    /// API configuration.
    pub config: ApiConfig,
    /// Password hasher (bcrypt).
    pub hasher: PasswordHasher,
    /// Access-token issuer.
    pub issuer: TokenIssuer,
    /// Gate chain for protected routes.
    pub chain: AuthorizationChain,
}

impl AppState {
    /// Wire the auth components around one store and one configuration.
    pub fn new(config: ApiConfig, store: Arc<dyn UserDirectory>) -> Self {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        Self {
            issuer: TokenIssuer::new(&config.auth),
            chain: AuthorizationChain::from_store(&config.auth, credentials),
            hasher: PasswordHasher::new(),
            store,
            config,
        }
    }

    /// Replace the password hasher (tests use a lower cost).
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = state.config.cors_layer();

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_ROOT, get(hello::root))
        .route(routes::POST_REGISTER, post(auth::register_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler));

    // Protected routes (identity header + token)
    let protected = Router::new()
        .route(routes::GET_VALIDATE_TOKEN, get(auth::validate_token_handler))
        .route(routes::PUT_UPDATE_USER, put(users::update_user_handler))
        .route(routes::GET_USER_UID, get(users::get_user_handler))
        .route(routes::DELETE_USER_UID, delete(users::delete_user_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

//! # tally_core
//!
//! Credential and session core for Tally: password hashing, access-token
//! issuance and validation, and the request authorization chain.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

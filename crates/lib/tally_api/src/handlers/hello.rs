//! Root endpoint.

use axum::Json;

use crate::models::RootResponse;

/// `GET /` — service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "tally-backend".into(),
        version: tally_core::version().into(),
    })
}

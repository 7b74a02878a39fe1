//! API handlers for CiviAI.
//!
//! Handlers stay thin: they validate the payload, call into the stores on
//! `AppState` and hand the result to `AppState::respond`, which renders
//! failures in the shared JSON error envelope.

pub mod auth;
pub mod ekyc;
pub mod health;
pub mod principal;
pub mod types;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::Uri,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{error::ApiError, state::AppState};

/// Unwrap a JSON body, turning extractor rejections into a 400.
pub(crate) fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// fallback for unknown routes
pub async fn not_found(uri: Uri, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    state.respond::<()>(Err(ApiError::NotFound(format!("Not Found - {}", uri.path()))))
}

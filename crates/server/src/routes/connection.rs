//! Connection check route.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;

use super::{MISSING_CREDENTIALS, StoreRequest, json_body, store_client};
use crate::error::AppError;
use crate::state::AppState;

/// Successful connection check.
#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Check that the credentials reach the store and its promotions.
///
/// POST /api/test-connection
///
/// # Errors
///
/// Returns 400 without credentials and 500 when either check fails.
pub async fn test_connection(
    State(state): State<AppState>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<ConnectionResponse>, AppError> {
    let request = json_body(body, MISSING_CREDENTIALS)?;
    let store = store_client(&state, &request.credentials, MISSING_CREDENTIALS)?;
    store.test_connection().await?;

    tracing::info!(store = %store.store_hash(), "Connection check passed");
    Ok(Json(ConnectionResponse {
        success: true,
        message: "Connection successful",
    }))
}

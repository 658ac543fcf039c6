//! Migration routes.
//!
//! `/api/migrate` and `/api/migrate-batch` share one handler and differ only
//! in concurrency. Either accepts `startIndex`/`batchSize` to migrate one
//! slice of `codes`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use coupon_migrator_core::types::Credentials;
use coupon_migrator_core::{BatchResult, CouponInput};

use super::{json_body, store_client};
use crate::error::AppError;
use crate::migrate::{MigrationOptions, migrate};
use crate::state::AppState;

const MISSING_CODES: &str = "Store hash, access token, and codes array are required";

/// Body of both migration routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub codes: Option<Value>,
    pub start_index: Option<usize>,
    pub batch_size: Option<usize>,
}

/// Outcome of one migration request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateResponse {
    pub success: bool,
    pub results: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_index: Option<usize>,
}

/// Migrate one item at a time.
///
/// POST /api/migrate
///
/// # Errors
///
/// Returns 400 without credentials or without a `codes` array.
pub async fn single(
    State(state): State<AppState>,
    body: Result<Json<MigrateRequest>, JsonRejection>,
) -> Result<Json<MigrateResponse>, AppError> {
    let request = json_body(body, MISSING_CODES)?;
    let options = state.sequential_migration();
    run(&state, request, options).await
}

/// Migrate with the configured concurrency.
///
/// POST /api/migrate-batch
///
/// # Errors
///
/// Returns 400 without credentials or without a `codes` array.
pub async fn batch(
    State(state): State<AppState>,
    body: Result<Json<MigrateRequest>, JsonRejection>,
) -> Result<Json<MigrateResponse>, AppError> {
    let request = json_body(body, MISSING_CODES)?;
    let options = state.batch_migration();
    run(&state, request, options).await
}

async fn run(
    state: &AppState,
    request: MigrateRequest,
    options: MigrationOptions,
) -> Result<Json<MigrateResponse>, AppError> {
    let Some(Value::Array(codes)) = request.codes else {
        return Err(AppError::BadRequest(MISSING_CODES));
    };
    let store = store_client(state, &request.credentials, MISSING_CODES)?;
    let items: Vec<CouponInput> = codes.into_iter().map(CouponInput::from_value).collect();

    let response = if request.start_index.is_none() && request.batch_size.is_none() {
        MigrateResponse {
            success: true,
            results: migrate(&store, &items, options).await,
            has_more: None,
            next_index: None,
        }
    } else {
        let start = request.start_index.unwrap_or(0);
        let end = start
            .saturating_add(request.batch_size.unwrap_or(items.len()))
            .min(items.len());
        let slice = items.get(start..end).unwrap_or_default();
        MigrateResponse {
            success: true,
            results: migrate(&store, slice, options).await,
            has_more: Some(end < items.len()),
            next_index: Some(end),
        }
    };

    Ok(Json(response))
}

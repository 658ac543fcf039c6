//! HTTP route handlers.
//!
//! # Route Structure
//!
//! Every route takes a JSON body carrying `storeHash` and `accessToken`
//! (plus an optional `channelId`) and answers with JSON. A body that is not
//! JSON or has a field of the wrong type gets the same 400 as a missing one.
//!
//! ```text
//! GET  /health                   - Health check
//!
//! # Connection
//! POST /api/test-connection      - Check store and promotions access
//!
//! # Export
//! POST /api/export-promotions    - List coupon promotions
//! POST /api/export               - Coupon promotions with their codes
//! POST /api/export-batch         - Index-batched export
//! POST /api/export-codes-batch   - Codes for a list of promotion IDs
//! POST /api/export-legacy-coupons - All V2 coupons
//!
//! # Migration
//! POST /api/migrate              - Migrate one item at a time
//! POST /api/migrate-batch        - Migrate with bounded concurrency
//! ```

pub mod connection;
pub mod export;
pub mod migrate;

use axum::{Json, Router, extract::rejection::JsonRejection, routing::post};
use serde::Deserialize;

use coupon_migrator_core::types::Credentials;

use crate::bigcommerce::StoreClient;
use crate::error::AppError;
use crate::state::AppState;

/// Message for requests without usable credentials.
pub const MISSING_CREDENTIALS: &str = "Store hash and access token are required";

/// Body of routes that need nothing beyond credentials.
#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
}

/// Unwrap a JSON body, answering 400 with `invalid` when it cannot be read.
fn json_body<T>(body: Result<Json<T>, JsonRejection>, invalid: &'static str) -> Result<T, AppError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest(invalid)
    })
}

/// Build a client for the request's store, or reject the request.
fn store_client(
    state: &AppState,
    credentials: &Credentials,
    missing: &'static str,
) -> Result<StoreClient, AppError> {
    if credentials.is_complete() {
        Ok(state.store(credentials))
    } else {
        Err(AppError::BadRequest(missing))
    }
}

/// Create the export routes router.
pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/export-promotions", post(export::promotions))
        .route("/export", post(export::promotions_with_codes))
        .route("/export-batch", post(export::batch))
        .route("/export-codes-batch", post(export::codes_batch))
        .route("/export-legacy-coupons", post(export::legacy_coupons))
}

/// Create the migration routes router.
pub fn migrate_routes() -> Router<AppState> {
    Router::new()
        .route("/migrate", post(migrate::single))
        .route("/migrate-batch", post(migrate::batch))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new().nest(
        "/api",
        Router::new()
            .route("/test-connection", post(connection::test_connection))
            .merge(export_routes())
            .merge(migrate_routes()),
    )
}

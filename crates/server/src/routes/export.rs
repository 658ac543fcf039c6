//! Export routes: read promotions, codes, and legacy coupons.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use coupon_migrator_core::types::{Credentials, PromotionId};
use coupon_migrator_core::vendor::{LegacyCoupon, PromotionCodes, PromotionExport};

use super::{MISSING_CREDENTIALS, StoreRequest, json_body, store_client};
use crate::bigcommerce::reader::{CouponPromotions, ExportBatch, PromotionSummary};
use crate::error::AppError;
use crate::state::AppState;

const MISSING_PROMOTION_IDS: &str =
    "Store hash, access token, and promotion IDs array are required";

// ============================================================================
// Request / response types
// ============================================================================

/// Coupon promotion listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionsResponse {
    pub success: bool,
    pub total_promotions: usize,
    pub total_coupon_promotions: usize,
    pub promotions: Vec<PromotionSummary>,
}

/// Coupon promotions with their codes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    pub data: Vec<PromotionExport>,
    pub total_promotions: usize,
    pub total_coupons: usize,
}

/// Body of the index-batched export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBatchRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub start_index: usize,
    pub batch_size: Option<usize>,
}

/// One step of the index-batched export.
#[derive(Debug, Serialize)]
pub struct ExportBatchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub batch: ExportBatch,
}

/// Body of the codes-by-ID export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodesBatchRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub promotion_ids: Option<Value>,
}

/// Codes of the requested promotions that could be read.
#[derive(Debug, Serialize)]
pub struct CodesBatchResponse {
    pub success: bool,
    pub data: Vec<PromotionCodes>,
}

/// All legacy coupons, as the V2 API returned them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCouponsResponse {
    pub success: bool,
    pub total_coupons: usize,
    pub coupons: Vec<LegacyCoupon>,
}

// ============================================================================
// Handlers
// ============================================================================

/// List coupon promotions.
///
/// POST /api/export-promotions
///
/// # Errors
///
/// Returns 400 without credentials and 500 if listing fails.
pub async fn promotions(
    State(state): State<AppState>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<PromotionsResponse>, AppError> {
    let request = json_body(body, MISSING_CREDENTIALS)?;
    let store = store_client(&state, &request.credentials, MISSING_CREDENTIALS)?;
    let CouponPromotions {
        promotions,
        total_promotions,
    } = store.list_coupon_promotions().await?;

    Ok(Json(PromotionsResponse {
        success: true,
        total_promotions,
        total_coupon_promotions: promotions.len(),
        promotions: promotions.iter().map(PromotionSummary::from).collect(),
    }))
}

/// Export every coupon promotion with its codes.
///
/// POST /api/export
///
/// # Errors
///
/// Returns 400 without credentials and 500 if listing fails.
pub async fn promotions_with_codes(
    State(state): State<AppState>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<ExportResponse>, AppError> {
    let request = json_body(body, MISSING_CREDENTIALS)?;
    let store = store_client(&state, &request.credentials, MISSING_CREDENTIALS)?;
    let CouponPromotions {
        promotions,
        total_promotions,
    } = store.list_coupon_promotions().await?;

    let data = store.export_promotions_with_codes(&promotions).await;
    let total_coupons = data.iter().map(|export| export.codes.len()).sum();

    Ok(Json(ExportResponse {
        success: true,
        data,
        total_promotions,
        total_coupons,
    }))
}

/// Index-batched export.
///
/// POST /api/export-batch
///
/// `startIndex` 0 lists the coupon promotions; later calls export one slice
/// of `batchSize` promotions with their codes.
///
/// # Errors
///
/// Returns 400 without credentials and 500 if listing fails.
pub async fn batch(
    State(state): State<AppState>,
    body: Result<Json<ExportBatchRequest>, JsonRejection>,
) -> Result<Json<ExportBatchResponse>, AppError> {
    let request = json_body(body, MISSING_CREDENTIALS)?;
    let store = store_client(&state, &request.credentials, MISSING_CREDENTIALS)?;
    let batch_size = request
        .batch_size
        .unwrap_or(state.config().export_batch_size);
    let batch = store.export_batch(request.start_index, batch_size).await?;

    Ok(Json(ExportBatchResponse {
        success: true,
        batch,
    }))
}

/// Export codes for the given promotion IDs, skipping any that fail.
///
/// POST /api/export-codes-batch
///
/// # Errors
///
/// Returns 400 without credentials or without a `promotionIds` array.
pub async fn codes_batch(
    State(state): State<AppState>,
    body: Result<Json<CodesBatchRequest>, JsonRejection>,
) -> Result<Json<CodesBatchResponse>, AppError> {
    let request = json_body(body, MISSING_PROMOTION_IDS)?;
    let Some(Value::Array(raw_ids)) = request.promotion_ids else {
        return Err(AppError::BadRequest(MISSING_PROMOTION_IDS));
    };
    let store = store_client(&state, &request.credentials, MISSING_PROMOTION_IDS)?;

    let ids: Vec<PromotionId> = raw_ids
        .into_iter()
        .filter_map(|raw| {
            serde_json::from_value(raw.clone())
                .inspect_err(|_| tracing::debug!(id = %raw, "Skipping invalid promotion id"))
                .ok()
        })
        .collect();
    let data = store.export_codes_for_ids(&ids).await;

    Ok(Json(CodesBatchResponse {
        success: true,
        data,
    }))
}

/// Export every legacy coupon.
///
/// POST /api/export-legacy-coupons
///
/// # Errors
///
/// Returns 400 without credentials and 500 if a page cannot be read.
pub async fn legacy_coupons(
    State(state): State<AppState>,
    body: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<Json<LegacyCouponsResponse>, AppError> {
    let request = json_body(body, MISSING_CREDENTIALS)?;
    let store = store_client(&state, &request.credentials, MISSING_CREDENTIALS)?;
    let coupons = store.list_all_legacy_coupons().await?;

    tracing::info!(store = %store.store_hash(), count = coupons.len(), "Legacy coupons exported");
    Ok(Json(LegacyCouponsResponse {
        success: true,
        total_coupons: coupons.len(),
        coupons,
    }))
}

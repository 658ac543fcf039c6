//! Client for the coupon migrator server's JSON API.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use coupon_migrator_core::types::{PromotionId, PromotionStatus, RedemptionType};
use coupon_migrator_core::vendor::{LegacyCoupon, PromotionExport};
use coupon_migrator_core::{BatchResult, CouponInput};

use crate::credentials::StoreCredentials;
use crate::error::CliError;

/// Default server address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Migration batches wait for every item, so allow long responses.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// A coupon promotion as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRow {
    pub id: PromotionId,
    pub name: String,
    pub redemption_type: RedemptionType,
    pub status: PromotionStatus,
}

/// First step of the batched export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionListing {
    pub total_promotions: usize,
    pub total_coupon_promotions: usize,
    pub promotions: Vec<PromotionRow>,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct LegacyCouponsResponse {
    coupons: Vec<LegacyCoupon>,
}

/// Coupon promotions with their codes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionsExport {
    pub data: Vec<PromotionExport>,
    pub total_promotions: usize,
    pub total_coupons: usize,
}

#[derive(Deserialize)]
struct MigrateResponse {
    results: BatchResult,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Server API client bound to one store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: StoreCredentials,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, credentials: StoreCredentials) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            credentials,
        })
    }

    /// Check that the stored credentials work.
    ///
    /// # Errors
    ///
    /// Returns the server's error message if the check fails.
    pub async fn test_connection(&self) -> Result<String, CliError> {
        let response: MessageResponse = self.post("/api/test-connection", json!({})).await?;
        Ok(response.message)
    }

    /// Every legacy coupon in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the export fails.
    pub async fn export_legacy_coupons(&self) -> Result<Vec<LegacyCoupon>, CliError> {
        let response: LegacyCouponsResponse =
            self.post("/api/export-legacy-coupons", json!({})).await?;
        Ok(response.coupons)
    }

    /// The store's coupon promotions, without codes.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list_coupon_promotions(&self) -> Result<PromotionListing, CliError> {
        self.post("/api/export-batch", json!({ "startIndex": 0 }))
            .await
    }

    /// Every coupon promotion with its codes.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn export_promotions(&self) -> Result<PromotionsExport, CliError> {
        self.post("/api/export", json!({})).await
    }

    /// Migrate one batch of coupons.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects or fails the whole batch.
    pub async fn migrate_batch(&self, items: &[CouponInput]) -> Result<BatchResult, CliError> {
        let response: MigrateResponse = self
            .post("/api/migrate-batch", json!({ "codes": items }))
            .await?;
        Ok(response.results)
    }

    async fn post<T: DeserializeOwned>(&self, route: &str, fields: Value) -> Result<T, CliError> {
        let mut body = json!({
            "storeHash": self.credentials.store_hash,
            "accessToken": self.credentials.access_token.expose_secret(),
            "channelId": self.credentials.channel_id,
        });
        if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
            body.extend(fields);
        }

        tracing::debug!(route, "POST");
        let response = self
            .http
            .post(format!("{}{route}", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(CliError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

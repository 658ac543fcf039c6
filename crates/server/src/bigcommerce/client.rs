//! Throttled request gateway for one store.

use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use coupon_migrator_core::types::{
    ChannelId, Credentials, LegacyCouponId, PromotionCodeId, PromotionId,
};
use coupon_migrator_core::vendor::{Envelope, NewPromotion, NewPromotionCode};

use super::BigCommerceError;
use crate::rate_limit::{ApiVersion, RequestThrottle};

/// BigCommerce API client bound to one store's credentials.
///
/// Built per request from the shared HTTP client and throttle, so cloning
/// and dropping it is cheap.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    throttle: RequestThrottle,
    base_url: String,
    store_hash: String,
    access_token: SecretString,
    channel: ChannelId,
}

#[derive(serde::Deserialize)]
struct Created<Id> {
    id: Id,
}

impl StoreClient {
    /// Create a client for the store identified by `credentials`.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        throttle: RequestThrottle,
        api_base: &str,
        credentials: &Credentials,
    ) -> Self {
        let store_hash = credentials.store_hash.trim().to_string();
        Self {
            http,
            throttle,
            base_url: format!("{}/stores/{store_hash}", api_base.trim_end_matches('/')),
            store_hash,
            access_token: SecretString::from(credentials.access_token.trim().to_string()),
            channel: credentials.channel(),
        }
    }

    #[must_use]
    pub fn store_hash(&self) -> &str {
        &self.store_hash
    }

    /// Channel new promotions are created on.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Send one throttled request.
    ///
    /// Returns `None` for `204 No Content`.
    async fn send(
        &self,
        version: ApiVersion,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Response>, BigCommerceError> {
        self.throttle.acquire(version, &self.store_hash).await;

        let url = format!("{}/{version}{path}", self.base_url);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("X-Auth-Token", self.access_token.expose_secret())
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(BigCommerceError::Network)?;
        let status = response.status();
        tracing::debug!(%method, %version, path, status = status.as_u16(), "BigCommerce request");

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BigCommerceError::api(status.as_u16(), &text));
        }
        Ok(Some(response))
    }

    /// Send a request and decode its JSON body.
    ///
    /// Returns `None` for `204 No Content` or an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-success status, a transport failure, or a
    /// body that is not the expected JSON.
    pub async fn request<T: DeserializeOwned>(
        &self,
        version: ApiVersion,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, BigCommerceError> {
        let Some(response) = self.send(version, method, path, body).await? else {
            return Ok(None);
        };
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| BigCommerceError::Parse(format!("{path}: {e}")))
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`StoreClient::request`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        version: ApiVersion,
        path: &str,
    ) -> Result<Option<T>, BigCommerceError> {
        self.request(version, Method::GET, path, None).await
    }

    /// POST a JSON body and decode the required JSON response.
    ///
    /// # Errors
    ///
    /// See [`StoreClient::request`]; an empty response is also an error.
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        version: ApiVersion,
        path: &str,
        body: &B,
    ) -> Result<T, BigCommerceError> {
        let body = serde_json::to_value(body).map_err(|e| BigCommerceError::Parse(e.to_string()))?;
        self.request(version, Method::POST, path, Some(body))
            .await?
            .ok_or_else(|| BigCommerceError::EmptyResponse(path.to_string()))
    }

    /// DELETE a resource, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-success status or a transport failure.
    pub async fn delete(&self, version: ApiVersion, path: &str) -> Result<(), BigCommerceError> {
        self.send(version, Method::DELETE, path, None).await.map(drop)
    }

    // =========================================================================
    // Migration operations
    // =========================================================================

    /// Delete a V2 legacy coupon. A coupon that is already gone counts as
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than `404 Not Found`.
    #[instrument(skip(self), fields(store = %self.store_hash))]
    pub async fn delete_legacy_coupon(&self, id: LegacyCouponId) -> Result<(), BigCommerceError> {
        match self.delete(ApiVersion::V2, &format!("/coupons/{id}")).await {
            Err(err) if err.status() == Some(404) => {
                tracing::debug!(%id, "Legacy coupon already deleted");
                Ok(())
            }
            other => other,
        }
    }

    /// Delete a V3 promotion together with its codes.
    ///
    /// Failures deleting individual codes are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the codes cannot be listed or the promotion
    /// cannot be deleted.
    #[instrument(skip(self), fields(store = %self.store_hash))]
    pub async fn delete_promotion(&self, id: PromotionId) -> Result<(), BigCommerceError> {
        for code in self.fetch_codes_for_promotion(id).await? {
            let path = format!("/promotions/{id}/codes/{}", code.id);
            if let Err(err) = self.delete(ApiVersion::V3, &path).await {
                tracing::debug!(promotion_id = %id, code_id = %code.id, error = %err, "Could not delete promotion code");
            }
        }
        self.delete(ApiVersion::V3, &format!("/promotions/{id}")).await
    }

    /// Create a V3 promotion.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the promotion.
    pub async fn create_promotion(
        &self,
        promotion: &NewPromotion,
    ) -> Result<PromotionId, BigCommerceError> {
        let created: Envelope<Created<PromotionId>> =
            self.post(ApiVersion::V3, "/promotions", promotion).await?;
        Ok(created.data.id)
    }

    /// Attach a coupon code to a V3 promotion.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the code.
    pub async fn create_promotion_code(
        &self,
        promotion_id: PromotionId,
        code: &NewPromotionCode,
    ) -> Result<PromotionCodeId, BigCommerceError> {
        let created: Envelope<Created<PromotionCodeId>> = self
            .post(ApiVersion::V3, &format!("/promotions/{promotion_id}/codes"), code)
            .await?;
        Ok(created.data.id)
    }
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

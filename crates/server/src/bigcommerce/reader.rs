//! Paginated reads of promotions, promotion codes, and legacy coupons.

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use coupon_migrator_core::types::{PromotionId, PromotionStatus, RedemptionType};
use coupon_migrator_core::vendor::{
    Envelope, LegacyCoupon, LegacyCouponBatch, LegacyCouponPage, PAGE_LIMIT, Promotion, PromotionCode,
    PromotionCodes, PromotionExport,
};

use super::{BigCommerceError, StoreClient};
use crate::rate_limit::ApiVersion;

/// Promotion metadata without rules, as listed by the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionSummary {
    pub id: PromotionId,
    pub name: String,
    pub redemption_type: RedemptionType,
    pub status: PromotionStatus,
}

impl From<&Promotion> for PromotionSummary {
    fn from(p: &Promotion) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            redemption_type: p.redemption_type,
            status: p.status,
        }
    }
}

/// Coupon promotions plus the count of all promotions.
#[derive(Debug, Clone)]
pub struct CouponPromotions {
    pub promotions: Vec<Promotion>,
    pub total_promotions: usize,
}

/// One step of the index-batched export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportBatch {
    /// First call: what there is to export.
    #[serde(rename_all = "camelCase")]
    Listing {
        total_promotions: usize,
        total_coupon_promotions: usize,
        promotions: Vec<PromotionSummary>,
    },
    /// Later calls: one slice of promotions with their codes.
    #[serde(rename_all = "camelCase")]
    Slice {
        data: Vec<PromotionExport>,
        has_more: bool,
        next_index: usize,
        processed: usize,
        total: usize,
    },
}

/// Connection check failures, phrased for the user.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Invalid credentials or store not found")]
    Store(#[source] BigCommerceError),
    #[error("Promotions API access denied: {body}")]
    Promotions {
        body: String,
        #[source]
        source: BigCommerceError,
    },
}

impl StoreClient {
    /// Every V3 promotion, in page order.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails.
    #[instrument(skip(self), fields(store = %self.store_hash()))]
    pub async fn list_all_promotions(&self) -> Result<Vec<Promotion>, BigCommerceError> {
        let mut promotions = Vec::new();
        let mut page = 1;

        loop {
            let path = format!("/promotions?page={page}&limit={PAGE_LIMIT}");
            let Some(envelope) = self.get::<Envelope<Vec<Promotion>>>(ApiVersion::V3, &path).await?
            else {
                break;
            };
            promotions.extend(envelope.data);

            match envelope.meta.and_then(|m| m.total_pages()) {
                Some(total_pages) if page < total_pages => page += 1,
                _ => break,
            }
        }

        tracing::info!(count = promotions.len(), pages = page, "Listed promotions");
        Ok(promotions)
    }

    /// V3 promotions redeemed with a code.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails.
    pub async fn list_coupon_promotions(&self) -> Result<CouponPromotions, BigCommerceError> {
        let all = self.list_all_promotions().await?;
        let total_promotions = all.len();
        let promotions = all.into_iter().filter(Promotion::is_coupon).collect();
        Ok(CouponPromotions {
            promotions,
            total_promotions,
        })
    }

    /// Every V2 legacy coupon, in page order.
    ///
    /// Stops at a short page, an empty page, an unrecognized page, or the
    /// reported page count.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails or holds a record that is not a
    /// legacy coupon.
    #[instrument(skip(self), fields(store = %self.store_hash()))]
    pub async fn list_all_legacy_coupons(&self) -> Result<Vec<LegacyCoupon>, BigCommerceError> {
        let mut coupons = Vec::new();
        let mut page: u32 = 1;

        loop {
            let path = format!("/coupons?page={page}&limit={PAGE_LIMIT}");
            let Some(body) = self.get::<LegacyCouponPage>(ApiVersion::V2, &path).await? else {
                break;
            };

            let decoded = body
                .into_batch()
                .map_err(|err| BigCommerceError::Parse(format!("legacy coupon page {page}, {err}")))?;
            let Some(LegacyCouponBatch {
                coupons: batch,
                total_pages,
            }) = decoded
            else {
                tracing::warn!(page, "Unrecognized legacy coupon page");
                break;
            };

            let full_page = batch.len() == PAGE_LIMIT as usize;
            coupons.extend(batch);

            if !full_page || total_pages.is_some_and(|total| page >= total) {
                break;
            }
            page += 1;
        }

        tracing::info!(count = coupons.len(), pages = page, "Listed legacy coupons");
        Ok(coupons)
    }

    /// Codes attached to one promotion.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn fetch_codes_for_promotion(
        &self,
        id: PromotionId,
    ) -> Result<Vec<PromotionCode>, BigCommerceError> {
        let envelope = self
            .get::<Envelope<Vec<PromotionCode>>>(ApiVersion::V3, &format!("/promotions/{id}/codes"))
            .await?;
        Ok(envelope.map(|e| e.data).unwrap_or_default())
    }

    /// Pair each promotion with its codes. Promotions whose codes cannot be
    /// read are left out.
    pub async fn export_promotions_with_codes(&self, promotions: &[Promotion]) -> Vec<PromotionExport> {
        let mut exports = Vec::with_capacity(promotions.len());
        for promotion in promotions {
            match self.fetch_codes_for_promotion(promotion.id).await {
                Ok(codes) => exports.push(PromotionExport {
                    promotion: promotion.clone(),
                    codes,
                }),
                Err(err) => {
                    tracing::debug!(promotion_id = %promotion.id, error = %err, "Skipping promotion codes");
                }
            }
        }
        exports
    }

    /// Codes for each promotion ID. IDs whose codes cannot be read are left
    /// out.
    pub async fn export_codes_for_ids(&self, ids: &[PromotionId]) -> Vec<PromotionCodes> {
        let mut exports = Vec::with_capacity(ids.len());
        for &promotion_id in ids {
            match self.fetch_codes_for_promotion(promotion_id).await {
                Ok(codes) => exports.push(PromotionCodes {
                    promotion_id,
                    codes,
                }),
                Err(err) => {
                    tracing::debug!(%promotion_id, error = %err, "Skipping promotion codes");
                }
            }
        }
        exports
    }

    /// One step of the index-batched export.
    ///
    /// With `start_index == 0` this lists the coupon promotions; otherwise it
    /// exports codes for the promotions in `start_index..start_index + batch_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if listing promotions fails.
    #[instrument(skip(self), fields(store = %self.store_hash()))]
    pub async fn export_batch(
        &self,
        start_index: usize,
        batch_size: usize,
    ) -> Result<ExportBatch, BigCommerceError> {
        let CouponPromotions {
            promotions,
            total_promotions,
        } = self.list_coupon_promotions().await?;

        if start_index == 0 {
            return Ok(ExportBatch::Listing {
                total_promotions,
                total_coupon_promotions: promotions.len(),
                promotions: promotions.iter().map(PromotionSummary::from).collect(),
            });
        }

        let end = start_index.saturating_add(batch_size);
        let slice = promotions
            .get(start_index..end.min(promotions.len()))
            .unwrap_or_default();
        let data = self.export_promotions_with_codes(slice).await;

        Ok(ExportBatch::Slice {
            data,
            has_more: end < promotions.len(),
            next_index: end,
            processed: end,
            total: promotions.len(),
        })
    }

    /// Check that the credentials can read the store and its promotions.
    ///
    /// # Errors
    ///
    /// Returns which of the two checks failed.
    #[instrument(skip(self), fields(store = %self.store_hash()))]
    pub async fn test_connection(&self) -> Result<(), ConnectionError> {
        self.get::<Value>(ApiVersion::V2, "/store")
            .await
            .map_err(ConnectionError::Store)?;

        self.get::<Value>(ApiVersion::V3, "/promotions?limit=1")
            .await
            .map_err(|source| ConnectionError::Promotions {
                body: match &source {
                    BigCommerceError::Api { body, .. } => body.clone(),
                    other => other.to_string(),
                },
                source,
            })?;

        Ok(())
    }
}

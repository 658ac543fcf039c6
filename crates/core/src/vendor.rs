//! BigCommerce resource shapes.
//!
//! Field names follow the vendor's snake_case JSON. Only the fields the
//! migrator reads are typed; promotion rules are kept as raw JSON so an
//! export carries them through unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{
    ChannelId, LegacyCouponId, PromotionCodeId, PromotionId, PromotionStatus, RedemptionType,
};

/// Page size used for every list endpoint.
pub const PAGE_LIMIT: u32 = 250;

// =============================================================================
// V3 Promotions
// =============================================================================

/// A V3 promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    #[serde(default)]
    pub name: String,
    pub redemption_type: RedemptionType,
    #[serde(default)]
    pub status: PromotionStatus,
    #[serde(default)]
    pub rules: Vec<Value>,
}

impl Promotion {
    /// Whether the promotion is redeemed with a code.
    #[must_use]
    pub fn is_coupon(&self) -> bool {
        self.redemption_type == RedemptionType::Coupon
    }
}

/// A coupon code attached to a V3 promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionCode {
    pub id: PromotionCodeId,
    pub code: String,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub current_uses: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// A promotion together with its codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionExport {
    pub promotion: Promotion,
    pub codes: Vec<PromotionCode>,
}

/// The codes of one promotion, keyed by ID only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionCodes {
    pub promotion_id: PromotionId,
    pub codes: Vec<PromotionCode>,
}

/// Body for `POST /v3/promotions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPromotion {
    pub name: String,
    pub channels: Vec<ChannelRef>,
    pub rules: Vec<PromotionRule>,
    pub redemption_type: RedemptionType,
    pub status: PromotionStatus,
}

/// Reference to a storefront channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelRef {
    pub id: ChannelId,
}

/// A single promotion rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionRule {
    pub action: RuleAction,
}

/// What a rule discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Discount the cart total.
    CartValue { discount: RuleDiscount },
    /// Discount every item in the cart.
    CartItems { discount: RuleDiscount },
}

/// Discount amount of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDiscount {
    FixedAmount(#[serde(with = "rust_decimal::serde::float")] Decimal),
    PercentageAmount(#[serde(with = "rust_decimal::serde::float")] Decimal),
}

/// Body for `POST /v3/promotions/{id}/codes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPromotionCode {
    pub code: String,
    pub max_uses: Option<i64>,
}

// =============================================================================
// V2 Legacy Coupons
// =============================================================================

/// A V2 legacy coupon.
///
/// Fields the migrator does not read are preserved in `extra` so an export
/// round-trips the vendor's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyCoupon {
    pub id: LegacyCouponId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub coupon_type: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub min_purchase: Option<Decimal>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub num_uses: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Envelopes
// =============================================================================

/// V3 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// V3 response metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// V3 pagination block.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
    pub total_pages: u32,
}

impl Meta {
    /// Total page count, if the response reported one.
    #[must_use]
    pub fn total_pages(&self) -> Option<u32> {
        self.pagination.map(|p| p.total_pages)
    }
}

/// One page of V2 legacy coupons.
///
/// The V2 listing returns a bare array, but some deployments wrap it the V3
/// way. Items are decoded by [`LegacyCouponPage::into_batch`] so one bad
/// record fails the page instead of hiding it. A body that is neither shape
/// is treated as the end of the listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyCouponPage {
    Bare(Vec<Value>),
    Wrapped {
        data: Vec<Value>,
        #[serde(default)]
        meta: Option<Value>,
    },
    Unrecognized(Value),
}

/// Decoded coupons of one V2 page.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCouponBatch {
    pub coupons: Vec<LegacyCoupon>,
    /// Page count reported by a wrapped page.
    pub total_pages: Option<u32>,
}

impl LegacyCouponPage {
    /// Decode every coupon on the page. `Ok(None)` for an unrecognized body.
    ///
    /// # Errors
    ///
    /// Returns the first item that is not a legacy coupon, with its position.
    pub fn into_batch(self) -> Result<Option<LegacyCouponBatch>, serde_json::Error> {
        let (items, total_pages) = match self {
            Self::Bare(items) => (items, None),
            Self::Wrapped { data, meta } => (
                data,
                meta.and_then(|m| serde_json::from_value::<Meta>(m).ok())
                    .and_then(|m| m.total_pages()),
            ),
            Self::Unrecognized(_) => return Ok(None),
        };

        let coupons = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item).map_err(|err| {
                    <serde_json::Error as serde::de::Error>::custom(format!("item {index}: {err}"))
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Some(LegacyCouponBatch {
            coupons,
            total_pages,
        }))
    }
}

/// `null` reads as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_rule_serializes_as_flat_cart_value_amount() {
        let rule = PromotionRule {
            action: RuleAction::CartValue {
                discount: RuleDiscount::FixedAmount(Decimal::new(15, 0)),
            },
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"action": {"cart_value": {"discount": {"fixed_amount": 15.0}}}})
        );
    }

    #[test]
    fn test_new_code_serializes_null_max_uses() {
        let body = NewPromotionCode {
            code: "SAVE10".to_string(),
            max_uses: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"code": "SAVE10", "max_uses": null})
        );
    }

    #[test]
    fn test_legacy_coupon_parses_string_amounts_and_keeps_extra_fields() {
        let coupon: LegacyCoupon = serde_json::from_value(json!({
            "id": 5,
            "name": "Spring",
            "code": "SPRING",
            "type": "fixed_discount",
            "amount": "12.5000",
            "min_purchase": "0.0000",
            "enabled": true,
            "max_uses": 0,
            "num_uses": 3,
            "applies_to": {"entity": "categories", "ids": [0]}
        }))
        .unwrap();

        assert_eq!(coupon.amount, Some(Decimal::new(125, 1)));
        assert_eq!(coupon.coupon_type, "fixed_discount");
        assert!(coupon.extra.contains_key("applies_to"));
    }

    #[test]
    fn test_legacy_page_shapes() {
        let bare: LegacyCouponPage = serde_json::from_value(json!([{"id": 1, "code": "A"}])).unwrap();
        let batch = bare.into_batch().unwrap().unwrap();
        assert_eq!(batch.coupons.len(), 1);
        assert_eq!(batch.total_pages, None);

        let wrapped: LegacyCouponPage = serde_json::from_value(
            json!({"data": [{"id": 1, "code": "A"}], "meta": {"pagination": {"total_pages": 4}}}),
        )
        .unwrap();
        assert_eq!(wrapped.into_batch().unwrap().unwrap().total_pages, Some(4));

        let other: LegacyCouponPage = serde_json::from_value(json!({"status": 500})).unwrap();
        assert!(other.into_batch().unwrap().is_none());
    }

    #[test]
    fn test_legacy_nulls_read_as_defaults() {
        let coupon: LegacyCoupon = serde_json::from_value(
            json!({"id": 3, "code": null, "type": null, "enabled": null, "amount": null}),
        )
        .unwrap();
        assert_eq!(coupon.code, "");
        assert!(!coupon.enabled);
        assert_eq!(coupon.amount, None);
    }

    #[test]
    fn test_undecodable_legacy_item_fails_the_page() {
        let page: LegacyCouponPage =
            serde_json::from_value(json!([{"id": 1, "code": "OK"}, {"id": "not-a-number"}])).unwrap();
        let err = page.into_batch().unwrap_err();
        assert!(err.to_string().starts_with("item 1:"));
    }

    #[test]
    fn test_promotion_tolerates_missing_optional_fields() {
        let promotion: Promotion =
            serde_json::from_value(json!({"id": 9, "redemption_type": "COUPON"})).unwrap();
        assert!(promotion.is_coupon());
        assert!(promotion.rules.is_empty());
    }
}

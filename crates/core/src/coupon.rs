//! The unified coupon descriptor.
//!
//! A [`Coupon`] is what the migrator moves: a code plus the discount it
//! grants, and optionally the ID of the resource it replaces. Descriptors
//! come from a V2 export, a V3 export, or a hand-edited import file, so
//! parsing is deliberately forgiving. Field aliases are accepted, blanks and
//! zeros fall back to defaults, and an item whose code is not a string is
//! kept as a [`CouponInput::Malformed`] instead of failing the whole batch.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::types::{ChannelId, DiscountType, LegacyCouponId, PromotionId, PromotionStatus, RedemptionType};
use crate::vendor::{
    ChannelRef, LegacyCoupon, NewPromotion, NewPromotionCode, PromotionExport, PromotionRule,
    RuleAction, RuleDiscount,
};

/// Discount applied when a descriptor has none, or has zero.
pub const DEFAULT_DISCOUNT: Decimal = Decimal::TEN;

/// A coupon to migrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    pub discount_type: DiscountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_promotion_id: Option<PromotionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_coupon_id: Option<LegacyCouponId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "max_uses")]
    pub max_uses: Option<i64>,
}

impl Coupon {
    /// A percentage coupon with the default discount.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            discount: DEFAULT_DISCOUNT,
            discount_type: DiscountType::default(),
            old_promotion_id: None,
            old_coupon_id: None,
            name: None,
            max_uses: None,
        }
    }

    /// Normalize one JSON item.
    ///
    /// The code is read from `code`, then `coupon_code`, then the item
    /// itself when it is a bare string, and is sent to the store unchanged.
    /// Returns `None` when none of those yields a non-empty string.
    #[must_use]
    pub fn from_json(item: &Value) -> Option<Self> {
        let code = match item {
            Value::String(s) => s.as_str(),
            Value::Object(_) => {
                let field = truthy(item.get("code")).or_else(|| truthy(item.get("coupon_code")))?;
                field.as_str()?
            }
            _ => return None,
        };
        if code.is_empty() {
            return None;
        }

        let mut coupon = Self::new(code);
        if !item.is_object() {
            return Some(coupon);
        }

        if let Some(discount) = truthy(item.get("discount")).and_then(lenient_decimal) {
            coupon.discount = discount;
        }
        coupon.discount = or_default_discount(coupon.discount);

        coupon.discount_type = truthy(item.get("discountType"))
            .or_else(|| truthy(item.get("discount_type")))
            .and_then(Value::as_str)
            .map(DiscountType::from_loose)
            .unwrap_or_default();

        coupon.old_coupon_id = truthy(item.get("oldCouponId"))
            .or_else(|| truthy(item.get("Coupon ID")))
            .and_then(lenient_id)
            .map(LegacyCouponId::new);
        coupon.old_promotion_id = truthy(item.get("oldPromotionId"))
            .and_then(lenient_id)
            .map(PromotionId::new);

        coupon.name = ["name", "promotion_name", "Coupon Name"]
            .into_iter()
            .find_map(|key| truthy(item.get(key)).and_then(Value::as_str))
            .map(str::to_string);

        coupon.max_uses = item.get("max_uses").and_then(lenient_max_uses);

        Some(coupon)
    }

    /// Convert a V2 legacy coupon.
    ///
    /// Returns `None` for a coupon without a code.
    #[must_use]
    pub fn from_legacy(legacy: &LegacyCoupon) -> Option<Self> {
        let code = legacy.code.trim();
        if code.is_empty() {
            return None;
        }

        let mut coupon = Self::new(code);
        coupon.discount_type =
            DiscountType::from_legacy_type(&legacy.coupon_type).unwrap_or_default();
        coupon.discount = or_default_discount(legacy.amount.unwrap_or(DEFAULT_DISCOUNT));
        coupon.old_coupon_id = Some(legacy.id);
        coupon.name = legacy.name.clone().filter(|n| !n.trim().is_empty());
        coupon.max_uses = legacy.max_uses.filter(|&n| n > 0);
        Some(coupon)
    }

    /// Convert a V3 promotion export into one descriptor per code.
    ///
    /// The discount is read back from the promotion's first rule.
    #[must_use]
    pub fn from_promotion_export(export: &PromotionExport) -> Vec<Self> {
        let (discount_type, discount) = export
            .promotion
            .rules
            .first()
            .and_then(discount_from_rule)
            .unwrap_or((DiscountType::default(), DEFAULT_DISCOUNT));
        let name = Some(export.promotion.name.clone()).filter(|n| !n.trim().is_empty());

        export
            .codes
            .iter()
            .filter(|c| !c.code.trim().is_empty())
            .map(|c| Self {
                code: c.code.trim().to_string(),
                discount: or_default_discount(discount),
                discount_type,
                old_promotion_id: Some(export.promotion.id),
                old_coupon_id: None,
                name: name.clone(),
                max_uses: c.max_uses.filter(|&n| n > 0),
            })
            .collect()
    }

    /// Body for creating the replacement promotion.
    #[must_use]
    pub fn to_new_promotion(&self, channel: ChannelId) -> NewPromotion {
        let action = match self.discount_type {
            DiscountType::Fixed => RuleAction::CartValue {
                discount: RuleDiscount::FixedAmount(self.discount),
            },
            DiscountType::PerItem => RuleAction::CartItems {
                discount: RuleDiscount::PercentageAmount(self.discount),
            },
            DiscountType::Percentage => RuleAction::CartValue {
                discount: RuleDiscount::PercentageAmount(self.discount),
            },
        };

        NewPromotion {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| format!("Coupon: {}", self.code)),
            channels: vec![ChannelRef { id: channel }],
            rules: vec![PromotionRule { action }],
            redemption_type: RedemptionType::Coupon,
            status: PromotionStatus::Enabled,
        }
    }

    /// Body for attaching the code to the replacement promotion.
    #[must_use]
    pub fn to_new_code(&self) -> NewPromotionCode {
        NewPromotionCode {
            code: self.code.clone(),
            max_uses: self.max_uses.filter(|&n| n > 0),
        }
    }
}

impl<'de> Deserialize<'de> for Coupon {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom("coupon code is missing or not a string"))
    }
}

/// One item of a migration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponInput {
    Coupon(Coupon),
    /// The item's code was not a usable string. Holds the item as received.
    Malformed(Value),
}

impl CouponInput {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Coupon::from_json(&value).map_or(Self::Malformed(value), Self::Coupon)
    }

    /// The code used to report this item.
    ///
    /// For a malformed item this is the item's JSON text.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::Coupon(c) => c.code.clone(),
            Self::Malformed(raw) => raw.to_string(),
        }
    }
}

impl From<Coupon> for CouponInput {
    fn from(coupon: Coupon) -> Self {
        Self::Coupon(coupon)
    }
}

impl Serialize for CouponInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Coupon(c) => c.serialize(serializer),
            Self::Malformed(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CouponInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

// =============================================================================
// Lenient field parsing
// =============================================================================

/// Filter out `null`, `false`, `0`, and `""`.
fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Zero and negative discounts fall back to the default.
fn or_default_discount(discount: Decimal) -> Decimal {
    if discount > Decimal::ZERO {
        discount
    } else {
        DEFAULT_DISCOUNT
    }
}

/// Parse a decimal from a number, or from a string that may carry a `$`
/// prefix or `%` suffix.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim().trim_start_matches('$').trim_end_matches('%').trim();
    s.parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

fn lenient_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn lenient_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|&id| id != 0)
}

/// `"Unlimited"`, blanks, zero, and anything unparsable mean no limit.
pub(crate) fn parse_max_uses(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("unlimited") {
        return None;
    }
    s.parse::<i64>().ok().filter(|&n| n > 0)
}

fn lenient_max_uses(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().filter(|&n| n > 0),
        Value::String(s) => parse_max_uses(s),
        _ => None,
    }
}

/// Read the discount kind and amount back out of a V3 rule.
fn discount_from_rule(rule: &Value) -> Option<(DiscountType, Decimal)> {
    let action = rule.get("action")?;
    let (target, per_item) = action
        .get("cart_value")
        .map(|t| (t, false))
        .or_else(|| action.get("cart_items").map(|t| (t, true)))?;
    let discount = target.get("discount")?;

    if let Some(amount) = discount.get("fixed_amount").and_then(lenient_decimal) {
        Some((DiscountType::Fixed, amount))
    } else {
        let amount = discount.get("percentage_amount").and_then(lenient_decimal)?;
        let kind = if per_item {
            DiscountType::PerItem
        } else {
            DiscountType::Percentage
        };
        Some((kind, amount))
    }
}

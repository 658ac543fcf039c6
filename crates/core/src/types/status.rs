//! Status enums for BigCommerce promotions.

use serde::{Deserialize, Serialize};

/// How a V3 promotion is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionType {
    /// Applied automatically when the cart qualifies.
    Automatic,
    /// Applied when the shopper enters a code.
    Coupon,
    /// A value this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Whether a V3 promotion is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    #[default]
    Enabled,
    Disabled,
    Invalid,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "ENABLED"),
            Self::Disabled => write!(f, "DISABLED"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_redemption_type_unknown_value() {
        let value: RedemptionType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(value, RedemptionType::Unknown);
        let coupon: RedemptionType = serde_json::from_str("\"COUPON\"").unwrap();
        assert_eq!(coupon, RedemptionType::Coupon);
    }
}

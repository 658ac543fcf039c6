//! Discount kinds shared by legacy coupons and V3 promotions.

use serde::{Deserialize, Serialize};

/// How a coupon's discount amount is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage off the cart value.
    #[default]
    Percentage,
    /// Flat amount off the cart value.
    Fixed,
    /// Percentage off each cart item.
    PerItem,
}

impl DiscountType {
    /// Map a V2 legacy coupon `type` to a discount type.
    ///
    /// Returns `None` for legacy types that have no V3 equivalent here
    /// (shipping discounts, free shipping, ...).
    #[must_use]
    pub fn from_legacy_type(s: &str) -> Option<Self> {
        match s {
            "percentage_discount" | "percentage" => Some(Self::Percentage),
            "fixed_discount" | "fixed" => Some(Self::Fixed),
            "per_item_discount" | "per_item" => Some(Self::PerItem),
            _ => None,
        }
    }

    /// Parse a free-text type column, as found in spreadsheet exports.
    ///
    /// Anything mentioning "fixed" is fixed, anything mentioning "per item"
    /// is per-item, everything else is a percentage.
    #[must_use]
    pub fn from_loose(s: &str) -> Self {
        let lower = s.to_lowercase();
        if lower.contains("fixed") {
            Self::Fixed
        } else if lower.contains("per_item") || lower.contains("per item") {
            Self::PerItem
        } else {
            Self::Percentage
        }
    }

    /// Wire name used in descriptor files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
            Self::PerItem => "per_item",
        }
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_legacy_type() {
        assert_eq!(
            DiscountType::from_legacy_type("percentage_discount"),
            Some(DiscountType::Percentage)
        );
        assert_eq!(
            DiscountType::from_legacy_type("fixed_discount"),
            Some(DiscountType::Fixed)
        );
        assert_eq!(
            DiscountType::from_legacy_type("per_item_discount"),
            Some(DiscountType::PerItem)
        );
        assert_eq!(DiscountType::from_legacy_type("free_shipping"), None);
    }

    #[test]
    fn test_from_loose() {
        assert_eq!(DiscountType::from_loose("Fixed_Discount"), DiscountType::Fixed);
        assert_eq!(DiscountType::from_loose("per item"), DiscountType::PerItem);
        assert_eq!(
            DiscountType::from_loose("per_item_discount"),
            DiscountType::PerItem
        );
        assert_eq!(DiscountType::from_loose(""), DiscountType::Percentage);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&DiscountType::PerItem).ok().as_deref(),
            Some("\"per_item\"")
        );
    }
}

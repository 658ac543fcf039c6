//! Per-item migration outcomes.
//!
//! A batch produces one [`BatchResult`]. Every input item ends in exactly one
//! terminal record (a [`CreatedRecord`] or an [`ErrorRecord`]); deletions of
//! the old resource are recorded separately in [`DeletedRecord`]s.

use serde::{Deserialize, Serialize};

use crate::types::{LegacyCouponId, PromotionCodeId, PromotionId};

/// Message fragment the vendor uses when a code is already taken.
const ALREADY_EXISTS: &str = "already exists";

/// A coupon that now exists as a V3 promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRecord {
    pub promotion_id: PromotionId,
    pub coupon_id: PromotionCodeId,
    pub code: String,
}

/// Which kind of resource was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedKind {
    /// A V2 legacy coupon.
    Legacy,
    /// A V3 standard promotion and its codes.
    Standard,
}

/// A resource removed before its replacement was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecord {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<LegacyCouponId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_id: Option<PromotionId>,
    #[serde(rename = "type")]
    pub kind: DeletedKind,
}

impl DeletedRecord {
    #[must_use]
    pub fn legacy(code: impl Into<String>, coupon_id: LegacyCouponId) -> Self {
        Self {
            code: code.into(),
            coupon_id: Some(coupon_id),
            promotion_id: None,
            kind: DeletedKind::Legacy,
        }
    }

    #[must_use]
    pub fn standard(code: impl Into<String>, promotion_id: PromotionId) -> Self {
        Self {
            code: code.into(),
            coupon_id: None,
            promotion_id: Some(promotion_id),
            kind: DeletedKind::Standard,
        }
    }
}

/// A coupon that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub code: String,
    pub error: String,
    pub retryable: bool,
}

impl ErrorRecord {
    /// Build an error record, deriving `retryable` from the message.
    #[must_use]
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            code: code.into(),
            retryable: is_retryable(&error),
            error,
        }
    }

    /// An item whose code was not a string. Never retryable.
    ///
    /// `raw` is the item's JSON text and doubles as its code.
    #[must_use]
    pub fn malformed(raw: impl Into<String>) -> Self {
        Self {
            code: raw.into(),
            error: "Invalid coupon data: code is not a string".to_string(),
            retryable: false,
        }
    }
}

/// Whether an error message describes a failure worth retrying.
///
/// A code that already exists will fail the same way every time; anything
/// else (rate limiting, network trouble, transient vendor errors) may not.
#[must_use]
pub fn is_retryable(message: &str) -> bool {
    !message.contains(ALREADY_EXISTS)
}

/// Outcome of migrating one batch of coupons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(default)]
    pub created: Vec<CreatedRecord>,
    #[serde(default)]
    pub deleted: Vec<DeletedRecord>,
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

impl BatchResult {
    /// Append another batch's records.
    pub fn merge(&mut self, other: Self) {
        self.created.extend(other.created);
        self.deleted.extend(other.deleted);
        self.errors.extend(other.errors);
    }

    /// Number of items that reached a terminal state.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.created.len() + self.errors.len()
    }
}

/// Where a single item is in the delete-then-create sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    /// The old resource is gone; the replacement does not exist yet.
    LegacyDeleted,
    Created,
    Failed,
}

impl ItemState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Created | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::LegacyDeleted => "legacy_deleted",
            Self::Created => "created",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_already_exists_is_not_retryable() {
        let err = ErrorRecord::new("SAVE10", "Code already exists or invalid format: SAVE10");
        assert!(!err.retryable);
    }

    #[test]
    fn test_other_errors_are_retryable() {
        for message in [
            "Rate limit exceeded. Please wait and retry.",
            "Authentication failed. Please check your API credentials.",
            "Network connection failed. Check your internet and retry.",
            "API Error (500): Internal Server Error",
        ] {
            assert!(ErrorRecord::new("X", message).retryable, "{message}");
        }
    }

    #[test]
    fn test_malformed_is_not_retryable() {
        let err = ErrorRecord::malformed("{\"code\":42}");
        assert!(!err.retryable);
        assert_eq!(err.code, "{\"code\":42}");
        assert_eq!(err.error, "Invalid coupon data: code is not a string");
    }

    #[test]
    fn test_deleted_record_wire_shape() {
        let legacy = DeletedRecord::legacy("SAVE10", LegacyCouponId::new(3));
        assert_eq!(
            serde_json::to_value(&legacy).unwrap(),
            json!({"code": "SAVE10", "couponId": 3, "type": "legacy"})
        );

        let standard = DeletedRecord::standard("SAVE10", PromotionId::new(8));
        assert_eq!(
            serde_json::to_value(&standard).unwrap(),
            json!({"code": "SAVE10", "promotionId": 8, "type": "standard"})
        );
    }

    #[test]
    fn test_merge_and_terminal_count() {
        let mut total = BatchResult::default();
        total.merge(BatchResult {
            created: vec![CreatedRecord {
                promotion_id: PromotionId::new(1),
                coupon_id: PromotionCodeId::new(2),
                code: "A".to_string(),
            }],
            deleted: vec![DeletedRecord::legacy("A", LegacyCouponId::new(9))],
            errors: vec![ErrorRecord::new("B", "boom")],
        });
        total.merge(BatchResult {
            errors: vec![ErrorRecord::new("C", "boom")],
            ..BatchResult::default()
        });

        assert_eq!(total.terminal_count(), 3);
        assert_eq!(total.deleted.len(), 1);
    }

    #[test]
    fn test_item_state_terminal() {
        assert!(!ItemState::Pending.is_terminal());
        assert!(!ItemState::LegacyDeleted.is_terminal());
        assert!(ItemState::Created.is_terminal());
        assert!(ItemState::Failed.is_terminal());
    }
}

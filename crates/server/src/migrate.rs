//! The batch migration engine.
//!
//! Each coupon is migrated independently: delete the resource it replaces,
//! create a V3 promotion, attach the code. Items run in chunks of
//! `concurrency`; the items of a chunk run concurrently and chunks run one
//! after another. Every item ends in exactly one created or error record.
//!
//! Delete-then-create is not atomic. The per-item [`ItemState`] is logged at
//! each step so an operator can tell where an item stopped.

use futures::future::join_all;
use tracing::instrument;

use coupon_migrator_core::{
    BatchResult, Coupon, CouponInput, CreatedRecord, DeletedRecord, ErrorRecord, ItemState,
};

use crate::bigcommerce::{BigCommerceError, StoreClient, classify};
use crate::config::DeleteFailurePolicy;

/// How a batch is migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Items migrated at the same time. Zero is treated as one.
    pub concurrency: usize,
    /// What to do when the old resource cannot be deleted.
    pub delete_failure_policy: DeleteFailurePolicy,
}

impl MigrationOptions {
    /// One item at a time.
    #[must_use]
    pub const fn sequential(delete_failure_policy: DeleteFailurePolicy) -> Self {
        Self {
            concurrency: 1,
            delete_failure_policy,
        }
    }
}

/// Result of migrating one item.
struct ItemOutcome {
    deleted: Vec<DeletedRecord>,
    terminal: Result<CreatedRecord, ErrorRecord>,
}

impl From<ItemOutcome> for BatchResult {
    fn from(outcome: ItemOutcome) -> Self {
        let (created, errors) = match outcome.terminal {
            Ok(created) => (vec![created], Vec::new()),
            Err(error) => (Vec::new(), vec![error]),
        };
        Self {
            created,
            deleted: outcome.deleted,
            errors,
        }
    }
}

/// Migrate a batch of coupons.
#[instrument(skip_all, fields(store = %client.store_hash(), items = items.len(), concurrency = options.concurrency))]
pub async fn migrate(
    client: &StoreClient,
    items: &[CouponInput],
    options: MigrationOptions,
) -> BatchResult {
    let mut result = BatchResult::default();

    for chunk in items.chunks(options.concurrency.max(1)) {
        let outcomes = join_all(
            chunk
                .iter()
                .map(|item| migrate_item(client, item, options.delete_failure_policy)),
        )
        .await;
        for outcome in outcomes {
            result.merge(outcome.into());
        }
    }

    tracing::info!(
        created = result.created.len(),
        deleted = result.deleted.len(),
        errors = result.errors.len(),
        "Batch migrated"
    );
    result
}

async fn migrate_item(
    client: &StoreClient,
    item: &CouponInput,
    policy: DeleteFailurePolicy,
) -> ItemOutcome {
    let coupon = match item {
        CouponInput::Coupon(coupon) => coupon,
        CouponInput::Malformed(raw) => {
            tracing::warn!(item = %raw, "Skipping coupon with invalid code");
            return ItemOutcome {
                deleted: Vec::new(),
                terminal: Err(ErrorRecord::malformed(raw.to_string())),
            };
        }
    };
    let code = coupon.code.as_str();
    let mut state = ItemState::Pending;
    let mut deleted = Vec::new();
    let mut delete_failure = None;

    if let Some(id) = coupon.old_coupon_id {
        match client.delete_legacy_coupon(id).await {
            Ok(()) => {
                deleted.push(DeletedRecord::legacy(code, id));
                state = ItemState::LegacyDeleted;
                tracing::debug!(code, coupon_id = %id, %state, "Legacy coupon deleted");
            }
            Err(err) => {
                tracing::warn!(code, coupon_id = %id, error = %err, "Could not delete legacy coupon");
                delete_failure = Some(format!("Failed to delete legacy coupon {id}: {err}"));
            }
        }
    }

    if let Some(id) = coupon.old_promotion_id {
        match client.delete_promotion(id).await {
            Ok(()) => {
                deleted.push(DeletedRecord::standard(code, id));
                state = ItemState::LegacyDeleted;
                tracing::debug!(code, promotion_id = %id, %state, "Promotion deleted");
            }
            Err(err) => {
                tracing::warn!(code, promotion_id = %id, error = %err, "Could not delete promotion");
                delete_failure.get_or_insert(format!("Failed to delete promotion {id}: {err}"));
            }
        }
    }

    if let (Some(message), DeleteFailurePolicy::SkipCreate) = (delete_failure, policy) {
        state = ItemState::Failed;
        tracing::warn!(code, %state, "Not creating promotion after failed delete");
        return ItemOutcome {
            deleted,
            terminal: Err(ErrorRecord {
                code: code.to_string(),
                error: message,
                retryable: true,
            }),
        };
    }

    let terminal = match create(client, coupon).await {
        Ok(created) => {
            state = ItemState::Created;
            tracing::debug!(code, promotion_id = %created.promotion_id, %state, "Coupon migrated");
            Ok(created)
        }
        Err(err) => {
            tracing::warn!(code, previous_state = %state, error = %err, "Coupon migration failed");
            Err(ErrorRecord::new(code, classify(&err, code)))
        }
    };

    ItemOutcome { deleted, terminal }
}

async fn create(client: &StoreClient, coupon: &Coupon) -> Result<CreatedRecord, BigCommerceError> {
    let promotion_id = client
        .create_promotion(&coupon.to_new_promotion(client.channel()))
        .await?;

    let coupon_id = client
        .create_promotion_code(promotion_id, &coupon.to_new_code())
        .await
        .inspect_err(|err| {
            tracing::warn!(
                code = %coupon.code,
                %promotion_id,
                error = %err,
                "Promotion created without its code"
            );
        })?;

    Ok(CreatedRecord {
        promotion_id,
        coupon_id,
        code: coupon.code.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rate_limit::RequestThrottle;
    use coupon_migrator_core::types::{Credentials, LegacyCouponId, PromotionId};
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn client(server: &ServerGuard) -> StoreClient {
        StoreClient::new(
            reqwest::Client::new(),
            RequestThrottle::disabled(),
            &server.url(),
            &Credentials::new("abc123", "token"),
        )
    }

    async fn mock_creation(server: &mut ServerGuard) {
        server
            .mock("POST", "/stores/abc123/v3/promotions")
            .with_body(r#"{"data":{"id":100}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/stores/abc123/v3/promotions/100/codes")
            .with_body(r#"{"data":{"id":200}}"#)
            .create_async()
            .await;
    }

    fn coupon(code: &str) -> CouponInput {
        CouponInput::Coupon(Coupon::new(code))
    }

    fn legacy(code: &str, id: i64) -> CouponInput {
        let mut coupon = Coupon::new(code);
        coupon.old_coupon_id = Some(LegacyCouponId::new(id));
        CouponInput::Coupon(coupon)
    }

    #[tokio::test]
    async fn test_every_item_gets_one_terminal_record() {
        let mut server = Server::new_async().await;
        mock_creation(&mut server).await;

        let items: Vec<CouponInput> = (0..7).map(|i| coupon(&format!("C{i}"))).collect();
        let options = MigrationOptions {
            concurrency: 3,
            delete_failure_policy: DeleteFailurePolicy::Proceed,
        };
        let result = migrate(&client(&server), &items, options).await;

        assert_eq!(result.terminal_count(), 7);
        assert_eq!(result.created.len(), 7);
    }

    #[tokio::test]
    async fn test_malformed_item_makes_no_calls() {
        let mut server = Server::new_async().await;
        let mut untouched = Vec::new();
        for method in ["GET", "POST", "DELETE"] {
            untouched.push(
                server
                    .mock(method, Matcher::Any)
                    .expect(0)
                    .create_async()
                    .await,
            );
        }

        let items = vec![CouponInput::Malformed(json!({"code": 42}))];
        let result = migrate(
            &client(&server),
            &items,
            MigrationOptions::sequential(DeleteFailurePolicy::Proceed),
        )
        .await;

        assert_eq!(result.errors.len(), 1);
        assert!(!result.errors[0].retryable);
        assert_eq!(result.errors[0].code, r#"{"code":42}"#);
        for mock in untouched {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_legacy_coupon_is_deleted_then_replaced() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/stores/abc123/v2/coupons/9")
            .with_status(204)
            .create_async()
            .await;
        mock_creation(&mut server).await;

        let result = migrate(
            &client(&server),
            &[legacy("OLD", 9)],
            MigrationOptions::sequential(DeleteFailurePolicy::Proceed),
        )
        .await;

        delete.assert_async().await;
        assert_eq!(result.deleted, vec![DeletedRecord::legacy("OLD", LegacyCouponId::new(9))]);
        assert_eq!(result.created[0].promotion_id, PromotionId::new(100));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_proceeds_by_default() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/stores/abc123/v2/coupons/9")
            .with_status(500)
            .create_async()
            .await;
        mock_creation(&mut server).await;

        let result = migrate(
            &client(&server),
            &[legacy("OLD", 9)],
            MigrationOptions::sequential(DeleteFailurePolicy::Proceed),
        )
        .await;

        assert!(result.deleted.is_empty());
        assert_eq!(result.created.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_can_skip_creation() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/stores/abc123/v2/coupons/9")
            .with_status(500)
            .create_async()
            .await;
        let create = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = migrate(
            &client(&server),
            &[legacy("OLD", 9)],
            MigrationOptions::sequential(DeleteFailurePolicy::SkipCreate),
        )
        .await;

        create.assert_async().await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].retryable);
        assert!(result.errors[0].error.starts_with("Failed to delete legacy coupon 9"));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_final() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/stores/abc123/v3/promotions")
            .with_body(r#"{"data":{"id":100}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/stores/abc123/v3/promotions/100/codes")
            .with_status(422)
            .with_body(r#"{"title":"code must be unique"}"#)
            .create_async()
            .await;

        let result = migrate(
            &client(&server),
            &[coupon("TAKEN")],
            MigrationOptions::sequential(DeleteFailurePolicy::Proceed),
        )
        .await;

        assert_eq!(
            result.errors,
            vec![ErrorRecord {
                code: "TAKEN".to_string(),
                error: "Code already exists or invalid format: TAKEN".to_string(),
                retryable: false,
            }]
        );
    }
}

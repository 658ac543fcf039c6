//! Migration routes and client-side retry.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use mockito::Matcher;
use serde_json::{Value, json};

use coupon_migrator_core::progress::{MigrationProgress, select_for_retry};
use coupon_migrator_core::{BatchResult, CouponInput};
use coupon_migrator_integration_tests::{STORE, TestContext};

/// Accept any promotion and code creation.
async fn accept_creation(ctx: &mut TestContext) {
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .with_status(201)
        .with_body(r#"{"data":{"id":500}}"#)
        .create_async()
        .await;
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions/500/codes").as_str())
        .with_status(201)
        .with_body(r#"{"data":{"id":900}}"#)
        .create_async()
        .await;
}

fn results(body: &Value) -> BatchResult {
    serde_json::from_value(body["results"].clone()).unwrap()
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_codes_must_be_an_array() {
    let ctx = TestContext::new().await;

    for route in ["/api/migrate", "/api/migrate-batch"] {
        let (status, body) = ctx.post(route, json!({"codes": {"code": "X"}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Store hash, access token, and codes array are required"
        );

        let (status, _) = ctx
            .post_raw(route, &json!({"storeHash": STORE, "codes": []}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_null_or_unreadable_body_is_bad_request() {
    let ctx = TestContext::new().await;
    let expected = json!({"error": "Store hash, access token, and codes array are required"});

    let (status, body) = ctx
        .post_raw(
            "/api/migrate-batch",
            &json!({"storeHash": null, "accessToken": "t", "codes": []}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);

    let (status, body) = ctx.post("/api/migrate", json!({"accessToken": null, "codes": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);

    let (status, body) = ctx
        .post("/api/migrate-batch", json!({"codes": [], "startIndex": "two"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);

    let (status, body) = ctx.post_text("/api/migrate", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);
}

// =============================================================================
// Migration
// =============================================================================

#[tokio::test]
async fn test_every_code_gets_one_outcome() {
    let mut ctx = TestContext::new().await;
    accept_creation(&mut ctx).await;

    let codes: Vec<Value> = (0..12).map(|i| json!({"code": format!("CODE{i}")})).collect();
    let (status, body) = ctx.post("/api/migrate-batch", json!({ "codes": codes })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let results = results(&body);
    assert_eq!(results.terminal_count(), 12);
    assert_eq!(results.created.len(), 12);
    assert!(body.get("hasMore").is_none());
}

#[tokio::test]
async fn test_fixed_discount_creates_flat_cart_rule() {
    let mut ctx = TestContext::new().await;
    let promotion = ctx
        .vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .match_body(Matcher::PartialJson(json!({
            "name": "Coupon: FLAT15",
            "channels": [{"id": 1}],
            "rules": [{"action": {"cart_value": {"discount": {"fixed_amount": 15.0}}}}],
            "redemption_type": "COUPON",
            "status": "ENABLED"
        })))
        .with_body(r#"{"data":{"id":500}}"#)
        .expect(1)
        .create_async()
        .await;
    let code = ctx
        .vendor
        .mock("POST", TestContext::vendor_path("v3/promotions/500/codes").as_str())
        .match_body(Matcher::Json(json!({"code": "FLAT15", "max_uses": null})))
        .with_body(r#"{"data":{"id":900}}"#)
        .expect(1)
        .create_async()
        .await;

    let (status, body) = ctx
        .post(
            "/api/migrate",
            json!({"codes": [{"code": "FLAT15", "discount": 15, "discountType": "fixed"}]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    promotion.assert_async().await;
    code.assert_async().await;
    assert_eq!(
        body["results"]["created"],
        json!([{"promotionId": 500, "couponId": 900, "code": "FLAT15"}])
    );
}

#[tokio::test]
async fn test_non_string_code_is_rejected_without_vendor_calls() {
    let mut ctx = TestContext::new().await;
    let mut untouched = Vec::new();
    for method in ["GET", "POST", "DELETE"] {
        untouched.push(
            ctx.vendor
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }

    let (status, body) = ctx
        .post("/api/migrate", json!({"codes": [{"code": 12345}]}))
        .await;

    assert_eq!(status, StatusCode::OK);
    for mock in untouched {
        mock.assert_async().await;
    }
    assert_eq!(
        body["results"]["errors"],
        json!([{
            "code": r#"{"code":12345}"#,
            "error": "Invalid coupon data: code is not a string",
            "retryable": false
        }])
    );
}

#[tokio::test]
async fn test_legacy_coupon_already_gone_counts_as_deleted() {
    let mut ctx = TestContext::new().await;
    let delete = ctx
        .vendor
        .mock("DELETE", TestContext::vendor_path("v2/coupons/77").as_str())
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    accept_creation(&mut ctx).await;

    let (_, body) = ctx
        .post(
            "/api/migrate",
            json!({"codes": [{"code": "GONE", "oldCouponId": 77}]}),
        )
        .await;

    delete.assert_async().await;
    let results = results(&body);
    assert!(results.errors.is_empty());
    assert_eq!(
        body["results"]["deleted"],
        json!([{"code": "GONE", "couponId": 77, "type": "legacy"}])
    );
    assert_eq!(results.created.len(), 1);
}

#[tokio::test]
async fn test_duplicate_code_error_is_final() {
    let mut ctx = TestContext::new().await;
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .with_status(422)
        .with_body(r#"{"status":422,"title":"Duplicate code"}"#)
        .create_async()
        .await;

    let (_, body) = ctx
        .post("/api/migrate", json!({"codes": ["TAKEN"]}))
        .await;

    assert_eq!(
        body["results"]["errors"],
        json!([{
            "code": "TAKEN",
            "error": "Code already exists or invalid format: TAKEN",
            "retryable": false
        }])
    );
}

#[tokio::test]
async fn test_index_batched_slice() {
    let mut ctx = TestContext::new().await;
    accept_creation(&mut ctx).await;

    let codes: Vec<Value> = (0..5).map(|i| json!(format!("C{i}"))).collect();
    let (_, body) = ctx
        .post(
            "/api/migrate-batch",
            json!({"codes": codes, "startIndex": 3, "batchSize": 10}),
        )
        .await;

    let results = results(&body);
    let migrated: Vec<&str> = results.created.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(migrated.len(), 2);
    assert!(migrated.contains(&"C3") && migrated.contains(&"C4"));
    assert_eq!(body["hasMore"], false);
    assert_eq!(body["nextIndex"], 5);
}

// =============================================================================
// Retry
// =============================================================================

#[tokio::test]
async fn test_retry_replaces_only_the_retried_error() {
    let mut ctx = TestContext::new().await;
    // First attempt: FLAKY is rate limited, TAKEN is a duplicate, OK succeeds.
    let flaky = ctx
        .vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .match_body(Matcher::PartialJson(json!({"name": "Coupon: FLAKY"})))
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .match_body(Matcher::PartialJson(json!({"name": "Coupon: TAKEN"})))
        .with_status(422)
        .create_async()
        .await;
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .match_body(Matcher::PartialJson(json!({"name": "Coupon: OK"})))
        .with_body(r#"{"data":{"id":500}}"#)
        .create_async()
        .await;
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions/500/codes").as_str())
        .with_body(r#"{"data":{"id":900}}"#)
        .create_async()
        .await;

    let originals: Vec<CouponInput> = ["FLAKY", "TAKEN", "OK"]
        .into_iter()
        .map(|code| CouponInput::from_value(json!(code)))
        .collect();

    let (_, body) = ctx
        .post("/api/migrate-batch", json!({ "codes": originals }))
        .await;
    let mut progress = MigrationProgress::new(originals.len());
    progress.apply_batch(originals.len(), results(&body));
    assert_eq!(progress.errors().len(), 2);
    flaky.assert_async().await;
    flaky.remove_async().await;

    // Second attempt: FLAKY now succeeds.
    ctx.vendor
        .mock("POST", TestContext::vendor_path("v3/promotions").as_str())
        .match_body(Matcher::PartialJson(json!({"name": "Coupon: FLAKY"})))
        .with_body(r#"{"data":{"id":500}}"#)
        .expect(1)
        .create_async()
        .await;

    let retry = select_for_retry(&originals, &progress.retryable_errors());
    let codes: Vec<String> = retry.iter().map(CouponInput::code).collect();
    assert_eq!(codes, vec!["FLAKY".to_string()]);

    let (_, body) = ctx.post("/api/migrate-batch", json!({ "codes": retry })).await;
    progress.apply_retry(&codes, results(&body));

    let created: Vec<&str> = progress.created().iter().map(|c| c.code.as_str()).collect();
    assert_eq!(created.len(), 2);
    assert!(created.contains(&"OK") && created.contains(&"FLAKY"));
    assert_eq!(progress.errors().len(), 1);
    assert_eq!(progress.errors()[0].code, "TAKEN");
    assert!(!progress.errors()[0].retryable);
}

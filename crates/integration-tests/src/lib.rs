//! Integration tests for the coupon migrator.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p coupon-migrator-integration-tests
//! ```
//!
//! Each test drives the server's router in-process and points it at a
//! `mockito` server standing in for the BigCommerce API.
//!
//! # Test Categories
//!
//! - `export` - Reader routes, pagination, request validation
//! - `migration` - Migration routes and client-side retry

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use mockito::{Server, ServerGuard};
use serde_json::{Value, json};
use tower::ServiceExt;

use coupon_migrator_server::{app, config::ServerConfig, state::AppState};

/// Store hash used by every test.
pub const STORE: &str = "abc123";

/// A router wired to a mock BigCommerce API.
pub struct TestContext {
    pub vendor: ServerGuard,
    router: Router,
}

impl TestContext {
    /// Start a mock vendor and build the app against it, unthrottled.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[allow(clippy::expect_used)]
    pub async fn new() -> Self {
        let vendor = Server::new_async().await;
        let config = ServerConfig {
            api_base: vendor.url(),
            v2_min_interval: std::time::Duration::ZERO,
            v3_min_interval: std::time::Duration::ZERO,
            ..ServerConfig::default()
        };
        let state = AppState::new(config).expect("app state");
        Self {
            vendor,
            router: app(state),
        }
    }

    /// Path of a vendor resource for [`STORE`], e.g. `v3/promotions`.
    #[must_use]
    pub fn vendor_path(resource: &str) -> String {
        format!("/stores/{STORE}/{resource}")
    }

    /// POST `body` merged with the test credentials to `route`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the response is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn post(&self, route: &str, fields: Value) -> (StatusCode, Value) {
        let mut body = json!({ "storeHash": STORE, "accessToken": "token" });
        if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
            body.extend(fields);
        }
        self.post_raw(route, &body).await
    }

    /// POST `body` as-is to `route`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the response is not JSON.
    pub async fn post_raw(&self, route: &str, body: &Value) -> (StatusCode, Value) {
        self.post_text(route, &body.to_string()).await
    }

    /// POST raw text labelled as JSON to `route`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the response is not JSON.
    #[allow(clippy::expect_used)]
    pub async fn post_text(&self, route: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::post(route)
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .expect("request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        (status, serde_json::from_slice(&bytes).expect("JSON body"))
    }
}

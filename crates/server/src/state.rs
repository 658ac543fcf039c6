//! Application state shared across handlers.

use std::sync::Arc;

use coupon_migrator_core::types::Credentials;

use crate::bigcommerce::StoreClient;
use crate::config::ServerConfig;
use crate::migrate::MigrationOptions;
use crate::rate_limit::RequestThrottle;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The HTTP client and the
/// request throttle are shared by every request, so concurrent requests for
/// the same store are spaced together.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    http: reqwest::Client,
    throttle: RequestThrottle,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        let throttle = RequestThrottle::new(config.v2_min_interval, config.v3_min_interval);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                throttle,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Build a BigCommerce client for the store in `credentials`.
    #[must_use]
    pub fn store(&self, credentials: &Credentials) -> StoreClient {
        StoreClient::new(
            self.inner.http.clone(),
            self.inner.throttle.clone(),
            &self.inner.config.api_base,
            credentials,
        )
    }

    /// Options for the single-shot migration route.
    #[must_use]
    pub fn sequential_migration(&self) -> MigrationOptions {
        MigrationOptions::sequential(self.inner.config.delete_failure_policy)
    }

    /// Options for the batch migration route.
    #[must_use]
    pub fn batch_migration(&self) -> MigrationOptions {
        MigrationOptions {
            concurrency: self.inner.config.migrate_concurrency,
            delete_failure_policy: self.inner.config.delete_failure_policy,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("throttle", &self.inner.throttle)
            .finish_non_exhaustive()
    }
}

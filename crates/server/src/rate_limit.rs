//! Outbound request throttling using governor.
//!
//! BigCommerce limits each store separately, and the V2 and V3 APIs are
//! throttled independently. One keyed limiter exists per API version, keyed
//! by store hash, with a burst of a single request per interval. Waiting for
//! a cell is atomic, so concurrently migrated coupons queue behind each other
//! instead of bursting.

use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultKeyedRateLimiter, Quota};

/// BigCommerce API generation a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V2,
    V3,
}

impl ApiVersion {
    /// Path segment of this version (`v2` / `v3`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type KeyedLimiter = DefaultKeyedRateLimiter<String>;

/// Per-store, per-version request spacing.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct RequestThrottle {
    v2: Option<Arc<KeyedLimiter>>,
    v3: Option<Arc<KeyedLimiter>>,
}

impl RequestThrottle {
    /// Create a throttle. A zero interval disables throttling for that version.
    #[must_use]
    pub fn new(v2_min_interval: Duration, v3_min_interval: Duration) -> Self {
        Self {
            v2: limiter(v2_min_interval),
            v3: limiter(v3_min_interval),
        }
    }

    /// A throttle that never waits.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { v2: None, v3: None }
    }

    /// Wait until a request to `store_hash` on `version` may be sent.
    pub async fn acquire(&self, version: ApiVersion, store_hash: &str) {
        let Some(limiter) = self.limiter(version) else {
            return;
        };

        let key = store_hash.to_string();
        limiter.until_key_ready(&key).await;
        limiter.retain_recent();
    }
}

impl RequestThrottle {
    fn limiter(&self, version: ApiVersion) -> Option<&KeyedLimiter> {
        match version {
            ApiVersion::V2 => self.v2.as_deref(),
            ApiVersion::V3 => self.v3.as_deref(),
        }
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("v2", &self.v2.is_some())
            .field("v3", &self.v3.is_some())
            .finish()
    }
}

fn limiter(interval: Duration) -> Option<Arc<KeyedLimiter>> {
    Quota::with_period(interval).map(|quota| Arc::new(KeyedLimiter::keyed(quota)))
}

//! Server configuration loaded from environment variables.
//!
//! Store credentials are not configuration: every request carries its own.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `SERVER_PORT` - Listen port (default: 3001)
//! - `BIGCOMMERCE_API_BASE` - API origin (default: <https://api.bigcommerce.com>)
//! - `V2_MIN_INTERVAL_MS` - Minimum spacing of V2 requests per store (default: 250, 0 disables)
//! - `V3_MIN_INTERVAL_MS` - Minimum spacing of V3 requests per store (default: 200, 0 disables)
//! - `MIGRATE_CONCURRENCY` - Coupons migrated concurrently by `/api/migrate-batch` (default: 5)
//! - `EXPORT_BATCH_SIZE` - Default slice size for `/api/export-batch` (default: 100)
//! - `HTTP_TIMEOUT_SECS` - Timeout of each BigCommerce request (default: 30)
//! - `DELETE_FAILURE_POLICY` - `proceed` or `skip_create` (default: proceed)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default BigCommerce API origin.
pub const DEFAULT_API_BASE: &str = "https://api.bigcommerce.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// What to do when deleting the old resource fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteFailurePolicy {
    /// Log the failure and create the replacement anyway.
    #[default]
    Proceed,
    /// Fail the item without creating anything.
    SkipCreate,
}

impl FromStr for DeleteFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proceed" => Ok(Self::Proceed),
            "skip_create" | "skip-create" => Ok(Self::SkipCreate),
            other => Err(format!("expected proceed or skip_create, got {other:?}")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// BigCommerce API origin, without a trailing slash
    pub api_base: String,
    /// Minimum spacing between V2 requests to one store
    pub v2_min_interval: Duration,
    /// Minimum spacing between V3 requests to one store
    pub v3_min_interval: Duration,
    /// Coupons migrated concurrently by the batch route
    pub migrate_concurrency: usize,
    /// Default slice size of the index-batched export
    pub export_batch_size: usize,
    /// Timeout of each BigCommerce request
    pub http_timeout: Duration,
    /// Behavior when the old resource cannot be deleted
    pub delete_failure_policy: DeleteFailurePolicy,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3001,
            api_base: DEFAULT_API_BASE.to_string(),
            v2_min_interval: Duration::from_millis(250),
            v3_min_interval: Duration::from_millis(200),
            migrate_concurrency: 5,
            export_batch_size: 100,
            http_timeout: Duration::from_secs(30),
            delete_failure_policy: DeleteFailurePolicy::Proceed,
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = parse_or(get("SERVER_HOST"), "SERVER_HOST", defaults.host)?;
        let port = parse_or(get("SERVER_PORT"), "SERVER_PORT", defaults.port)?;
        let api_base = get("BIGCOMMERCE_API_BASE")
            .map_or(defaults.api_base, |s| s.trim_end_matches('/').to_string());

        let v2_min_interval = Duration::from_millis(parse_or(
            get("V2_MIN_INTERVAL_MS"),
            "V2_MIN_INTERVAL_MS",
            250,
        )?);
        let v3_min_interval = Duration::from_millis(parse_or(
            get("V3_MIN_INTERVAL_MS"),
            "V3_MIN_INTERVAL_MS",
            200,
        )?);
        let migrate_concurrency = positive(
            parse_or(get("MIGRATE_CONCURRENCY"), "MIGRATE_CONCURRENCY", defaults.migrate_concurrency)?,
            "MIGRATE_CONCURRENCY",
        )?;
        let export_batch_size = positive(
            parse_or(get("EXPORT_BATCH_SIZE"), "EXPORT_BATCH_SIZE", defaults.export_batch_size)?,
            "EXPORT_BATCH_SIZE",
        )?;
        let http_timeout = Duration::from_secs(positive(
            parse_or(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", 30)?,
            "HTTP_TIMEOUT_SECS",
        )?);
        let delete_failure_policy = parse_or(
            get("DELETE_FAILURE_POLICY"),
            "DELETE_FAILURE_POLICY",
            defaults.delete_failure_policy,
        )?;

        let json_logs = get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get("SENTRY_DSN");
        let sentry_environment = get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            api_base,
            v2_min_interval,
            v3_min_interval,
            migrate_concurrency,
            export_batch_size,
            http_timeout,
            delete_failure_policy,
            json_logs,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable if set, otherwise use the default.
fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject zero for settings that must be at least one.
fn positive<T>(value: T, key: &str) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

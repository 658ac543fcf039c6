//! BigCommerce REST API access.
//!
//! # Architecture
//!
//! - [`StoreClient`] is the gateway: one store's credentials, the shared
//!   HTTP client and the shared [`RequestThrottle`](crate::rate_limit::RequestThrottle).
//!   Every call goes through the throttle for its API version first.
//! - [`reader`] pages through promotions, promotion codes, and legacy coupons.
//!
//! # Errors
//!
//! Failures are returned as [`BigCommerceError`]. [`classify`] turns one into
//! the short, actionable text reported per coupon.

mod client;
pub mod reader;

pub use client::StoreClient;

use thiserror::Error;

/// Longest response body kept in an error.
pub const MAX_ERROR_BODY: usize = 200;

/// Errors that can occur when calling the BigCommerce API.
#[derive(Debug, Error)]
pub enum BigCommerceError {
    /// The API answered with a non-success status.
    #[error("API Error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A success response had no body where one was required.
    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

impl BigCommerceError {
    /// HTTP status of an API error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an API error, keeping only the start of the body.
    #[must_use]
    pub fn api(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
    }
}

impl From<reqwest::Error> for BigCommerceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

/// Turn an error into the message reported for `code`.
#[must_use]
pub fn classify(err: &BigCommerceError, code: &str) -> String {
    match err {
        BigCommerceError::Api { status: 422, .. } => {
            format!("Code already exists or invalid format: {code}")
        }
        BigCommerceError::Api { status: 429, .. } => {
            "Rate limit exceeded. Please wait and retry.".to_string()
        }
        BigCommerceError::Api {
            status: 401 | 403, ..
        } => "Authentication failed. Please check your API credentials.".to_string(),
        BigCommerceError::Network(_) => {
            "Network connection failed. Check your internet and retry.".to_string()
        }
        other => other.to_string(),
    }
}

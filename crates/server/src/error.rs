//! Unified error handling for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::bigcommerce::BigCommerceError;
use crate::bigcommerce::reader::ConnectionError;

/// Application-level error type.
///
/// Responses carry a JSON body of the form `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or has the wrong shape.
    #[error("{0}")]
    BadRequest(&'static str),

    /// BigCommerce rejected a request the handler cannot continue without.
    #[error(transparent)]
    BigCommerce(#[from] BigCommerceError),

    /// The connection check failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BigCommerce(_) | Self::Connection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

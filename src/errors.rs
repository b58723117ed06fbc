//! Error types for quakemap.
//!
//! Uses `thiserror` for library-style error definitions. The same enum is
//! returned by the web API, so it also knows how to become an HTTP response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur in quakemap operations.
#[derive(Error, Debug)]
pub enum QuakemapError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feed returned an error status
    #[error("USGS feed error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response structure
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A filter control received a value it cannot represent
    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    /// Nothing to show for the request (e.g. locating in an empty set)
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for QuakemapError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Http(_) | Self::Api { .. } | Self::InvalidResponse(_) | Self::Parse(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

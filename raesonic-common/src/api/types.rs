//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
///
/// Carries machine-readable reason strings only, never internal detail.
///
/// # Examples
///
/// ```
/// use raesonic_common::api::types::ErrorResponse;
///
/// let body = ErrorResponse::new("relation not found");
/// assert_eq!(
///     serde_json::to_string(&body).unwrap(),
///     r#"{"errors":["relation not found"]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

impl ErrorResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            errors: vec![reason.into()],
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

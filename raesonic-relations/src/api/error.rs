//! Error to HTTP response mapping
//!
//! Bodies carry only a reason category; internal detail is logged, never sent.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use raesonic_common::api::ErrorResponse;
use tracing::error;

use crate::engine::EngineError;

#[derive(Debug)]
pub enum ApiError {
    Unauthenticated,
    /// Malformed request with a client-fixable reason
    BadRequest(&'static str),
    /// Path segment that is not a numeric id; no such route
    UnknownPath,
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unauthenticated => ApiError::Unauthenticated,
            other => ApiError::Engine(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "not authenticated"),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::UnknownPath => (StatusCode::NOT_FOUND, "not found"),
            ApiError::Engine(err) => match err {
                EngineError::Unauthenticated => (StatusCode::UNAUTHORIZED, "not authenticated"),
                EngineError::InvalidTrackId => (StatusCode::BAD_REQUEST, "invalid ids"),
                EngineError::SelfRelation => (StatusCode::BAD_REQUEST, "self-link not allowed"),
                EngineError::InvalidVote(_) => (StatusCode::BAD_REQUEST, "invalid vote"),
                EngineError::InvalidReason(_) => (StatusCode::BAD_REQUEST, "invalid reason"),
                EngineError::TrackNotFound => (StatusCode::NOT_FOUND, "track not found"),
                EngineError::RelationNotFound => (StatusCode::NOT_FOUND, "relation not found"),
                EngineError::Internal(detail) => {
                    error!("Internal error: {}", detail);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
                }
            },
        };

        (status, Json(ErrorResponse::new(reason))).into_response()
    }
}

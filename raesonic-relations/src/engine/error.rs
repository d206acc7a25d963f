//! Engine error taxonomy

use thiserror::Error;

/// Why a relation operation was refused or failed
///
/// Everything except [`EngineError::Internal`] is terminal and caused by the
/// request; internal failures are rolled back and safe to retry.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("not authenticated")]
    Unauthenticated,

    /// A track id that is not strictly positive
    #[error("invalid ids")]
    InvalidTrackId,

    #[error("self-link not allowed")]
    SelfRelation,

    #[error("invalid vote: {0}")]
    InvalidVote(i64),

    #[error("invalid reason: {0}")]
    InvalidReason(i64),

    #[error("track not found")]
    TrackNotFound,

    #[error("relation not found")]
    RelationNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<raesonic_common::Error> for EngineError {
    fn from(err: raesonic_common::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(raesonic_common::Error::from(err))
    }
}

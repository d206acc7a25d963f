//! Engine inputs and outcomes

use raesonic_common::db::{RelationId, TrackId};
use serde::Serialize;

use super::EngineError;

/// A caller's requested stance on a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Positive,
    Clear,
    Negative,
}

impl VoteDirection {
    /// -1, 0 or +1
    pub fn sign(self) -> i64 {
        match self {
            VoteDirection::Positive => 1,
            VoteDirection::Clear => 0,
            VoteDirection::Negative => -1,
        }
    }
}

impl TryFrom<i64> for VoteDirection {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDirection::Positive),
            0 => Ok(VoteDirection::Clear),
            -1 => Ok(VoteDirection::Negative),
            other => Err(EngineError::InvalidVote(other)),
        }
    }
}

/// Result of a vote transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    /// trust - doubt after the transition
    pub score: i64,
    /// The caller's resulting vote value, 0 when cleared
    pub applied: i64,
}

/// Result of relating two tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// New edge; the creator's vote is its first
    Created { relation_id: RelationId },
    /// Edge already existed; the call became an upvote
    AlreadyExists {
        relation_id: RelationId,
        vote: VoteOutcome,
    },
}

impl CreateOutcome {
    pub fn relation_id(&self) -> RelationId {
        match self {
            CreateOutcome::Created { relation_id } => *relation_id,
            CreateOutcome::AlreadyExists { relation_id, .. } => *relation_id,
        }
    }
}

/// One edge as seen from a given track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RelatedTrack {
    pub relation_id: RelationId,
    /// The opposite endpoint
    pub track_id: TrackId,
    pub artist: String,
    pub title: String,
    pub score: i64,
    /// Caller's vote, 0 when anonymous or not voted
    pub my_vote: i64,
    /// Caller holds an unresolved flag on the relation
    pub my_flagged: bool,
}

/// Reasons a relation can be flagged for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagReason {
    /// Mismatching recommendation
    Mismatching,
    /// Intentionally incorrect
    Incorrect,
}

impl FlagReason {
    pub fn id(self) -> i64 {
        match self {
            FlagReason::Mismatching => 1,
            FlagReason::Incorrect => 2,
        }
    }
}

impl TryFrom<i64> for FlagReason {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FlagReason::Mismatching),
            2 => Ok(FlagReason::Incorrect),
            other => Err(EngineError::InvalidReason(other)),
        }
    }
}

/// What setting a flag changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    Created,
    ReasonUpdated,
    Unchanged,
}

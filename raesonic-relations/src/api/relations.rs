//! Relation endpoints
//!
//! Responses are positional JSON arrays, matching the existing web client.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use raesonic_common::db::{RelationId, TrackId};
use serde::{Deserialize, Serialize};

use super::{ApiError, Caller};
use crate::engine::{CreateOutcome, RelatedTrack};
use crate::AppState;

/// Relation was created by this request
pub const STATUS_CREATED: i64 = 1;
/// Relation already existed and was upvoted instead
pub const STATUS_UPVOTED: i64 = 2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationRequest {
    pub track_id: i64,
    pub linked_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: i64,
}

/// `[trackId, artist, title, score, myVote, myFlagged]`
#[derive(Debug, Serialize)]
pub struct RelatedTrackRow(pub TrackId, pub String, pub String, pub i64, pub i64, pub bool);

impl From<RelatedTrack> for RelatedTrackRow {
    fn from(r: RelatedTrack) -> Self {
        RelatedTrackRow(r.track_id, r.artist, r.title, r.score, r.my_vote, r.my_flagged)
    }
}

/// POST /relations
///
/// Body `{trackId, linkedId}`; responds `[relationId, status]`.
pub async fn create_relation(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<CreateRelationRequest>, JsonRejection>,
) -> Result<Json<(RelationId, i64)>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid ids"))?;

    let outcome = state
        .engine
        .create_relation(TrackId(request.track_id), TrackId(request.linked_id), Some(caller))
        .await?;

    let status = match outcome {
        CreateOutcome::Created { .. } => STATUS_CREATED,
        CreateOutcome::AlreadyExists { .. } => STATUS_UPVOTED,
    };

    Ok(Json((outcome.relation_id(), status)))
}

/// GET /tracks/:track_id/relations
///
/// Anonymous callers get `myVote = 0` and `myFlagged = false`.
pub async fn get_track_relations(
    State(state): State<AppState>,
    caller: Option<Caller>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<RelatedTrackRow>>, ApiError> {
    let Path(track_id) = path.map_err(|_| ApiError::UnknownPath)?;

    let related = state
        .engine
        .track_relations(TrackId(track_id), caller.map(|Caller(id)| id))
        .await?;

    Ok(Json(related.into_iter().map(RelatedTrackRow::from).collect()))
}

/// PUT /tracks/:track_id/relations/:linked_id/votes
///
/// Body `{vote}` with vote in {-1, 0, 1}; responds `[score, appliedVote]`.
pub async fn update_relation_vote(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, i64)>, PathRejection>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<(i64, i64)>, ApiError> {
    let Path((track_id, linked_id)) = path.map_err(|_| ApiError::UnknownPath)?;
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid vote"))?;

    let outcome = state
        .engine
        .set_vote(TrackId(track_id), TrackId(linked_id), Some(caller), request.vote)
        .await?;

    Ok(Json((outcome.score, outcome.applied)))
}

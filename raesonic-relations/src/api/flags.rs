//! Relation flag endpoint

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use raesonic_common::db::TrackId;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, Caller};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRequest {
    pub reason_id: i64,
}

/// POST /tracks/:track_id/relations/:linked_id/flags
///
/// Body `{reasonId}`; responds `[]` whether the flag was created, changed or
/// already in place.
pub async fn create_relation_flag(
    State(state): State<AppState>,
    Caller(caller): Caller,
    path: Result<Path<(i64, i64)>, PathRejection>,
    body: Result<Json<FlagRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path((track_id, linked_id)) = path.map_err(|_| ApiError::UnknownPath)?;
    let Json(request) = body.map_err(|_| ApiError::BadRequest("invalid reason"))?;

    state
        .engine
        .flag_relation(TrackId(track_id), TrackId(linked_id), Some(caller), request.reason_id)
        .await?;

    Ok(Json(json!([])))
}

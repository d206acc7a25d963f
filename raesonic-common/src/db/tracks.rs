//! Local projection of the Track Identity Store
//!
//! The relation engine only needs existence checks and the display fields
//! (artist, title) of the opposite track when listing relations.

use crate::db::models::TrackId;
use crate::Result;
use sqlx::{Executor, Sqlite};

/// Insert a track or refresh its display fields
pub async fn upsert_track<'e, E>(
    executor: E,
    track_id: TrackId,
    artist: &str,
    title: &str,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO tracks (track_id, artist, title) VALUES (?, ?, ?)
        ON CONFLICT(track_id) DO UPDATE SET artist = excluded.artist, title = excluded.title
        "#,
    )
    .bind(track_id)
    .bind(artist)
    .bind(title)
    .execute(executor)
    .await?;

    Ok(())
}

/// Does the track exist?
pub async fn track_exists<'e, E>(executor: E, track_id: TrackId) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tracks WHERE track_id = ?)")
        .bind(track_id)
        .fetch_one(executor)
        .await?;

    Ok(exists)
}

/// True only when both tracks exist
///
/// Distinct ids are expected; a self-pair counts once and reports `false`.
pub async fn tracks_exist<'e, E>(executor: E, first: TrackId, second: TrackId) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE track_id IN (?, ?)")
        .bind(first)
        .bind(second)
        .fetch_one(executor)
        .await?;

    Ok(found == 2)
}

//! Moderation flags on relations
//!
//! Only flag placement lives here; resolving flags belongs to moderation.

use raesonic_common::db::{RelationId, UserId};
use raesonic_common::Result;
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::engine::{FlagOutcome, FlagReason};

/// Does the user hold an unresolved flag on the relation?
pub async fn has_unresolved_flag<'e, E>(
    executor: E,
    relation_id: RelationId,
    user_id: UserId,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let flagged: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM relation_flags
            WHERE relation_id = ? AND user_id = ? AND resolved = 0
        )
        "#,
    )
    .bind(relation_id)
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(flagged)
}

/// Create the user's open flag, or change its reason
///
/// Must run inside a transaction: the insert attempt takes the write lock,
/// so the follow-up update sees the same flag row the insert collided with.
pub async fn set_flag(
    conn: &mut SqliteConnection,
    relation_id: RelationId,
    user_id: UserId,
    reason: FlagReason,
    now: i64,
) -> Result<FlagOutcome> {
    let created = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO relation_flags
            (relation_id, user_id, reason_id, resolved, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        ON CONFLICT DO NOTHING
        RETURNING flag_id
        "#,
    )
    .bind(relation_id)
    .bind(user_id)
    .bind(reason.id())
    .bind(now)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if created.is_some() {
        return Ok(FlagOutcome::Created);
    }

    let updated = sqlx::query(
        r#"
        UPDATE relation_flags SET reason_id = ?, updated_at = ?
        WHERE relation_id = ? AND user_id = ? AND resolved = 0 AND reason_id <> ?
        "#,
    )
    .bind(reason.id())
    .bind(now)
    .bind(relation_id)
    .bind(user_id)
    .bind(reason.id())
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(if updated > 0 {
        FlagOutcome::ReasonUpdated
    } else {
        FlagOutcome::Unchanged
    })
}

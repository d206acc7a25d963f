//! Vote ledger: one live, nonzero vote per (relation, user)

use raesonic_common::db::{RelationId, RelationVote, UserId};
use raesonic_common::Result;
use sqlx::{Executor, Sqlite, SqliteConnection};

/// The caller's current vote on a relation
pub async fn find_vote<'e, E>(
    executor: E,
    relation_id: RelationId,
    user_id: UserId,
) -> Result<Option<RelationVote>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let vote = sqlx::query_as::<_, RelationVote>(
        r#"
        SELECT vote_id, relation_id, user_id, value FROM relation_votes
        WHERE relation_id = ? AND user_id = ?
        "#,
    )
    .bind(relation_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(vote)
}

pub async fn insert_vote(
    conn: &mut SqliteConnection,
    relation_id: RelationId,
    user_id: UserId,
    value: i64,
    now: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO relation_votes (relation_id, user_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(relation_id)
    .bind(user_id)
    .bind(value)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_vote(
    conn: &mut SqliteConnection,
    relation_id: RelationId,
    user_id: UserId,
    value: i64,
    now: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE relation_votes SET value = ?, updated_at = ? WHERE relation_id = ? AND user_id = ?",
    )
    .bind(value)
    .bind(now)
    .bind(relation_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_vote(
    conn: &mut SqliteConnection,
    relation_id: RelationId,
    user_id: UserId,
) -> Result<()> {
    sqlx::query("DELETE FROM relation_votes WHERE relation_id = ? AND user_id = ?")
        .bind(relation_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Number of live votes on a relation
pub async fn count_votes<'e, E>(executor: E, relation_id: RelationId) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM relation_votes WHERE relation_id = ?")
        .bind(relation_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

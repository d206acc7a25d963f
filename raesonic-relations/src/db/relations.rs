//! Relation rows and their tallies

use raesonic_common::db::{Relation, RelationId, TrackId, UserId};
use raesonic_common::Result;
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::engine::transition::Tally;
use crate::engine::RelatedTrack;

const RELATION_COLUMNS: &str = "relation_id, track_id, linked_id, trust, doubt";

/// Find the relation for an unordered track pair without locking it
pub async fn find_relation_id<'e, E>(
    executor: E,
    first: TrackId,
    second: TrackId,
) -> Result<Option<RelationId>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id = sqlx::query_scalar::<_, RelationId>(
        r#"
        SELECT relation_id FROM relations
        WHERE (track_id = ?1 AND linked_id = ?2) OR (track_id = ?2 AND linked_id = ?1)
        "#,
    )
    .bind(first)
    .bind(second)
    .fetch_optional(executor)
    .await?;

    Ok(id)
}

/// Load a relation without locking it
pub async fn get_relation<'e, E>(executor: E, relation_id: RelationId) -> Result<Option<Relation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let relation = sqlx::query_as::<_, Relation>(&format!(
        "SELECT {} FROM relations WHERE relation_id = ?",
        RELATION_COLUMNS
    ))
    .bind(relation_id)
    .fetch_optional(executor)
    .await?;

    Ok(relation)
}

/// Insert a new edge carrying its creator's weight as initial trust
///
/// Returns `None` when the unordered pair already has a relation. As a write,
/// this statement also takes the database write lock for the surrounding
/// transaction.
pub async fn insert_relation(
    conn: &mut SqliteConnection,
    first: TrackId,
    second: TrackId,
    trust: i64,
    now: i64,
) -> Result<Option<RelationId>> {
    let id = sqlx::query_scalar::<_, RelationId>(
        r#"
        INSERT INTO relations (track_id, linked_id, trust, doubt, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, ?)
        ON CONFLICT DO NOTHING
        RETURNING relation_id
        "#,
    )
    .bind(first)
    .bind(second)
    .bind(trust)
    .bind(now)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id)
}

/// Read a relation by unordered pair for modification
///
/// Issued as a no-op `UPDATE ... RETURNING` so the read happens under the
/// write lock: no other transaction can change the tally between this read
/// and the commit.
pub async fn claim_relation_by_pair(
    conn: &mut SqliteConnection,
    first: TrackId,
    second: TrackId,
) -> Result<Option<Relation>> {
    let relation = sqlx::query_as::<_, Relation>(&format!(
        r#"
        UPDATE relations SET trust = trust
        WHERE (track_id = ?1 AND linked_id = ?2) OR (track_id = ?2 AND linked_id = ?1)
        RETURNING {}
        "#,
        RELATION_COLUMNS
    ))
    .bind(first)
    .bind(second)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(relation)
}

/// Persist a relation's tally
pub async fn store_tally(
    conn: &mut SqliteConnection,
    relation_id: RelationId,
    tally: Tally,
    now: i64,
) -> Result<()> {
    sqlx::query("UPDATE relations SET trust = ?, doubt = ?, updated_at = ? WHERE relation_id = ?")
        .bind(tally.trust)
        .bind(tally.doubt)
        .bind(now)
        .bind(relation_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Edges touching `track_id`, each resolved to its opposite track
///
/// Point-in-time read outside any transaction. `caller` decorates each edge
/// with the caller's vote and open-flag state.
pub async fn list_track_relations<'e, E>(
    executor: E,
    track_id: TrackId,
    caller: Option<UserId>,
    limit: i64,
) -> Result<Vec<RelatedTrack>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, RelatedTrack>(
        r#"
        SELECT
            r.relation_id AS relation_id,
            t.track_id AS track_id,
            t.artist AS artist,
            t.title AS title,
            r.trust - r.doubt AS score,
            COALESCE(v.value, 0) AS my_vote,
            EXISTS(
                SELECT 1 FROM relation_flags f
                WHERE f.relation_id = r.relation_id AND f.user_id = ?2 AND f.resolved = 0
            ) AS my_flagged
        FROM relations r
        JOIN tracks t
            ON t.track_id = CASE WHEN r.track_id = ?1 THEN r.linked_id ELSE r.track_id END
        LEFT JOIN relation_votes v
            ON v.relation_id = r.relation_id AND v.user_id = ?2
        WHERE r.track_id = ?1 OR r.linked_id = ?1
        ORDER BY r.relation_id
        LIMIT ?3
        "#,
    )
    .bind(track_id)
    .bind(caller)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// A relation whose stored tally disagrees with its vote ledger
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TallyDrift {
    pub relation_id: RelationId,
    pub trust: i64,
    pub doubt: i64,
    pub ledger_trust: i64,
    pub ledger_doubt: i64,
}

/// Relations whose tally no longer equals the sum of their votes
pub async fn find_drifted(conn: &mut SqliteConnection) -> Result<Vec<TallyDrift>> {
    let rows = sqlx::query_as::<_, TallyDrift>(
        r#"
        SELECT
            r.relation_id AS relation_id,
            r.trust AS trust,
            r.doubt AS doubt,
            COALESCE(SUM(CASE WHEN v.value > 0 THEN v.value ELSE 0 END), 0) AS ledger_trust,
            COALESCE(SUM(CASE WHEN v.value < 0 THEN -v.value ELSE 0 END), 0) AS ledger_doubt
        FROM relations r
        LEFT JOIN relation_votes v ON v.relation_id = r.relation_id
        GROUP BY r.relation_id
        HAVING r.trust <> ledger_trust OR r.doubt <> ledger_doubt
        ORDER BY r.relation_id
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

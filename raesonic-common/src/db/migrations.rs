//! Database schema migrations
//!
//! Versioned migrations tracked in the `schema_version` table. Each migration
//! is idempotent so a partially applied upgrade can simply be re-run.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field have already applied them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Prefer additive DDL** - `CREATE ... IF NOT EXISTS`, `ALTER TABLE ADD COLUMN`

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: one relation per unordered track pair
///
/// (A, B) and (B, A) must collide, so the unique index is built over the
/// normalized pair rather than the stored orientation. Refuses to proceed if
/// the table already holds duplicate pairs; merging their vote ledgers is a
/// manual decision.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: unique unordered pair index on relations");

    let duplicates: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM (
            SELECT MIN(track_id, linked_id) AS low, MAX(track_id, linked_id) AS high
            FROM relations
            GROUP BY low, high
            HAVING COUNT(*) > 1
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if duplicates > 0 {
        return Err(Error::Internal(format!(
            "relations table holds {} duplicated track pairs; resolve them before upgrading",
            duplicates
        )));
    }

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_relations_pair
        ON relations (MIN(track_id, linked_id), MAX(track_id, linked_id))
        "#,
    )
    .execute(pool)
    .await?;

    info!("  ✓ Created idx_relations_pair");
    Ok(())
}

/// Migration v2: at most one unresolved flag per (relation, user)
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: unique unresolved flag index on relation_flags");

    // Keep the newest unresolved flag when older databases accumulated several
    let removed = sqlx::query(
        r#"
        DELETE FROM relation_flags
        WHERE resolved = 0
          AND flag_id NOT IN (
              SELECT MAX(flag_id) FROM relation_flags
              WHERE resolved = 0
              GROUP BY relation_id, user_id
          )
        "#,
    )
    .execute(pool)
    .await?
    .rows_affected();

    if removed > 0 {
        warn!("  Removed {} superseded unresolved relation flags", removed);
    }

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_relation_flags_open
        ON relation_flags (relation_id, user_id)
        WHERE resolved = 0
        "#,
    )
    .execute(pool)
    .await?;

    info!("  ✓ Created idx_relation_flags_open");
    Ok(())
}

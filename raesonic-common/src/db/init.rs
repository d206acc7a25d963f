//! Database initialization
//!
//! Creates the database on first run, installs the default schema and
//! settings, then runs versioned migrations. Every step is idempotent so
//! the same sequence runs on each startup.

use crate::db::models::TrackId;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// SQLite busy handler budget for a single statement
///
/// Kept well below `relation_vote_max_lock_wait_ms`: contended vote
/// transactions fall back to `retry_on_lock`, which owns the overall wait.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Track that content is linked with until its real identity is known
pub const PLACEHOLDER_TRACK_ID: TrackId = TrackId(-1);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Connection options apply to every pooled connection, unlike a one-off
    // PRAGMA executed against the pool.
    // WAL allows concurrent readers alongside the single writer.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema_version_table(&pool).await?;
    create_settings_table(&pool).await?;
    create_tracks_table(&pool).await?;
    create_relations_table(&pool).await?;
    create_relation_votes_table(&pool).await?;
    create_relation_flags_table(&pool).await?;

    // Constraints that older databases may not carry yet
    crate::db::migrations::run_migrations(&pool).await?;

    crate::db::settings::init_default_settings(&pool).await?;

    crate::db::tracks::upsert_track(
        &pool,
        PLACEHOLDER_TRACK_ID,
        "Unknown Artist",
        "Unknown Track",
    )
    .await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tracks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            track_id INTEGER PRIMARY KEY,
            artist TEXT NOT NULL,
            title TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the relations table
///
/// `track_id`/`linked_id` keep the orientation the creator used; the pair is
/// unordered for identity purposes (see migration v1).
async fn create_relations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relations (
            relation_id INTEGER PRIMARY KEY AUTOINCREMENT,
            track_id INTEGER NOT NULL REFERENCES tracks(track_id),
            linked_id INTEGER NOT NULL REFERENCES tracks(track_id),
            trust INTEGER NOT NULL DEFAULT 0 CHECK (trust >= 0),
            doubt INTEGER NOT NULL DEFAULT 0 CHECK (doubt >= 0),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            CHECK (track_id <> linked_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_relations_track ON relations(track_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_relations_linked ON relations(linked_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the vote ledger
///
/// Only nonzero votes are stored; clearing a vote deletes its row.
async fn create_relation_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relation_votes (
            vote_id INTEGER PRIMARY KEY AUTOINCREMENT,
            relation_id INTEGER NOT NULL REFERENCES relations(relation_id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            value INTEGER NOT NULL CHECK (value <> 0),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (relation_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_relation_flags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relation_flags (
            flag_id INTEGER PRIMARY KEY AUTOINCREMENT,
            relation_id INTEGER NOT NULL REFERENCES relations(relation_id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL,
            reason_id INTEGER NOT NULL,
            resolved INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_relation_flags_user
        ON relation_flags(relation_id, user_id)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

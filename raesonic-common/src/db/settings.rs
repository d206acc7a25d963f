//! Runtime settings stored in the `settings` table

use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Wall-clock budget for retrying a vote transaction under lock contention
pub const VOTE_MAX_LOCK_WAIT_KEY: &str = "relation_vote_max_lock_wait_ms";

/// Default for [`VOTE_MAX_LOCK_WAIT_KEY`]
pub const DEFAULT_VOTE_MAX_LOCK_WAIT_MS: u64 = 5000;

/// Ensure every required setting exists with its default value
pub async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(
        pool,
        VOTE_MAX_LOCK_WAIT_KEY,
        &DEFAULT_VOTE_MAX_LOCK_WAIT_MS.to_string(),
    )
    .await?;

    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // INSERT OR IGNORE tolerates concurrent initialization
    let inserted = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(default_value)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let reset = sqlx::query("UPDATE settings SET value = ? WHERE key = ? AND value IS NULL")
        .bind(default_value)
        .bind(key)
        .execute(pool)
        .await?
        .rows_affected();

    if reset > 0 {
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Read a setting as a raw string
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    Ok(value.flatten())
}

/// Read a setting and parse it as an unsigned integer
pub async fn get_setting_u64(pool: &SqlitePool, key: &str) -> Result<Option<u64>> {
    match get_setting(pool, key).await? {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::Config(format!("Setting '{}' is not an integer: {}", key, e))),
        None => Ok(None),
    }
}

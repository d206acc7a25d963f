//! Caller identity verification
//!
//! The fronting layer that owns sessions forwards the authenticated user id
//! in a header. When the service has a non-zero shared secret, the id must be
//! accompanied by a signature so the service can tell a forwarded identity
//! from a forged one.
//!
//! # Rules
//!
//! - Signature = lowercase hex SHA-256 of `"{user_id}:{shared_secret}"`
//! - Shared secret stored in the settings table (`api_shared_secret`)
//! - Shared secret `0` disables signature checking
//!
//! Pure functions plus database operations; no HTTP framework dependencies.

use crate::db::models::UserId;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Settings key holding the shared secret
pub const SHARED_SECRET_KEY: &str = "api_shared_secret";

// ========================================
// Error Types
// ========================================

/// Caller authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// No user id was supplied
    MissingUserId,

    /// User id was not a positive integer
    InvalidUserId(String),

    /// Signature required but not supplied
    MissingSignature,

    /// Signature does not match calculated value
    InvalidSignature { provided: String, calculated: String },

    /// Database error loading shared secret
    DatabaseError(String),
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingUserId => write!(f, "Missing user id"),
            ApiAuthError::InvalidUserId(raw) => write!(f, "Invalid user id: {}", raw),
            ApiAuthError::MissingSignature => write!(f, "Missing signature"),
            ApiAuthError::InvalidSignature { .. } => write!(f, "Invalid signature"),
            ApiAuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Shared Secret Management
// ========================================

/// Load shared secret from database settings
///
/// Generates and stores a new secret when none exists yet.
pub async fn load_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    let result: Option<(Option<String>,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SHARED_SECRET_KEY)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((Some(value),)) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ApiAuthError::DatabaseError(format!("Invalid i64: {}", e))),
        _ => initialize_shared_secret(db).await,
    }
}

/// Generate a random non-zero secret and store it
pub async fn initialize_shared_secret(db: &SqlitePool) -> Result<i64, ApiAuthError> {
    use rand::Rng;

    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(SHARED_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| ApiAuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

// ========================================
// Identity Parsing and Signatures
// ========================================

/// Parse a forwarded user id
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiAuthError> {
    let id = raw
        .trim()
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| ApiAuthError::InvalidUserId(raw.to_string()))?;

    if !id.is_valid() {
        return Err(ApiAuthError::InvalidUserId(raw.to_string()));
    }

    Ok(id)
}

/// Calculate the signature for a user id
///
/// # Examples
///
/// ```
/// use raesonic_common::api::auth::calculate_signature;
/// use raesonic_common::db::UserId;
///
/// let signature = calculate_signature(UserId(42), 123456789);
/// assert_eq!(signature.len(), 64); // SHA-256 is 64 hex chars
/// ```
pub fn calculate_signature(user_id: UserId, shared_secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", user_id, shared_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a forwarded caller identity
///
/// With `shared_secret == 0` any well-formed user id is accepted.
pub fn verify_caller(
    user_id: Option<&str>,
    signature: Option<&str>,
    shared_secret: i64,
) -> Result<UserId, ApiAuthError> {
    let user_id = parse_user_id(user_id.ok_or(ApiAuthError::MissingUserId)?)?;

    if shared_secret == 0 {
        return Ok(user_id);
    }

    let provided = signature.ok_or(ApiAuthError::MissingSignature)?.trim();
    let calculated = calculate_signature(user_id, shared_secret);

    if !provided.eq_ignore_ascii_case(&calculated) {
        return Err(ApiAuthError::InvalidSignature {
            provided: provided.to_string(),
            calculated,
        });
    }

    Ok(user_id)
}

// ========================================
// Tests
// ========================================

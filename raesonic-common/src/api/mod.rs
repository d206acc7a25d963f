//! API module for shared HTTP API functionality
//!
//! Contains only pure functions, database operations and shared types; each
//! service wraps these with its own framework-specific extractors.

pub mod auth;
pub mod types;

pub use auth::{
    calculate_signature, initialize_shared_secret, load_shared_secret, parse_user_id,
    verify_caller, ApiAuthError,
};
pub use types::{ErrorResponse, HealthResponse};

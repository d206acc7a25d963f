//! # Raesonic Common Library
//!
//! Shared code for Raesonic services including:
//! - Database initialization, migrations and row models
//! - Track identity lookups and runtime settings
//! - Caller authentication helpers and wire error types
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};

//! Relation repository, vote ledger and flag store
//!
//! Functions that participate in a vote transition take a
//! `&mut SqliteConnection` so the engine can run them inside its own
//! transaction; read-only helpers accept any executor.

pub mod flags;
pub mod relations;
pub mod votes;

//! Database models and queries

pub mod init;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod tracks;

pub use init::*;
pub use migrations::*;
pub use models::*;
pub use settings::*;
pub use tracks::*;

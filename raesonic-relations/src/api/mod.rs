//! HTTP API handlers for raesonic-relations

pub mod caller;
pub mod error;
pub mod flags;
pub mod health;
pub mod relations;

pub use caller::Caller;
pub use error::ApiError;
pub use flags::create_relation_flag;
pub use health::health_routes;
pub use relations::{create_relation, get_track_relations, update_relation_vote};

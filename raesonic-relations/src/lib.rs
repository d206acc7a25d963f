//! raesonic-relations library - track relation trust engine and its HTTP API

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod engine;

pub use engine::TrustEngine;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TrustEngine>,
    /// Shared secret for caller signatures; 0 disables the check
    pub shared_secret: i64,
}

impl AppState {
    pub fn new(engine: TrustEngine, shared_secret: i64) -> Self {
        Self {
            engine: Arc::new(engine),
            shared_secret,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        .route("/relations", post(api::create_relation))
        .route("/tracks/:track_id/relations", get(api::get_track_relations))
        .route(
            "/tracks/:track_id/relations/:linked_id/votes",
            put(api::update_relation_vote),
        )
        .route(
            "/tracks/:track_id/relations/:linked_id/flags",
            post(api::create_relation_flag),
        )
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

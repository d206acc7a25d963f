//! Integration tests for raesonic-relations API endpoints
//!
//! Requests go through the full router with `oneshot`, against a fresh
//! database per test.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use raesonic_common::api::auth::calculate_signature;
use raesonic_common::db::{init_database, upsert_track, TrackId, UserId};
use raesonic_relations::{build_router, AppState, TrustEngine};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: Create app over a fresh database with tracks 10, 20 and 30
async fn setup_app(shared_secret: i64) -> (TempDir, axum::Router) {
    let dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("raesonic.db"))
        .await
        .expect("Should initialize database");

    let tracks = [
        (10, "Artist A", "Title A"),
        (20, "Artist B", "Title B"),
        (30, "Artist C", "Title C"),
    ];
    for (id, artist, title) in tracks {
        upsert_track(&pool, TrackId(id), artist, title).await.unwrap();
    }

    let state = AppState::new(TrustEngine::new(pool), shared_secret);
    (dir, build_router(state))
}

/// Test helper: Request as `user` (no identity headers when `None`)
fn request(method: &str, uri: &str, user: Option<i64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

/// Test helper: `user` relates tracks 10 and 20 (auth disabled)
async fn create_pair(app: &axum::Router, user: i64) {
    let pair = json!({"trackId": 10, "linkedId": 20});
    let (status, _) = send(app, request("POST", "/relations", Some(user), Some(pair))).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (_dir, app) = setup_app(12345).await;

    let (status, body) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "raesonic-relations");
    assert!(body["version"].is_string());
}

// =============================================================================
// Create and vote
// =============================================================================

#[tokio::test]
async fn test_create_then_upvote_then_downvote() {
    let (_dir, app) = setup_app(0).await;
    let pair = json!({"trackId": 10, "linkedId": 20});

    let (status, body) = send(
        &app,
        request("POST", "/relations", Some(1), Some(pair.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([1, 1]));

    let (status, body) = send(&app, request("POST", "/relations", Some(2), Some(pair))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([1, 2]));

    let (status, body) = send(
        &app,
        request("PUT", "/tracks/10/relations/20/votes", Some(2), Some(json!({"vote": -1}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([0, -1]));
}

#[tokio::test]
async fn test_vote_via_reversed_pair() {
    let (_dir, app) = setup_app(0).await;
    create_pair(&app, 1).await;

    let (status, body) = send(
        &app,
        request("PUT", "/tracks/20/relations/10/votes", Some(1), Some(json!({"vote": 0}))),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([0, 0]));
}

#[tokio::test]
async fn test_create_rejections() {
    let (_dir, app) = setup_app(0).await;

    let (status, body) = send(
        &app,
        request("POST", "/relations", Some(1), Some(json!({"trackId": 10, "linkedId": 10}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"errors": ["self-link not allowed"]}));

    let (status, body) = send(
        &app,
        request("POST", "/relations", Some(1), Some(json!({"trackId": "ten", "linkedId": 20}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"errors": ["invalid ids"]}));

    let (status, body) = send(
        &app,
        request("POST", "/relations", Some(1), Some(json!({"trackId": 10, "linkedId": 99}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": ["track not found"]}));
}

#[tokio::test]
async fn test_vote_rejections() {
    let (_dir, app) = setup_app(0).await;
    create_pair(&app, 1).await;

    let (status, body) = send(
        &app,
        request("PUT", "/tracks/10/relations/20/votes", Some(1), Some(json!({"vote": 5}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"errors": ["invalid vote"]}));

    let (status, body) = send(
        &app,
        request("PUT", "/tracks/10/relations/30/votes", Some(1), Some(json!({"vote": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": ["relation not found"]}));

    let (status, body) = send(
        &app,
        request("PUT", "/tracks/abc/relations/20/votes", Some(1), Some(json!({"vote": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": ["not found"]}));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_rows_are_positional() {
    let (_dir, app) = setup_app(0).await;
    create_pair(&app, 1).await;

    let (status, body) = send(&app, request("GET", "/tracks/20/relations", Some(1), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[10, "Artist A", "Title A", 1, 1, false]]));

    let (status, body) = send(&app, request("GET", "/tracks/20/relations", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([[10, "Artist A", "Title A", 1, 0, false]]));
}

#[tokio::test]
async fn test_listing_unknown_track_is_empty() {
    let (_dir, app) = setup_app(0).await;

    let (status, body) = send(&app, request("GET", "/tracks/999/relations", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_non_numeric_track_path_is_not_found() {
    let (_dir, app) = setup_app(0).await;

    let (status, body) = send(&app, request("GET", "/tracks/abc/relations", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"errors": ["not found"]}));

    let (status, _) = send(
        &app,
        request("POST", "/tracks/10/relations/x/flags", Some(1), Some(json!({"reasonId": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Flags
// =============================================================================

#[tokio::test]
async fn test_flag_shows_in_listing() {
    let (_dir, app) = setup_app(0).await;
    create_pair(&app, 1).await;

    let (status, body) = send(
        &app,
        request("POST", "/tracks/10/relations/20/flags", Some(2), Some(json!({"reasonId": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(&app, request("GET", "/tracks/10/relations", Some(2), None)).await;
    assert_eq!(body[0][5], json!(true));

    let (status, body) = send(
        &app,
        request("POST", "/tracks/10/relations/20/flags", Some(2), Some(json!({"reasonId": 9}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"errors": ["invalid reason"]}));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_mutations_require_user_id() {
    let (_dir, app) = setup_app(0).await;

    let (status, body) = send(
        &app,
        request("POST", "/relations", None, Some(json!({"trackId": 10, "linkedId": 20}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors": ["not authenticated"]}));

    let (status, _) = send(
        &app,
        request("PUT", "/tracks/10/relations/20/votes", None, Some(json!({"vote": 1}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_caller_accepted_and_forgery_rejected() {
    let secret = 987_654_321;
    let (_dir, app) = setup_app(secret).await;
    let body = json!({"trackId": 10, "linkedId": 20});

    let unsigned = request("POST", "/relations", Some(4), Some(body.clone()));
    let (status, _) = send(&app, unsigned).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut forged = request("POST", "/relations", Some(4), Some(body.clone()));
    forged
        .headers_mut()
        .insert("x-user-signature", calculate_signature(UserId(5), secret).parse().unwrap());
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut signed = request("POST", "/relations", Some(4), Some(body));
    signed
        .headers_mut()
        .insert("x-user-signature", calculate_signature(UserId(4), secret).parse().unwrap());
    let (status, body) = send(&app, signed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([1, 1]));
}

#[tokio::test]
async fn test_unsigned_listing_is_anonymous() {
    let secret = 42;
    let (_dir, app) = setup_app(secret).await;

    let pair = json!({"trackId": 10, "linkedId": 20});
    let mut signed = request("POST", "/relations", Some(4), Some(pair));
    signed
        .headers_mut()
        .insert("x-user-signature", calculate_signature(UserId(4), secret).parse().unwrap());
    send(&app, signed).await;

    // Identity without a valid signature falls back to anonymous for reads
    let (status, body) = send(&app, request("GET", "/tracks/10/relations", Some(4), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0][4], json!(0));
}

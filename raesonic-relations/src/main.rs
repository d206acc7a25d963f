//! raesonic-relations - track relation trust service
//!
//! Serves relation creation, listing, voting and flagging over HTTP on top of
//! the shared Raesonic database.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use raesonic_common::api::auth::load_shared_secret;
use raesonic_common::config::{database_path, resolve_root_folder, ROOT_FOLDER_ENV};
use raesonic_common::db::init_database;
use raesonic_relations::{build_router, AppState, TrustEngine};
use tokio::signal;
use tracing::info;

/// Command-line arguments for raesonic-relations
#[derive(Parser, Debug)]
#[command(name = "raesonic-relations")]
#[command(about = "Track relation trust service for Raesonic")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "RAESONIC_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1", env = "RAESONIC_BIND")]
    bind: std::net::IpAddr,

    /// Root folder holding raesonic.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Recompute relation tallies from the vote ledger before serving
    #[arg(long)]
    reconcile: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "raesonic_relations=info,raesonic_common=info,tower_http=info".into()
            }),
        )
        .init();

    info!(
        "Starting raesonic-relations v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV);
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load shared secret")?;
    if shared_secret == 0 {
        info!("Caller signature checking disabled (shared_secret = 0)");
    }

    let engine = TrustEngine::from_settings(pool)
        .await
        .context("Failed to configure relation engine")?;

    if args.reconcile {
        let corrected = engine
            .reconcile()
            .await
            .context("Relation tally reconciliation failed")?;
        info!("Reconciled {} relation tallies", corrected);
    }

    let app = build_router(AppState::new(engine, shared_secret));

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("raesonic-relations listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}

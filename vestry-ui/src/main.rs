//! vestry-ui - Wardrobe catalog service
//!
//! Local-first wardrobe cataloging: photograph clothing items, tag them with
//! category/color/season metadata, and compose outfits from saved items.
//! Serves the catalog API, the outfit composer, and the embedded web UI on
//! 127.0.0.1 (default port 5750). All data lives in a single SQLite file in
//! the resolved root folder.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vestry_common::config::{
    config_file_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use vestry_common::db;
use vestry_common::events::EventBus;
use vestry_ui::{backfill, build_router, AppState};

/// Command-line arguments for vestry-ui
#[derive(Parser, Debug)]
#[command(name = "vestry-ui")]
#[command(about = "Personal wardrobe catalog and outfit composer")]
#[command(version)]
struct Args {
    /// Port to listen on (config file / 5750 when omitted)
    #[arg(short, long, env = "VESTRY_UI_PORT")]
    port: Option<u16>,

    /// Root folder holding the database file
    #[arg(short, long, env = "VESTRY_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vestry_ui=info,vestry_common=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting vestry-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Root folder: CLI argument outranks the resolver's tiers
    let root_folder = match args.root_folder {
        Some(path) => path,
        None => RootFolderResolver::new("vestry-ui").resolve(),
    };
    info!("Root folder: {}", root_folder.display());

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    // Event bus for SSE broadcasting
    let events = EventBus::new(100);

    let max_upload_bytes = db::settings::get_max_upload_bytes(&pool)
        .await
        .context("Failed to read upload limit")?;

    let state = AppState::new(pool, events, max_upload_bytes);

    // Sweep any items still missing their thumbnail derivative
    backfill::spawn_sweep(state.clone());

    let app = build_router(state);

    let port = resolve_port(args.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("vestry-ui listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Port priority: CLI/env argument, then config file, then 5750
fn resolve_port(arg_port: Option<u16>) -> u16 {
    if let Some(port) = arg_port {
        return port;
    }
    if let Some(config_path) = config_file_path("vestry-ui") {
        match TomlConfig::load(&config_path) {
            Ok(config) => {
                if let Some(port) = config.port {
                    return port;
                }
            }
            Err(e) => {
                warn!("Ignoring unreadable config file {:?}: {}", config_path, e);
            }
        }
    }
    5750
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

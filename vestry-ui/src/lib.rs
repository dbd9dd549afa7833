//! vestry-ui library interface
//!
//! Exposes the application state, router, image pipeline, and thumbnail
//! backfill sweep for the binary and for integration tests.

pub mod api;
pub mod backfill;
pub mod error;
pub mod pipeline;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vestry_common::events::EventBus;
use vestry_common::outfit::OutfitSlots;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub events: EventBus,
    /// Active outfit composition (in-memory only, lost on restart)
    pub composition: Arc<RwLock<OutfitSlots>>,
    /// Single-flight guard for the thumbnail backfill sweep
    pub backfill_running: Arc<AtomicBool>,
    /// Request body cap for photo uploads, from the settings table
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, events: EventBus, max_upload_bytes: usize) -> Self {
        Self {
            db,
            events,
            composition: Arc::new(RwLock::new(OutfitSlots::new())),
            backfill_running: Arc::new(AtomicBool::new(false)),
            max_upload_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        // UI routes (HTML shell and embedded assets)
        .merge(api::ui_routes())
        // Catalog and item lifecycle
        .merge(api::item_routes())
        .merge(api::image_routes())
        // Active composition and saved outfits
        .merge(api::composer_routes())
        .merge(api::outfit_routes())
        // SSE event stream
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}

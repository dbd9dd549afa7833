//! Thumbnail backfill sweep
//!
//! Records stored before thumbnails existed carry only the full derivative.
//! The sweep collects every such item once, then regenerates thumbnails in
//! small batches so interactive requests stay responsive. Per-item failures
//! are logged and skipped.

use std::sync::atomic::Ordering;

use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vestry_common::db;
use vestry_common::db::items::ImageBlob;
use vestry_common::events::VestryEvent;
use vestry_common::{Error, Result};

use crate::pipeline;
use crate::AppState;

/// Run the sweep on a background task
pub fn spawn_sweep(state: AppState) {
    tokio::spawn(run_sweep(state));
}

/// Generate thumbnails for every item missing one
///
/// Single-flight: a second call while a sweep is in progress returns
/// immediately.
pub async fn run_sweep(state: AppState) {
    if state
        .backfill_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("Thumbnail sweep already running, skipping");
        return;
    }

    let generated = sweep(&state).await;
    if generated > 0 {
        info!("Thumbnail sweep complete: {} thumbnails generated", generated);
    }

    state.backfill_running.store(false, Ordering::SeqCst);
}

async fn sweep(state: &AppState) -> u64 {
    // Collect the pending set once; items failing repeatedly must not pin
    // the sweep to the head of the queue
    let pending = match db::items::items_missing_thumbnails(&state.db, i64::MAX).await {
        Ok(guids) => guids,
        Err(e) => {
            error!("Thumbnail sweep query failed: {}", e);
            return 0;
        }
    };
    if pending.is_empty() {
        return 0;
    }
    info!("Thumbnail sweep: {} items missing thumbnails", pending.len());

    let batch_size = match db::settings::get_backfill_batch_size(&state.db).await {
        Ok(n) => n.max(1) as usize,
        Err(e) => {
            warn!("Using default sweep batch size: {}", e);
            4
        }
    };

    let mut generated = 0u64;
    for batch in pending.chunks(batch_size) {
        for &guid in batch {
            match backfill_one(state, guid).await {
                Ok(()) => {
                    generated += 1;
                    state.events.emit_lossy(VestryEvent::ItemThumbnailReady {
                        item_guid: guid,
                        timestamp: chrono::Utc::now(),
                    });
                }
                Err(e) => warn!("Thumbnail backfill failed for {}: {}", guid, e),
            }
        }
        // Yield to interactive requests between batches
        tokio::task::yield_now().await;
    }
    generated
}

async fn backfill_one(state: &AppState, guid: Uuid) -> Result<()> {
    let full = db::items::load_full_image(&state.db, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("item {}", guid)))?;

    // JPEG decode and re-encode is CPU-bound
    let thumb = tokio::task::spawn_blocking(move || pipeline::regenerate_thumbnail(&full))
        .await
        .map_err(|e| Error::Internal(format!("sweep task panicked: {}", e)))??;

    let blob = ImageBlob {
        bytes: thumb.jpeg,
        width: thumb.width as i64,
        height: thumb.height as i64,
    };
    let updated = db::items::update_item_thumbnail(&state.db, guid, &blob).await?;
    if !updated {
        // Item deleted mid-sweep
        return Err(Error::NotFound(format!("item {}", guid)));
    }
    Ok(())
}

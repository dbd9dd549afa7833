//! Saved outfit listing and deletion

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use vestry_common::db::items;
use vestry_common::db::outfits;
use vestry_common::events::VestryEvent;
use vestry_common::outfit::{summarize_slot, SlotItemInfo};
use vestry_common::taxonomy::Category;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Build saved outfit routes
pub fn outfit_routes() -> Router<AppState> {
    Router::new()
        .route("/api/outfits", get(list_outfits))
        .route("/api/outfits/:guid", axum::routing::delete(delete_outfit))
}

/// Display summary of one occupied slot
#[derive(Debug, Serialize)]
pub struct OutfitSlotSummary {
    pub category: Category,
    pub label: String,
    pub summary: String,
}

/// One saved outfit in the listing
#[derive(Debug, Serialize)]
pub struct OutfitView {
    pub guid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub item_count: usize,
    /// Occupied slots only, canonical order
    pub slots: Vec<OutfitSlotSummary>,
}

/// Saved outfit listing response
#[derive(Debug, Serialize)]
pub struct OutfitListResponse {
    pub outfits: Vec<OutfitView>,
}

/// GET /api/outfits
///
/// Newest first, each with per-slot display summaries resolved against the
/// current item metadata.
pub async fn list_outfits(State(state): State<AppState>) -> ApiResult<Json<OutfitListResponse>> {
    let saved = outfits::list_outfits(&state.db).await?;

    let mut views = Vec::with_capacity(saved.len());
    for outfit in saved {
        let mut slots = Vec::new();
        let mut item_count = 0;
        for category in Category::all() {
            let guids = outfit.slots.items_in(category);
            if guids.is_empty() {
                continue;
            }
            let mut infos = Vec::new();
            for &guid in guids {
                if let Some(record) = items::load_item(&state.db, guid).await? {
                    infos.push(SlotItemInfo {
                        tag: record.tag,
                        color: record.color,
                    });
                }
            }
            item_count += infos.len();
            slots.push(OutfitSlotSummary {
                category,
                label: category.label().to_string(),
                summary: summarize_slot(&infos),
            });
        }
        views.push(OutfitView {
            guid: outfit.guid,
            name: outfit.name,
            created_at: outfit.created_at,
            item_count,
            slots,
        });
    }

    Ok(Json(OutfitListResponse { outfits: views }))
}

/// DELETE /api/outfits/:guid
pub async fn delete_outfit(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = outfits::delete_outfit(&state.db, guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("outfit {}", guid)));
    }

    state.events.emit_lossy(VestryEvent::OutfitDeleted {
        outfit_guid: guid,
        timestamp: Utc::now(),
    });

    Ok(StatusCode::NO_CONTENT)
}

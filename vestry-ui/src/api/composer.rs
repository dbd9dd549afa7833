//! Outfit composer API
//!
//! The active composition is in-memory only and lost on restart; saving
//! snapshots it into the outfits table. Slot order follows the canonical
//! category order, head to toe.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vestry_common::db::items;
use vestry_common::db::outfits::{self, SavedOutfit};
use vestry_common::events::VestryEvent;
use vestry_common::outfit::{summarize_slot, SlotItemInfo};
use vestry_common::taxonomy::Category;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Build active composition routes
pub fn composer_routes() -> Router<AppState> {
    Router::new()
        .route("/api/composer", get(get_composer).delete(clear_composer))
        .route(
            "/api/composer/slots/:category",
            put(assign_slot).delete(unassign_slot),
        )
        .route("/api/composer/save", post(save_composition))
        .route("/api/composer/load/:guid", post(load_composition))
}

/// One resolved item inside a slot
#[derive(Debug, Serialize)]
pub struct SlotItemView {
    pub guid: Uuid,
    pub tag: String,
    pub color: String,
    pub has_thumbnail: bool,
}

/// One slot of the active composition
#[derive(Debug, Serialize)]
pub struct SlotView {
    pub category: Category,
    pub label: String,
    pub multi: bool,
    /// Derived display text ("tag · color", "N items: a / b", or "—")
    pub summary: String,
    pub items: Vec<SlotItemView>,
}

/// Active composition response
#[derive(Debug, Serialize)]
pub struct ComposerResponse {
    pub slots: Vec<SlotView>,
    pub occupied_slots: usize,
}

/// GET /api/composer
pub async fn get_composer(State(state): State<AppState>) -> ApiResult<Json<ComposerResponse>> {
    build_composer_view(&state).await
}

/// Slot assignment request
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub item: Uuid,
}

/// PUT /api/composer/slots/:category
///
/// Single-slot categories replace their occupant; multi-slot categories
/// append (idempotent per guid). The item must exist and belong to the
/// slot's category.
pub async fn assign_slot(
    State(state): State<AppState>,
    Path(category): Path<Category>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<ComposerResponse>> {
    let record = items::load_item(&state.db, request.item)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {}", request.item)))?;
    if record.category != category {
        return Err(ApiError::BadRequest(format!(
            "item {} is {}, not {}",
            request.item, record.category, category
        )));
    }

    {
        let mut composition = state.composition.write().await;
        composition.assign(category, request.item);
    }
    emit_composition_changed(&state).await;

    build_composer_view(&state).await
}

/// Unassign query: a specific guid, or the whole slot when omitted
#[derive(Debug, Deserialize)]
pub struct UnassignQuery {
    pub item: Option<Uuid>,
}

/// DELETE /api/composer/slots/:category
pub async fn unassign_slot(
    State(state): State<AppState>,
    Path(category): Path<Category>,
    Query(query): Query<UnassignQuery>,
) -> ApiResult<Json<ComposerResponse>> {
    {
        let mut composition = state.composition.write().await;
        match query.item {
            Some(guid) => {
                composition.unassign(category, guid);
            }
            None => composition.clear_slot(category),
        }
    }
    emit_composition_changed(&state).await;

    build_composer_view(&state).await
}

/// DELETE /api/composer
pub async fn clear_composer(State(state): State<AppState>) -> ApiResult<Json<ComposerResponse>> {
    {
        let mut composition = state.composition.write().await;
        composition.clear_all();
    }
    emit_composition_changed(&state).await;

    build_composer_view(&state).await
}

/// Save request; a missing or blank name gets a timestamped default
#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    pub name: Option<String>,
}

/// Saved outfit identity returned on save
#[derive(Debug, Serialize)]
pub struct SavedOutfitResponse {
    pub guid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// POST /api/composer/save
///
/// Persists the active composition. An all-empty composition is rejected.
pub async fn save_composition(
    State(state): State<AppState>,
    request: Option<Json<SaveRequest>>,
) -> ApiResult<(StatusCode, Json<SavedOutfitResponse>)> {
    let slots = {
        let composition = state.composition.read().await;
        composition.clone()
    };
    if slots.is_empty() {
        return Err(ApiError::BadRequest(
            "composition is empty: assign at least one item before saving".to_string(),
        ));
    }

    let name = request
        .and_then(|Json(r)| r.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Outfit {}", Local::now().format("%Y-%m-%d %H:%M")));

    let outfit = SavedOutfit::new(name, slots);
    outfits::insert_outfit(&state.db, &outfit).await?;

    state.events.emit_lossy(VestryEvent::OutfitSaved {
        outfit_guid: outfit.guid,
        name: outfit.name.clone(),
        timestamp: Utc::now(),
    });

    Ok((
        StatusCode::CREATED,
        Json(SavedOutfitResponse {
            guid: outfit.guid,
            name: outfit.name,
            created_at: outfit.created_at,
        }),
    ))
}

/// POST /api/composer/load/:guid
///
/// Replaces the active composition with a saved outfit's slots. Guids whose
/// items have since been deleted are dropped.
pub async fn load_composition(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<ComposerResponse>> {
    let outfit = outfits::load_outfit(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("outfit {}", guid)))?;

    let mut slots = outfit.slots;
    let referenced = slots.all_items();
    let existing = items::existing_guids(&state.db, &referenced).await?;
    slots.retain_items(|item| existing.contains(item));

    {
        let mut composition = state.composition.write().await;
        *composition = slots;
    }
    emit_composition_changed(&state).await;

    build_composer_view(&state).await
}

/// Broadcast the current occupancy after any composition mutation
pub(crate) async fn emit_composition_changed(state: &AppState) {
    let occupied_slots = {
        let composition = state.composition.read().await;
        composition.occupied_slot_count()
    };
    state.events.emit_lossy(VestryEvent::CompositionChanged {
        occupied_slots,
        timestamp: Utc::now(),
    });
}

/// Resolve the active composition into its display form
async fn build_composer_view(state: &AppState) -> ApiResult<Json<ComposerResponse>> {
    let snapshot = {
        let composition = state.composition.read().await;
        composition.clone()
    };

    let mut slots = Vec::with_capacity(Category::all().len());
    for category in Category::all() {
        let mut infos = Vec::new();
        let mut item_views = Vec::new();
        for &guid in snapshot.items_in(category) {
            // Stale guids (deleted mid-request) simply drop out of the view
            if let Some(record) = items::load_item(&state.db, guid).await? {
                infos.push(SlotItemInfo {
                    tag: record.tag.clone(),
                    color: record.color.clone(),
                });
                item_views.push(SlotItemView {
                    guid,
                    tag: record.tag,
                    color: record.color,
                    has_thumbnail: record.has_thumbnail,
                });
            }
        }
        slots.push(SlotView {
            category,
            label: category.label().to_string(),
            multi: category.is_multi_slot(),
            summary: summarize_slot(&infos),
            items: item_views,
        });
    }

    Ok(Json(ComposerResponse {
        occupied_slots: snapshot.occupied_slot_count(),
        slots,
    }))
}

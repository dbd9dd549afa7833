//! Catalog and item lifecycle API
//!
//! Listing is paginated and never returns image payloads; cards fetch their
//! derivatives separately through the image endpoint. Uploads arrive as raw
//! photo bytes with metadata in query parameters.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vestry_common::db::items::{self, ImageBlob, ItemFilter, ItemRecord, NewItem};
use vestry_common::db::outfits;
use vestry_common::events::VestryEvent;
use vestry_common::pagination::{calculate_pagination, PAGE_SIZE};
use vestry_common::taxonomy::{parse_season_set, Category, Season};

use crate::error::{ApiError, ApiResult};
use crate::pipeline;
use crate::AppState;

/// Build catalog and item lifecycle routes
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route("/api/items/facets", get(get_facets))
        .route(
            "/api/items/:guid",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/library/clear", post(clear_library))
}

/// Item metadata sent to the UI (no image payloads)
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub guid: Uuid,
    pub category: Category,
    pub seasons: Vec<Season>,
    pub color: String,
    pub tag: String,
    pub full_width: i64,
    pub full_height: i64,
    pub has_thumbnail: bool,
    pub thumb_width: Option<i64>,
    pub thumb_height: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemRecord> for ItemSummary {
    fn from(record: ItemRecord) -> Self {
        Self {
            guid: record.guid,
            category: record.category,
            seasons: record.seasons,
            color: record.color,
            tag: record.tag,
            full_width: record.full_width,
            full_height: record.full_height,
            has_thumbnail: record.has_thumbnail,
            thumb_width: record.thumb_width,
            thumb_height: record.thumb_height,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Query parameters for catalog listing
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Page number (1-indexed, clamped into range)
    #[serde(default = "default_page")]
    pub page: i64,
    pub category: Option<String>,
    /// Comma-separated season names
    pub seasons: Option<String>,
    pub color: Option<String>,
    pub tag: Option<String>,
}

fn default_page() -> i64 {
    1
}

/// Catalog page response
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub items: Vec<ItemSummary>,
    pub page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

/// GET /api/items
///
/// Paginated catalog, newest first. Out-of-range pages clamp to the last
/// page instead of erroring.
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<CatalogResponse>> {
    let filter = parse_filter(&query)?;

    let total_items = items::count_items(&state.db, &filter).await?;
    let pagination = calculate_pagination(total_items, query.page);

    let records = items::list_items(&state.db, &filter, PAGE_SIZE, pagination.offset).await?;

    Ok(Json(CatalogResponse {
        items: records.into_iter().map(ItemSummary::from).collect(),
        page: pagination.page,
        total_pages: pagination.total_pages,
        total_items,
    }))
}

fn parse_filter(query: &CatalogQuery) -> ApiResult<ItemFilter> {
    let mut filter = ItemFilter::default();
    if let Some(category) = non_empty(query.category.as_deref()) {
        filter.category = Some(category.parse().map_err(ApiError::from)?);
    }
    if let Some(seasons) = non_empty(query.seasons.as_deref()) {
        filter.seasons = parse_season_list(seasons)?;
    }
    filter.color = non_empty(query.color.as_deref()).map(str::to_string);
    filter.tag = non_empty(query.tag.as_deref()).map(str::to_string);
    Ok(filter)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a comma-separated season list, rejecting unknown names
fn parse_season_list(raw: &str) -> ApiResult<Vec<Season>> {
    let names: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    Ok(parse_season_set(&names)?)
}

/// Query parameters accompanying a photo upload
#[derive(Debug, Deserialize)]
pub struct NewItemQuery {
    pub category: Option<String>,
    /// Comma-separated season names
    pub seasons: Option<String>,
    pub color: Option<String>,
    pub tag: Option<String>,
}

/// POST /api/items
///
/// Body is the raw photo upload; the pipeline produces both derivatives
/// before the record is stored. Responds 201 with the stored metadata.
pub async fn create_item(
    State(state): State<AppState>,
    Query(query): Query<NewItemQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ItemSummary>)> {
    let category: Category = non_empty(query.category.as_deref())
        .ok_or_else(|| ApiError::BadRequest("category is required".to_string()))?
        .parse()
        .map_err(ApiError::from)?;
    let seasons = match non_empty(query.seasons.as_deref()) {
        Some(raw) => parse_season_list(raw)?,
        None => Vec::new(),
    };
    if body.is_empty() {
        return Err(ApiError::BadRequest("photo upload is empty".to_string()));
    }

    // Derivative generation is CPU-bound
    let upload = body.to_vec();
    let processed = tokio::task::spawn_blocking(move || pipeline::process_upload(&upload))
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task panicked: {}", e)))??;

    let item = NewItem::new(
        category,
        seasons,
        non_empty(query.color.as_deref()).unwrap_or("").to_string(),
        non_empty(query.tag.as_deref()).unwrap_or("").to_string(),
        ImageBlob {
            bytes: processed.full.jpeg,
            width: processed.full.width as i64,
            height: processed.full.height as i64,
        },
        Some(ImageBlob {
            bytes: processed.thumb.jpeg,
            width: processed.thumb.width as i64,
            height: processed.thumb.height as i64,
        }),
    );
    items::insert_item(&state.db, &item).await?;

    state.events.emit_lossy(VestryEvent::ItemAdded {
        item_guid: item.guid,
        category,
        timestamp: Utc::now(),
    });

    let record = items::load_item(&state.db, item.guid)
        .await?
        .ok_or_else(|| ApiError::Internal("stored item vanished".to_string()))?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /api/items/:guid
pub async fn get_item(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<Json<ItemSummary>> {
    let record = items::load_item(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {}", guid)))?;
    Ok(Json(record.into()))
}

/// Metadata edit request
#[derive(Debug, Deserialize)]
pub struct ItemEdit {
    pub category: String,
    #[serde(default)]
    pub seasons: Vec<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub tag: String,
}

/// PUT /api/items/:guid
///
/// Replaces the item's metadata. A category change scrubs stale slot
/// placements from saved outfits and the active composition; re-adding
/// under the new category is the user's move.
pub async fn update_item(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Json(edit): Json<ItemEdit>,
) -> ApiResult<Json<ItemSummary>> {
    let category: Category = edit.category.parse().map_err(ApiError::from)?;
    let seasons = parse_season_set(&edit.seasons)?;

    let existing = items::load_item(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {}", guid)))?;
    let category_changed = existing.category != category;

    items::update_item_metadata(
        &state.db,
        guid,
        category,
        &seasons,
        edit.color.trim(),
        edit.tag.trim(),
    )
    .await?;

    if category_changed {
        outfits::purge_category_mismatches(&state.db, guid, category).await?;
        let composition_changed = {
            let mut composition = state.composition.write().await;
            composition.purge_category_mismatches(guid, category)
        };
        if composition_changed {
            super::composer::emit_composition_changed(&state).await;
        }
    }

    state.events.emit_lossy(VestryEvent::ItemUpdated {
        item_guid: guid,
        timestamp: Utc::now(),
    });

    let record = items::load_item(&state.db, guid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("item {}", guid)))?;
    Ok(Json(record.into()))
}

/// DELETE /api/items/:guid
///
/// Removes the record and scrubs the guid from every saved outfit and the
/// active composition.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = items::delete_item(&state.db, guid).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("item {}", guid)));
    }

    outfits::strip_item_refs(&state.db, guid).await?;
    let composition_changed = {
        let mut composition = state.composition.write().await;
        composition.remove_item_everywhere(guid)
    };

    state.events.emit_lossy(VestryEvent::ItemDeleted {
        item_guid: guid,
        timestamp: Utc::now(),
    });
    if composition_changed {
        super::composer::emit_composition_changed(&state).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Facet query (optional category narrows the tag list)
#[derive(Debug, Deserialize)]
pub struct FacetQuery {
    pub category: Option<String>,
}

/// Facet response for the filter bar and tag datalist
#[derive(Debug, Serialize)]
pub struct FacetResponse {
    /// Distinct colors across all items
    pub colors: Vec<String>,
    /// Distinct stored tags, narrowed by category when given
    pub tags: Vec<String>,
    /// Built-in tag suggestions for the selected category
    pub suggested_tags: Vec<String>,
}

/// GET /api/items/facets
pub async fn get_facets(
    State(state): State<AppState>,
    Query(query): Query<FacetQuery>,
) -> ApiResult<Json<FacetResponse>> {
    let category: Option<Category> = match non_empty(query.category.as_deref()) {
        Some(raw) => Some(raw.parse().map_err(ApiError::from)?),
        None => None,
    };

    let colors = items::distinct_colors(&state.db).await?;
    let tags = items::distinct_tags(&state.db, category).await?;
    let suggested_tags = category
        .map(|c| c.tag_suggestions().iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    Ok(Json(FacetResponse {
        colors,
        tags,
        suggested_tags,
    }))
}

/// Summary of a library wipe
#[derive(Debug, Serialize)]
pub struct ClearLibraryResponse {
    pub items_removed: u64,
    pub outfits_removed: u64,
}

/// POST /api/library/clear
///
/// The "start over" operation: deletes every item and saved outfit and
/// resets the active composition.
pub async fn clear_library(
    State(state): State<AppState>,
) -> ApiResult<Json<ClearLibraryResponse>> {
    let items_removed = items::delete_all_items(&state.db).await?;
    let outfits_removed = outfits::delete_all_outfits(&state.db).await?;
    {
        let mut composition = state.composition.write().await;
        composition.clear_all();
    }

    state.events.emit_lossy(VestryEvent::LibraryCleared {
        timestamp: Utc::now(),
    });

    Ok(Json(ClearLibraryResponse {
        items_removed,
        outfits_removed,
    }))
}

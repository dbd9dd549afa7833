//! Image derivative serving
//!
//! Stored derivatives for a guid are immutable: metadata edits never touch
//! the bytes and a replacement photo mints a new item. Clients may cache
//! aggressively; the UI varies the URL when a backfilled thumbnail lands.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use vestry_common::db::items;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Build image serving routes
pub fn image_routes() -> Router<AppState> {
    Router::new().route("/api/items/:guid/image", get(get_item_image))
}

/// Image kind selector
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "thumb".to_string()
}

/// GET /api/items/:guid/image?kind=thumb|full
///
/// `kind=thumb` serves the thumbnail, falling back to the full derivative
/// for records the backfill sweep has not reached yet.
pub async fn get_item_image(
    State(state): State<AppState>,
    Path(guid): Path<Uuid>,
    Query(query): Query<ImageQuery>,
) -> ApiResult<Response> {
    let bytes = match query.kind.as_str() {
        "thumb" => items::load_display_image(&state.db, guid).await?,
        "full" => items::load_full_image(&state.db, guid).await?,
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown image kind: {}",
                other
            )))
        }
    };
    let bytes = bytes.ok_or_else(|| ApiError::NotFound(format!("item {}", guid)))?;

    Ok((
        StatusCode::OK,
        [
            ("content-type", "image/jpeg"),
            ("cache-control", "private, max-age=31536000, immutable"),
        ],
        bytes,
    )
        .into_response())
}

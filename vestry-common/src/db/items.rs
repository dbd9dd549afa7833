//! Item database operations
//!
//! One row per cataloged clothing item. Metadata queries never touch the
//! image blobs; the blob loaders never decode them.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};
use crate::taxonomy::{seasons_from_json, seasons_to_json, Category, Season};
use crate::Result;

/// One encoded JPEG derivative with its pixel dimensions
#[derive(Debug, Clone)]
pub struct ImageBlob {
    pub bytes: Vec<u8>,
    pub width: i64,
    pub height: i64,
}

/// A fully prepared item ready for insertion
#[derive(Debug, Clone)]
pub struct NewItem {
    pub guid: Uuid,
    pub category: Category,
    pub seasons: Vec<Season>,
    pub color: String,
    pub tag: String,
    pub full: ImageBlob,
    /// None for rows imported from older data; the backfill sweep fills it
    pub thumb: Option<ImageBlob>,
    pub created_at: DateTime<Utc>,
}

impl NewItem {
    /// Create a new item record with a fresh guid
    pub fn new(
        category: Category,
        seasons: Vec<Season>,
        color: String,
        tag: String,
        full: ImageBlob,
        thumb: Option<ImageBlob>,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            category,
            seasons,
            color,
            tag,
            full,
            thumb,
            created_at: Utc::now(),
        }
    }
}

/// Item metadata as stored (no image payloads)
#[derive(Debug, Clone)]
pub struct ItemRecord {
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

/// Catalog filter shared by listing and counting
///
/// - `category`: exact match
/// - `seasons`: set intersection; items with no seasons never match an
///   active season filter
/// - `color`, `tag`: case-insensitive exact match
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category: Option<Category>,
    pub seasons: Vec<Season>,
    pub color: Option<String>,
    pub tag: Option<String>,
}

impl ItemFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.seasons.is_empty()
            && self.color.is_none()
            && self.tag.is_none()
    }
}

/// Build the WHERE clause and bind values for a filter
///
/// Season matching leans on the stored JSON form: season names are a fixed
/// vocabulary, so a quoted LIKE cannot false-positive.
fn filter_sql(filter: &ItemFilter) -> (String, Vec<String>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();

    if let Some(category) = filter.category {
        clauses.push("category = ?".to_string());
        binds.push(category.to_string());
    }
    if !filter.seasons.is_empty() {
        let likes: Vec<&str> = filter.seasons.iter().map(|_| "seasons LIKE ?").collect();
        clauses.push(format!("({})", likes.join(" OR ")));
        for season in &filter.seasons {
            binds.push(format!("%\"{}\"%", season));
        }
    }
    if let Some(color) = &filter.color {
        clauses.push("LOWER(color) = LOWER(?)".to_string());
        binds.push(color.clone());
    }
    if let Some(tag) = &filter.tag {
        clauses.push("LOWER(tag) = LOWER(?)".to_string());
        binds.push(tag.clone());
    }

    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

const ITEM_COLUMNS: &str = "guid, category, seasons, color, tag, full_width, full_height, \
     image_thumb IS NOT NULL AS has_thumbnail, thumb_width, thumb_height, created_at, updated_at";

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<ItemRecord> {
    let guid_str: String = row.get("guid");
    let category_str: String = row.get("category");
    let seasons_json: String = row.get("seasons");
    let created_str: String = row.get("created_at");
    let updated_str: String = row.get("updated_at");

    Ok(ItemRecord {
        guid: parse_guid(&guid_str)?,
        category: category_str.parse()?,
        seasons: seasons_from_json(&seasons_json),
        color: row.get("color"),
        tag: row.get("tag"),
        full_width: row.get("full_width"),
        full_height: row.get("full_height"),
        has_thumbnail: row.get("has_thumbnail"),
        thumb_width: row.get("thumb_width"),
        thumb_height: row.get("thumb_height"),
        created_at: parse_timestamp(&created_str)?,
        updated_at: parse_timestamp(&updated_str)?,
    })
}

/// Insert a new item
pub async fn insert_item(pool: &SqlitePool, item: &NewItem) -> Result<()> {
    let timestamp = item.created_at.to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO items (guid, category, seasons, color, tag,
                           image_full, full_width, full_height,
                           image_thumb, thumb_width, thumb_height,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item.guid.to_string())
    .bind(item.category.to_string())
    .bind(seasons_to_json(&item.seasons))
    .bind(&item.color)
    .bind(&item.tag)
    .bind(item.full.bytes.as_slice())
    .bind(item.full.width)
    .bind(item.full.height)
    .bind(item.thumb.as_ref().map(|t| t.bytes.as_slice()))
    .bind(item.thumb.as_ref().map(|t| t.width))
    .bind(item.thumb.as_ref().map(|t| t.height))
    .bind(&timestamp)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one item's metadata
pub async fn load_item(pool: &SqlitePool, guid: Uuid) -> Result<Option<ItemRecord>> {
    let sql = format!("SELECT {} FROM items WHERE guid = ?", ITEM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_item(&row)?)),
        None => Ok(None),
    }
}

/// Update an item's metadata. Returns false when the item does not exist.
pub async fn update_item_metadata(
    pool: &SqlitePool,
    guid: Uuid,
    category: Category,
    seasons: &[Season],
    color: &str,
    tag: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE items SET category = ?, seasons = ?, color = ?, tag = ?, updated_at = ?
         WHERE guid = ?",
    )
    .bind(category.to_string())
    .bind(seasons_to_json(seasons))
    .bind(color)
    .bind(tag)
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Store a regenerated thumbnail. Returns false when the item does not exist.
pub async fn update_item_thumbnail(
    pool: &SqlitePool,
    guid: Uuid,
    thumb: &ImageBlob,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE items SET image_thumb = ?, thumb_width = ?, thumb_height = ?, updated_at = ?
         WHERE guid = ?",
    )
    .bind(thumb.bytes.as_slice())
    .bind(thumb.width)
    .bind(thumb.height)
    .bind(Utc::now().to_rfc3339())
    .bind(guid.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete one item. Returns false when it was already gone.
pub async fn delete_item(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM items WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every item. Returns the number of rows removed.
pub async fn delete_all_items(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM items").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Count items matching a filter
pub async fn count_items(pool: &SqlitePool, filter: &ItemFilter) -> Result<i64> {
    let (where_sql, binds) = filter_sql(filter);
    let sql = format!("SELECT COUNT(*) FROM items{}", where_sql);

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    Ok(query.fetch_one(pool).await?)
}

/// List one page of items matching a filter, newest first
pub async fn list_items(
    pool: &SqlitePool,
    filter: &ItemFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<ItemRecord>> {
    let (where_sql, binds) = filter_sql(filter);
    let sql = format!(
        "SELECT {} FROM items{} ORDER BY created_at DESC, guid DESC LIMIT ? OFFSET ?",
        ITEM_COLUMNS, where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(row_to_item).collect()
}

/// Distinct non-empty colors across the whole catalog, sorted
pub async fn distinct_colors(pool: &SqlitePool) -> Result<Vec<String>> {
    let colors = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT color FROM items WHERE color <> '' ORDER BY color ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(colors)
}

/// Distinct non-empty tags, optionally narrowed to one category, sorted
pub async fn distinct_tags(pool: &SqlitePool, category: Option<Category>) -> Result<Vec<String>> {
    let tags = match category {
        Some(category) => {
            sqlx::query_scalar::<_, String>(
                "SELECT DISTINCT tag FROM items WHERE tag <> '' AND category = ? ORDER BY tag ASC",
            )
            .bind(category.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_scalar::<_, String>(
                "SELECT DISTINCT tag FROM items WHERE tag <> '' ORDER BY tag ASC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(tags)
}

/// Guids of items stored without a thumbnail, oldest first
pub async fn items_missing_thumbnails(pool: &SqlitePool, limit: i64) -> Result<Vec<Uuid>> {
    let guids: Vec<String> = sqlx::query_scalar(
        "SELECT guid FROM items WHERE image_thumb IS NULL
         ORDER BY created_at ASC, guid ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    guids.iter().map(|s| parse_guid(s)).collect()
}

/// Load the full-size JPEG for one item
pub async fn load_full_image(pool: &SqlitePool, guid: Uuid) -> Result<Option<Vec<u8>>> {
    let bytes = sqlx::query_scalar::<_, Vec<u8>>("SELECT image_full FROM items WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;
    Ok(bytes)
}

/// Load the thumbnail JPEG, falling back to the full derivative for rows
/// the backfill sweep has not reached yet
pub async fn load_display_image(pool: &SqlitePool, guid: Uuid) -> Result<Option<Vec<u8>>> {
    let bytes = sqlx::query_scalar::<_, Vec<u8>>(
        "SELECT COALESCE(image_thumb, image_full) FROM items WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(bytes)
}

/// Which of the given guids still exist in the catalog
pub async fn existing_guids(pool: &SqlitePool, guids: &[Uuid]) -> Result<HashSet<Uuid>> {
    if guids.is_empty() {
        return Ok(HashSet::new());
    }

    let placeholders = vec!["?"; guids.len()].join(", ");
    let sql = format!("SELECT guid FROM items WHERE guid IN ({})", placeholders);

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for guid in guids {
        query = query.bind(guid.to_string());
    }
    let found = query.fetch_all(pool).await?;

    found.iter().map(|s| parse_guid(s)).collect()
}

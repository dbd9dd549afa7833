//! Outfit database operations
//!
//! Saved outfits persist the composer's slot map as JSON. The scrub sweeps
//! keep those maps honest when items are deleted or recategorized; they run
//! row by row, one UPDATE per changed outfit.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_guid, parse_timestamp};
use crate::outfit::OutfitSlots;
use crate::taxonomy::Category;
use crate::Result;

/// A persisted outfit
#[derive(Debug, Clone)]
pub struct SavedOutfit {
    pub guid: Uuid,
    pub name: String,
    pub slots: OutfitSlots,
    pub created_at: DateTime<Utc>,
}

impl SavedOutfit {
    /// Create a new outfit record with a fresh guid
    pub fn new(name: String, slots: OutfitSlots) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name,
            slots,
            created_at: Utc::now(),
        }
    }
}

fn row_to_outfit(row: &sqlx::sqlite::SqliteRow) -> Result<SavedOutfit> {
    let guid_str: String = row.get("guid");
    let slots_json: String = row.get("slots");
    let created_str: String = row.get("created_at");

    Ok(SavedOutfit {
        guid: parse_guid(&guid_str)?,
        name: row.get("name"),
        slots: OutfitSlots::from_storage_json(&slots_json),
        created_at: parse_timestamp(&created_str)?,
    })
}

/// Insert a new outfit
pub async fn insert_outfit(pool: &SqlitePool, outfit: &SavedOutfit) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO outfits (guid, name, slots, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(outfit.guid.to_string())
    .bind(&outfit.name)
    .bind(outfit.slots.to_storage_json())
    .bind(outfit.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one outfit
pub async fn load_outfit(pool: &SqlitePool, guid: Uuid) -> Result<Option<SavedOutfit>> {
    let row = sqlx::query("SELECT guid, name, slots, created_at FROM outfits WHERE guid = ?")
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_outfit(&row)?)),
        None => Ok(None),
    }
}

/// List all outfits, newest first
pub async fn list_outfits(pool: &SqlitePool) -> Result<Vec<SavedOutfit>> {
    let rows = sqlx::query(
        "SELECT guid, name, slots, created_at FROM outfits
         ORDER BY created_at DESC, guid DESC",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_outfit).collect()
}

/// Delete one outfit. Returns false when it was already gone.
pub async fn delete_outfit(pool: &SqlitePool, guid: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM outfits WHERE guid = ?")
        .bind(guid.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every outfit. Returns the number of rows removed.
pub async fn delete_all_outfits(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM outfits").execute(pool).await?;
    Ok(result.rows_affected())
}

async fn save_slots(pool: &SqlitePool, guid: Uuid, slots: &OutfitSlots) -> Result<()> {
    sqlx::query("UPDATE outfits SET slots = ? WHERE guid = ?")
        .bind(slots.to_storage_json())
        .bind(guid.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove a deleted item from every saved outfit
///
/// Returns the number of outfits that referenced it.
pub async fn strip_item_refs(pool: &SqlitePool, item_guid: Uuid) -> Result<usize> {
    let mut changed = 0;
    for outfit in list_outfits(pool).await? {
        let mut slots = outfit.slots;
        if slots.remove_item_everywhere(item_guid) {
            save_slots(pool, outfit.guid, &slots).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

/// After an item's category changes, drop its stale placements from every
/// saved outfit (any slot other than the new category)
///
/// Returns the number of outfits that were corrected.
pub async fn purge_category_mismatches(
    pool: &SqlitePool,
    item_guid: Uuid,
    category: Category,
) -> Result<usize> {
    let mut changed = 0;
    for outfit in list_outfits(pool).await? {
        let mut slots = outfit.slots;
        if slots.purge_category_mismatches(item_guid, category) {
            save_slots(pool, outfit.guid, &slots).await?;
            changed += 1;
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_outfits_table;

    /// Setup in-memory test database with outfits table
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_outfits_table(&pool).await.unwrap();
        pool
    }

    fn outfit_with(top: Uuid, shoes: Uuid) -> SavedOutfit {
        let mut slots = OutfitSlots::new();
        slots.assign(Category::Top, top);
        slots.assign(Category::Shoes, shoes);
        SavedOutfit::new("Weekend".to_string(), slots)
    }

    #[tokio::test]
    async fn test_insert_and_load_round_trip() {
        let pool = setup_test_db().await;
        let top = Uuid::new_v4();
        let shoes = Uuid::new_v4();
        let outfit = outfit_with(top, shoes);
        insert_outfit(&pool, &outfit).await.unwrap();

        let loaded = load_outfit(&pool, outfit.guid).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Weekend");
        assert_eq!(loaded.slots.items_in(Category::Top), &[top]);
        assert_eq!(loaded.slots.items_in(Category::Shoes), &[shoes]);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let pool = setup_test_db().await;

        let older = outfit_with(Uuid::new_v4(), Uuid::new_v4());
        let newer = outfit_with(Uuid::new_v4(), Uuid::new_v4());
        insert_outfit(&pool, &older).await.unwrap();
        insert_outfit(&pool, &newer).await.unwrap();

        sqlx::query("UPDATE outfits SET created_at = '2024-01-01T00:00:00+00:00' WHERE guid = ?")
            .bind(older.guid.to_string())
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("UPDATE outfits SET created_at = '2024-06-01T00:00:00+00:00' WHERE guid = ?")
            .bind(newer.guid.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let listed = list_outfits(&pool).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].guid, newer.guid);
        assert_eq!(listed[1].guid, older.guid);
    }

    #[tokio::test]
    async fn test_delete_outfit() {
        let pool = setup_test_db().await;
        let outfit = outfit_with(Uuid::new_v4(), Uuid::new_v4());
        insert_outfit(&pool, &outfit).await.unwrap();

        assert!(delete_outfit(&pool, outfit.guid).await.unwrap());
        assert!(!delete_outfit(&pool, outfit.guid).await.unwrap());
    }

    #[tokio::test]
    async fn test_strip_item_refs() {
        let pool = setup_test_db().await;
        let shared_top = Uuid::new_v4();

        let touched = outfit_with(shared_top, Uuid::new_v4());
        let untouched = outfit_with(Uuid::new_v4(), Uuid::new_v4());
        insert_outfit(&pool, &touched).await.unwrap();
        insert_outfit(&pool, &untouched).await.unwrap();

        let changed = strip_item_refs(&pool, shared_top).await.unwrap();
        assert_eq!(changed, 1);

        let reloaded = load_outfit(&pool, touched.guid).await.unwrap().unwrap();
        assert!(reloaded.slots.items_in(Category::Top).is_empty());

        let intact = load_outfit(&pool, untouched.guid).await.unwrap().unwrap();
        assert_eq!(intact.slots.items_in(Category::Top).len(), 1);
    }

    #[tokio::test]
    async fn test_purge_category_mismatches() {
        let pool = setup_test_db().await;
        let item = Uuid::new_v4();

        let mut slots = OutfitSlots::new();
        slots.assign(Category::Top, item);
        let outfit = SavedOutfit::new("Layered".to_string(), slots);
        insert_outfit(&pool, &outfit).await.unwrap();

        // Item recategorized top -> pants: the top placement is stale
        let changed = purge_category_mismatches(&pool, item, Category::Pants).await.unwrap();
        assert_eq!(changed, 1);

        let reloaded = load_outfit(&pool, outfit.guid).await.unwrap().unwrap();
        assert!(reloaded.slots.items_in(Category::Top).is_empty());
    }
}

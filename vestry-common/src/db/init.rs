//! Database initialization
//!
//! Creates the database file on first run, applies the schema idempotently,
//! and seeds default settings.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist.
    // The thumbnail backfill sweep writes while the catalog reads, so the
    // pool holds more than one connection.
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    // Set busy timeout so backfill writes wait out catalog reads
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Schema creation (idempotent - safe to call multiple times)
    create_schema_version_table(&pool).await?;
    create_items_table(&pool).await?;
    create_outfits_table(&pool).await?;
    create_settings_table(&pool).await?;

    // Initialize default settings
    init_default_settings(&pool).await?;

    Ok(pool)
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (1)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the items table
///
/// Stores one row per cataloged clothing item: metadata plus both JPEG
/// derivatives. `image_thumb` is nullable: rows imported from older data
/// may lack one until the backfill sweep regenerates it.
pub async fn create_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            guid TEXT PRIMARY KEY,
            category TEXT NOT NULL CHECK (category IN ('hat', 'scarf', 'top', 'pants', 'shoes')),
            seasons TEXT NOT NULL DEFAULT '[]',
            color TEXT NOT NULL DEFAULT '',
            tag TEXT NOT NULL DEFAULT '',
            image_full BLOB NOT NULL,
            full_width INTEGER NOT NULL,
            full_height INTEGER NOT NULL,
            image_thumb BLOB,
            thumb_width INTEGER,
            thumb_height INTEGER,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (full_width > 0),
            CHECK (full_height > 0),
            CHECK (thumb_width IS NULL OR thumb_width > 0),
            CHECK (thumb_height IS NULL OR thumb_height > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_created_at ON items(created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_tag ON items(tag)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the outfits table
///
/// `slots` holds the JSON slot map (category to item guids); see
/// [`crate::outfit::OutfitSlots`] for the normalization rules.
pub async fn create_outfits_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS outfits (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slots TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_outfits_created_at ON outfits(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// This function ensures all required settings exist with default values.
/// It also handles NULL values by resetting them to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Upload handling
    ensure_setting(pool, "max_upload_bytes", "33554432").await?; // 32 MiB

    // Thumbnail backfill sweep
    ensure_setting(pool, "backfill_batch_size", "4").await?;

    // SSE keep-alive interval
    ensure_setting(pool, "sse_heartbeat_secs", "15").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    // Check if setting exists
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // Use INSERT OR IGNORE to handle concurrent initialization race conditions
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!(
            "Initialized setting '{}' with default value: {}",
            key, default_value
        );
        return Ok(());
    }

    // Check if value is NULL
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!(
            "Setting '{}' was NULL, reset to default: {}",
            key, default_value
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let pool = setup_pool().await;
        create_schema_version_table(&pool).await.unwrap();
        create_items_table(&pool).await.unwrap();
        create_outfits_table(&pool).await.unwrap();
        create_settings_table(&pool).await.unwrap();

        // Second pass must not fail
        create_items_table(&pool).await.unwrap();
        create_outfits_table(&pool).await.unwrap();
        create_settings_table(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_setting_creates_and_preserves() {
        let pool = setup_pool().await;
        create_settings_table(&pool).await.unwrap();

        ensure_setting(&pool, "backfill_batch_size", "4").await.unwrap();

        // User-modified value survives re-initialization
        sqlx::query("UPDATE settings SET value = '8' WHERE key = 'backfill_batch_size'")
            .execute(&pool)
            .await
            .unwrap();
        ensure_setting(&pool, "backfill_batch_size", "4").await.unwrap();

        let value: String =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = 'backfill_batch_size'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(value, "8");
    }

    #[tokio::test]
    async fn test_ensure_setting_resets_null() {
        let pool = setup_pool().await;
        create_settings_table(&pool).await.unwrap();

        sqlx::query("INSERT INTO settings (key, value) VALUES ('sse_heartbeat_secs', NULL)")
            .execute(&pool)
            .await
            .unwrap();
        ensure_setting(&pool, "sse_heartbeat_secs", "15").await.unwrap();

        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = 'sse_heartbeat_secs'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(value.as_deref(), Some("15"));
    }

    #[tokio::test]
    async fn test_items_category_check_constraint() {
        let pool = setup_pool().await;
        create_items_table(&pool).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO items (guid, category, image_full, full_width, full_height)
             VALUES ('not-checked-here', 'sock', x'00', 1, 1)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}

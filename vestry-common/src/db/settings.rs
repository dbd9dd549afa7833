//! Settings database operations
//!
//! Provides get/set accessors for the settings table following the
//! key-value pattern. Each typed getter carries its built-in default so a
//! missing row never stalls startup.

use sqlx::SqlitePool;

use crate::{Error, Result};

/// Maximum accepted upload size in bytes
///
/// **Default:** 33554432 (32 MiB)
pub async fn get_max_upload_bytes(pool: &SqlitePool) -> Result<usize> {
    get_setting(pool, "max_upload_bytes")
        .await
        .map(|opt| opt.unwrap_or(33554432))
}

/// Items per batch for the thumbnail backfill sweep
///
/// **Default:** 4
pub async fn get_backfill_batch_size(pool: &SqlitePool) -> Result<i64> {
    get_setting(pool, "backfill_batch_size")
        .await
        .map(|opt| opt.unwrap_or(4))
}

/// Seconds between SSE keep-alive comments
///
/// **Default:** 15
pub async fn get_sse_heartbeat_secs(pool: &SqlitePool) -> Result<u64> {
    get_setting(pool, "sse_heartbeat_secs")
        .await
        .map(|opt| opt.unwrap_or(15))
}

/// Generic setting getter
pub async fn get_setting<T>(pool: &SqlitePool, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((Some(value),)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        // NULL value rows behave like missing rows
        _ => Ok(None),
    }
}

/// Generic setting setter
pub async fn set_setting<T>(pool: &SqlitePool, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_settings_table;

    /// Setup in-memory test database with settings table
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let pool = setup_test_db().await;

        assert_eq!(get_max_upload_bytes(&pool).await.unwrap(), 33554432);
        assert_eq!(get_backfill_batch_size(&pool).await.unwrap(), 4);
        assert_eq!(get_sse_heartbeat_secs(&pool).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let pool = setup_test_db().await;

        set_setting(&pool, "backfill_batch_size", 8).await.unwrap();
        assert_eq!(get_backfill_batch_size(&pool).await.unwrap(), 8);

        // Overwrite
        set_setting(&pool, "backfill_batch_size", 2).await.unwrap();
        assert_eq!(get_backfill_batch_size(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_null_value_reads_as_missing() {
        let pool = setup_test_db().await;

        sqlx::query("INSERT INTO settings (key, value) VALUES ('sse_heartbeat_secs', NULL)")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(get_sse_heartbeat_secs(&pool).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_unparseable_value_is_config_error() {
        let pool = setup_test_db().await;

        set_setting(&pool, "max_upload_bytes", "not-a-number").await.unwrap();
        let result = get_max_upload_bytes(&pool).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

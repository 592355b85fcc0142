//! Keyed blob storage for session credentials.
//!
//! Values are opaque JSON text (with tagged-base64 binary leaves, encoded
//! upstream); the store never inspects or re-encodes them. Each operation
//! is atomic per record; there is no cross-record transaction.

use sqlx::SqlitePool;

use crate::error::Result;

/// Upsert a record.
pub async fn put(pool: &SqlitePool, record_id: &str, payload: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO auth_records (record_id, payload)
        VALUES (?, ?)
        ON CONFLICT(record_id) DO UPDATE SET payload = excluded.payload
        "#,
    )
    .bind(record_id)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a record. A missing record is None, not an error.
pub async fn get(pool: &SqlitePool, record_id: &str) -> Result<Option<String>> {
    let payload = sqlx::query_scalar::<_, String>(
        r#"
        SELECT payload FROM auth_records
        WHERE record_id = ?
        "#,
    )
    .bind(record_id)
    .fetch_optional(pool)
    .await?;

    Ok(payload)
}

/// Delete a record. Deleting an absent record is a no-op.
pub async fn delete(pool: &SqlitePool, record_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM auth_records
        WHERE record_id = ?
        "#,
    )
    .bind(record_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete every record. Used by the corruption reset.
pub async fn delete_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM auth_records
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Count stored records.
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM auth_records
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

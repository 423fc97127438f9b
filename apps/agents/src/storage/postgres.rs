use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::{RecordStore, StorageError, TableRef};
use crate::extraction::JsonObject;

/// [`RecordStore`] over a single JSONB `records` table (see `db::ensure_schema`).
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn put_item(&self, table: &TableRef, item: Value) -> Result<(), StorageError> {
        let key = table.key_of(&item)?.to_string();
        sqlx::query(
            r#"
            INSERT INTO records (table_name, id, item)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_name, id)
            DO UPDATE SET item = EXCLUDED.item, updated_at = now()
            "#,
        )
        .bind(&table.name)
        .bind(&key)
        .bind(&item)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_item(&self, table: &TableRef, item: Value) -> Result<bool, StorageError> {
        let key = table.key_of(&item)?.to_string();
        let result = sqlx::query(
            r#"
            INSERT INTO records (table_name, id, item)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_name, id) DO NOTHING
            "#,
        )
        .bind(&table.name)
        .bind(&key)
        .bind(&item)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_item(
        &self,
        table: &TableRef,
        key: &str,
        patch: JsonObject,
    ) -> Result<Option<Value>, StorageError> {
        let updated: Option<Value> = sqlx::query_scalar(
            r#"
            UPDATE records
            SET item = item || $3, updated_at = now()
            WHERE table_name = $1 AND id = $2
            RETURNING item
            "#,
        )
        .bind(&table.name)
        .bind(key)
        .bind(Value::Object(patch))
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Value>, StorageError> {
        let item: Option<Value> =
            sqlx::query_scalar("SELECT item FROM records WHERE table_name = $1 AND id = $2")
                .bind(&table.name)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(item)
    }

    async fn scan(&self, table: &TableRef, limit: usize) -> Result<Vec<Value>, StorageError> {
        let items: Vec<Value> = sqlx::query_scalar(
            r#"
            SELECT item FROM records
            WHERE table_name = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(&table.name)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

//! Storage collaborators.
//!
//! Handlers reach object storage and the key-value record store only through
//! [`ObjectStore`] and [`RecordStore`], so every flow can run against the
//! in-memory fakes in tests.

pub mod postgres;
pub mod s3;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::extraction::JsonObject;

pub use postgres::PgRecordStore;
pub use s3::S3ObjectStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage error: {0}")]
    Object(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("record store error: {0}")]
    Record(#[from] sqlx::Error),

    #[error("item for table '{table}' has no string '{attribute}' attribute")]
    MissingKey {
        table: String,
        attribute: &'static str,
    },

    #[error("document '{key}' could not be read as text: {reason}")]
    Decode { key: String, reason: String },
}

/// A logical table in the record store and the attribute its items are keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub key_attribute: &'static str,
}

impl TableRef {
    pub fn new(name: impl Into<String>, key_attribute: &'static str) -> Self {
        Self {
            name: name.into(),
            key_attribute,
        }
    }

    /// Reads the key attribute of an item bound for this table.
    pub fn key_of<'a>(&self, item: &'a Value) -> Result<&'a str, StorageError> {
        item.get(self.key_attribute)
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| StorageError::MissingKey {
                table: self.name.clone(),
                attribute: self.key_attribute,
            })
    }
}

/// The three logical tables the service writes.
#[derive(Debug, Clone)]
pub struct Tables {
    pub candidates: TableRef,
    pub jobs: TableRef,
    pub reservations: TableRef,
}

impl Tables {
    pub fn new(candidates: &str, jobs: &str, reservations: &str) -> Self {
        Self {
            candidates: TableRef::new(candidates, "id"),
            jobs: TableRef::new(jobs, "id"),
            reservations: TableRef::new(reservations, "reservation_id"),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Keys under `prefix`, in the store's listing order.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Writes the whole item, replacing any item with the same key.
    async fn put_item(&self, table: &TableRef, item: Value) -> Result<(), StorageError>;

    /// Writes the item only when its key is free. `false` means an item with
    /// that key already exists and was left untouched.
    async fn insert_item(&self, table: &TableRef, item: Value) -> Result<bool, StorageError>;

    /// Shallow-merges `patch` into an existing item and returns the result.
    /// `None` when no item has that key; nothing is written then.
    async fn update_item(
        &self,
        table: &TableRef,
        key: &str,
        patch: JsonObject,
    ) -> Result<Option<Value>, StorageError>;

    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Value>, StorageError>;

    /// Up to `limit` items, newest first.
    async fn scan(&self, table: &TableRef, limit: usize) -> Result<Vec<Value>, StorageError>;
}

/// Reads a stored document as text. `.pdf` keys go through text extraction;
/// everything else must be UTF-8.
pub async fn read_text(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<String, StorageError> {
    let bytes = store.get_object(bucket, key).await?;
    decode_document(key, bytes)
}

fn decode_document(key: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
    if key.to_lowercase().ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(&bytes).map_err(|e| StorageError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })
    } else {
        String::from_utf8(bytes).map_err(|e| StorageError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

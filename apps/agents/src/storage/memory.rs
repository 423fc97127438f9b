//! In-memory collaborators for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ObjectStore, RecordStore, StorageError, TableRef};
use crate::extraction::JsonObject;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    puts: Mutex<Vec<(String, String, String)>>,
}

impl MemoryObjectStore {
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    /// (bucket, key, content type) of every `put_object` call.
    pub fn puts(&self) -> Vec<(String, String, String)> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound(format!("{bucket}/{key}")))
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), content_type.to_string()));
        self.insert(bucket, key, body);
        Ok(())
    }
}

/// Items per table in insertion order; `scan` returns the newest first.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, Vec<(String, Value)>>>,
    fail_writes: AtomicBool,
}

impl MemoryRecordStore {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn item(&self, table: &TableRef, key: &str) -> Option<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.name)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, item)| item.clone())
    }

    pub fn items(&self, table: &TableRef) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table.name)
            .map(|items| items.iter().map(|(_, item)| item.clone()).collect())
            .unwrap_or_default()
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Object("record store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put_item(&self, table: &TableRef, item: Value) -> Result<(), StorageError> {
        self.check_writable()?;
        let key = table.key_of(&item)?.to_string();
        let mut tables = self.tables.lock().unwrap();
        let items = tables.entry(table.name.clone()).or_default();
        match items.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = item,
            None => items.push((key, item)),
        }
        Ok(())
    }

    async fn insert_item(&self, table: &TableRef, item: Value) -> Result<bool, StorageError> {
        self.check_writable()?;
        let key = table.key_of(&item)?.to_string();
        let mut tables = self.tables.lock().unwrap();
        let items = tables.entry(table.name.clone()).or_default();
        if items.iter().any(|(k, _)| *k == key) {
            return Ok(false);
        }
        items.push((key, item));
        Ok(true)
    }

    async fn update_item(
        &self,
        table: &TableRef,
        key: &str,
        patch: JsonObject,
    ) -> Result<Option<Value>, StorageError> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        let Some((_, Value::Object(existing))) = tables
            .get_mut(&table.name)
            .and_then(|items| items.iter_mut().find(|(k, _)| k == key))
        else {
            return Ok(None);
        };
        existing.extend(patch);
        Ok(Some(Value::Object(existing.clone())))
    }

    async fn get_item(&self, table: &TableRef, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.item(table, key))
    }

    async fn scan(&self, table: &TableRef, limit: usize) -> Result<Vec<Value>, StorageError> {
        Ok(self.items(table).into_iter().rev().take(limit).collect())
    }
}

//! In-memory [`DocumentStore`] for tests and local development.
//!
//! Mirrors the paginated scan protocol of the real store: pages are
//! capped at `page_size` records and truncated pages carry a
//! continuation token (an offset into the filtered result set).

use std::sync::RwLock;

use async_trait::async_trait;
use disaster_map_models::Record;
use serde_json::Value;

use crate::{ContinuationToken, DocumentStore, ScanFilter, ScanPage, StoreError};

/// A single-table in-memory document store.
pub struct MemoryStore {
    key_attr: String,
    page_size: usize,
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    /// Creates an empty store keyed on `key_attr`, returning at most
    /// `page_size` records per scan page.
    #[must_use]
    pub fn new(key_attr: &str, page_size: usize) -> Self {
        Self {
            key_attr: key_attr.to_string(),
            page_size,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Creates a store pre-seeded with records, in scan order.
    #[must_use]
    pub fn with_records(key_attr: &str, page_size: usize, records: Vec<Record>) -> Self {
        Self {
            key_attr: key_attr.to_string(),
            page_size,
            records: RwLock::new(records),
        }
    }

    fn lock(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Record>>, StoreError> {
        self.records.read().map_err(|_| StoreError::Operation {
            message: "memory store lock poisoned".to_string(),
        })
    }

    fn lock_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Record>>, StoreError> {
        self.records.write().map_err(|_| StoreError::Operation {
            message: "memory store lock poisoned".to_string(),
        })
    }

    fn key_matches(&self, record: &Record, key: &str) -> bool {
        record.get(&self.key_attr).and_then(Value::as_str) == Some(key)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let records = self.lock()?;
        Ok(records.iter().find(|r| self.key_matches(r, key)).cloned())
    }

    async fn put_item(&self, record: Record) -> Result<(), StoreError> {
        let key = record
            .get(&self.key_attr)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Operation {
                message: format!("missing key attribute '{}'", self.key_attr),
            })?
            .to_string();

        let mut records = self.lock_mut()?;
        if let Some(existing) = records.iter_mut().find(|r| {
            r.get(&self.key_attr).and_then(Value::as_str) == Some(key.as_str())
        }) {
            *existing = record;
        } else {
            records.push(record);
        }
        Ok(())
    }

    async fn update_item(
        &self,
        key: &str,
        field: &str,
        new_value: Value,
    ) -> Result<Record, StoreError> {
        let mut records = self.lock_mut()?;
        let mut updated = Record::new();
        updated.insert(field.to_string(), new_value.clone());

        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.get(&self.key_attr).and_then(Value::as_str) == Some(key))
        {
            existing.insert(field.to_string(), new_value);
        } else {
            // The real store upserts on update.
            let mut record = Record::new();
            record.insert(self.key_attr.clone(), Value::from(key));
            record.insert(field.to_string(), new_value);
            records.push(record);
        }

        Ok(updated)
    }

    async fn delete_item(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let mut records = self.lock_mut()?;
        let position = records.iter().position(|r| self.key_matches(r, key));
        Ok(position.map(|i| records.remove(i)))
    }

    async fn scan(
        &self,
        filter: Option<&ScanFilter>,
        token: Option<ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let records = self.lock()?;
        let matching: Vec<Record> = records
            .iter()
            .filter(|r| filter.is_none_or(|f| f.matches(r)))
            .cloned()
            .collect();

        let offset = token
            .as_ref()
            .and_then(|t| t.0.get("offset"))
            .and_then(Value::as_u64)
            .map_or(0, |o| usize::try_from(o).unwrap_or(0));

        let end = matching.len().min(offset + self.page_size);
        let page: Vec<Record> = matching.get(offset..end).unwrap_or_default().to_vec();

        let next_token = (end < matching.len()).then(|| {
            let mut marker = Record::new();
            marker.insert("offset".to_string(), Value::from(end as u64));
            ContinuationToken(marker)
        });

        Ok(ScanPage {
            records: page,
            next_token,
        })
    }
}

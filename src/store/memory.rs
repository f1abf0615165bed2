use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{DataStore, Filter, Row, StoreError};

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process `DataStore` used for local runs and tests.
///
/// Mimics the column defaults of the hosted tables: rows get an `id` and a
/// `created_at` on insert when the caller did not provide them.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row verbatim, bypassing default columns
    pub async fn seed(&self, table: &str, row: Row) {
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row);
    }

    /// Snapshot of every row currently in `table`
    pub async fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.read().await;
        tables.get(table).cloned().unwrap_or_default()
    }

    pub async fn blob(&self, bucket: &str, path: &str) -> Option<StoredBlob> {
        let blobs = self.blobs.read().await;
        blobs.get(&blob_key(bucket, path)).cloned()
    }

    pub fn public_url(bucket: &str, path: &str) -> String {
        format!("memory://{}", blob_key(bucket, path))
    }
}

fn blob_key(bucket: &str, path: &str) -> String {
    format!("{}/{}", bucket, path.trim_start_matches('/'))
}

fn row_id(row: &Row) -> Option<String> {
    match row.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, StoreError> {
        if row_id(&row).is_none() {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !row.contains_key("created_at") {
            row.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(id) = row_id(&row) {
            if rows.iter().any(|existing| row_id(existing).as_deref() == Some(id.as_str())) {
                return Err(StoreError::Rejected {
                    status: 409,
                    message: format!("duplicate key value for id {}", id),
                });
            }
        }
        rows.push(row.clone());
        debug!("memory store: inserted row into {}", table);
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Option<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(None);
        };

        let Some(row) = rows.iter_mut().find(|row| row_id(row).as_deref() == Some(id)) else {
            return Ok(None);
        };

        for (column, value) in patch {
            row.insert(column, value);
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| row_id(row).as_deref() != Some(id));
        }
        Ok(())
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            blob_key(bucket, path),
            StoredBlob { bytes, content_type: content_type.to_string() },
        );
        Ok(Self::public_url(bucket, path))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

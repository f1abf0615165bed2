//! Capability surface of the hosted data platform.
//!
//! Handlers and services only ever see [`DataStore`]; whether rows live in a
//! Supabase project or in process memory is decided once at startup.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// A single table row as returned by the platform
pub type Row = Map<String, Value>;

/// Errors surfaced by a `DataStore` backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The platform could not be reached (connect failure or timeout)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The platform answered but refused the operation
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The platform answered with something we could not interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl StoreError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            StoreError::Connection(err.to_string())
        } else if err.is_decode() {
            StoreError::UnexpectedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Rejected { status: status.as_u16(), message: err.to_string() }
        } else {
            StoreError::Connection(err.to_string())
        }
    }
}

/// Conjunction of column equality predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `column = value` predicate
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    /// Evaluate the filter against a row, comparing values stringwise
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, expected)| match row.get(column) {
            Some(Value::String(actual)) => actual == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        })
    }
}

/// Remote table and blob operations used by the API
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Returns `None` when no row carries the given id
    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Option<Row>, StoreError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;

    /// Store `bytes` under `bucket/path` and return its public URL
    async fn upload_blob(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

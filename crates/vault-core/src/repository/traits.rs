//! Repository Layer - Backend Trait
//!
//! The single seam to the hosted data/storage service. Implementations:
//! `SupabaseBackend` (PostgREST over HTTP) and `InMemoryBackend`.
//!
//! Futures are `?Send`: in the browser every call runs on the UI event loop.

use async_trait::async_trait;
use serde_json::Value;

use super::feed::ChangeFeed;
use super::query::{Filter, Query};
use crate::domain::Table;
use crate::error::BackendResult;

/// A blob destined for object storage
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Table-style CRUD, blob upload and change subscriptions
#[async_trait(?Send)]
pub trait Backend {
    /// Select rows matching the query
    async fn select(&self, query: Query) -> BackendResult<Vec<Value>>;

    /// Insert one row, returning it as stored (ids and defaults filled in)
    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value>;

    /// Merge `patch` into every matching row, returning the updated rows
    async fn update(&self, table: Table, filters: Vec<Filter>, patch: Value) -> BackendResult<Vec<Value>>;

    /// Delete every matching row
    async fn delete(&self, table: Table, filters: Vec<Filter>) -> BackendResult<()>;

    /// Store a blob and return its public URL
    async fn upload(&self, upload: Upload) -> BackendResult<String>;

    /// Subscribe to row changes on `table` matching `filter`
    fn changes(&self, table: Table, filter: Filter) -> BackendResult<ChangeFeed>;
}

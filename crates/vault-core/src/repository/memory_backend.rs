//! In-Memory Backend
//!
//! Process-local tables behind the `Backend` trait. Fills in `id` and
//! `created_at` the way the hosted tables default them, evaluates filters
//! and ordering, fans changes out to open feeds, records every call and
//! can be told to fail the next matching call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use super::feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeSender};
use super::query::{Filter, Query};
use super::traits::{Backend, Upload};
use crate::domain::Table;
use crate::error::{BackendError, BackendResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    Subscribe,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Operation,
    pub table: Option<Table>,
    pub payload: Option<Value>,
}

struct Subscriber {
    table: Table,
    filter: Filter,
    tx: ChangeSender,
}

struct InjectedFailure {
    op: Operation,
    table: Option<Table>,
    error: BackendError,
}

#[derive(Default)]
struct State {
    tables: HashMap<Table, Vec<Value>>,
    objects: HashMap<(String, String), Upload>,
    subscribers: Vec<Subscriber>,
    calls: Vec<Call>,
    failures: Vec<InjectedFailure>,
}

pub const MEMORY_STORAGE_BASE: &str = "memory://storage";

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert rows directly, bypassing the call log and defaults
    pub fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        self.state().tables.entry(table).or_default().extend(rows);
    }

    /// Current contents of a table
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Every call issued so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Number of calls of `op` against `table`
    pub fn count(&self, op: Operation, table: Table) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.op == op && c.table == Some(table))
            .count()
    }

    /// Bytes stored by `upload`
    pub fn object(&self, bucket: &str, path: &str) -> Option<Upload> {
        self.state()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Make the next `op` (against `table`, or any table when `None`) fail
    pub fn fail_next(&self, op: Operation, table: Option<Table>, error: BackendError) {
        self.state().failures.push(InjectedFailure { op, table, error });
    }

    /// Number of feeds still open
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|s| !s.tx.is_closed());
        state.subscribers.len()
    }

    fn record(&self, op: Operation, table: Option<Table>, payload: Option<Value>) -> BackendResult<()> {
        tracing::debug!(?op, ?table, "in-memory backend call");
        let mut state = self.state();
        state.calls.push(Call { op, table, payload });
        let failure = state
            .failures
            .iter()
            .position(|f| f.op == op && (f.table.is_none() || f.table == table));
        match failure {
            Some(index) => Err(state.failures.remove(index).error),
            None => Ok(()),
        }
    }

    fn publish(state: &mut State, event: ChangeEvent) {
        state.subscribers.retain(|sub| {
            if sub.table != event.table || !event.concerns(&sub.filter) {
                return !sub.tx.is_closed();
            }
            sub.tx.send(event.clone()).is_ok()
        });
    }
}

fn with_defaults(row: Value) -> BackendResult<Map<String, Value>> {
    let mut object = match row {
        Value::Object(object) => object,
        other => return Err(BackendError::Decode(format!("expected a JSON object, got {}", other))),
    };
    if !matches!(object.get("id"), Some(Value::String(_))) {
        object.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
    }
    if !matches!(object.get("created_at"), Some(Value::String(_))) {
        object.insert("created_at".into(), Value::String(Utc::now().to_rfc3339()));
    }
    Ok(object)
}

#[async_trait(?Send)]
impl Backend for InMemoryBackend {
    async fn select(&self, query: Query) -> BackendResult<Vec<Value>> {
        self.record(Operation::Select, Some(query.table), None)?;
        let state = self.state();
        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> BackendResult<Value> {
        self.record(Operation::Insert, Some(table), Some(row.clone()))?;
        let stored = Value::Object(with_defaults(row)?);
        let mut state = self.state();
        state.tables.entry(table).or_default().push(stored.clone());
        Self::publish(
            &mut state,
            ChangeEvent {
                kind: ChangeKind::Insert,
                table,
                record: Some(stored.clone()),
                old_record: None,
            },
        );
        Ok(stored)
    }

    async fn update(&self, table: Table, filters: Vec<Filter>, patch: Value) -> BackendResult<Vec<Value>> {
        self.record(Operation::Update, Some(table), Some(patch.clone()))?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::Decode("update patch must be a JSON object".into()));
        };
        let mut state = self.state();
        let mut events = Vec::new();
        let mut updated = Vec::new();
        if let Some(rows) = state.tables.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| filters.iter().all(|f| f.matches(r))) {
                let old = row.clone();
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
                events.push(ChangeEvent {
                    kind: ChangeKind::Update,
                    table,
                    record: Some(row.clone()),
                    old_record: Some(old),
                });
            }
        }
        for event in events {
            Self::publish(&mut state, event);
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filters: Vec<Filter>) -> BackendResult<()> {
        self.record(Operation::Delete, Some(table), None)?;
        let mut state = self.state();
        let mut removed = Vec::new();
        if let Some(rows) = state.tables.get_mut(&table) {
            rows.retain(|row| {
                let hit = filters.iter().all(|f| f.matches(row));
                if hit {
                    removed.push(row.clone());
                }
                !hit
            });
        }
        for old in removed {
            Self::publish(
                &mut state,
                ChangeEvent {
                    kind: ChangeKind::Delete,
                    table,
                    record: None,
                    old_record: Some(old),
                },
            );
        }
        Ok(())
    }

    async fn upload(&self, upload: Upload) -> BackendResult<String> {
        self.record(Operation::Upload, None, None)?;
        let key = (upload.bucket.clone(), upload.path.clone());
        let mut state = self.state();
        if state.objects.contains_key(&key) {
            return Err(BackendError::Status {
                code: 409,
                message: format!("{}/{} already exists", upload.bucket, upload.path),
            });
        }
        let url = format!("{}/{}/{}", MEMORY_STORAGE_BASE, upload.bucket, upload.path);
        state.objects.insert(key, upload);
        Ok(url)
    }

    fn changes(&self, table: Table, filter: Filter) -> BackendResult<ChangeFeed> {
        self.record(Operation::Subscribe, Some(table), None)?;
        let (tx, feed) = ChangeFeed::channel();
        self.state().subscribers.push(Subscriber { table, filter, tx });
        Ok(feed)
    }
}

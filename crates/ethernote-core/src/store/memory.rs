//! In-process store used as a test double for the remote store.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Direction, OrderBy, Record, RemoteStore, StoreError, StoreOp, StoreResult};

/// One recorded store invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub collection: String,
    pub id: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<Record>>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, VecDeque<String>>,
}

/// Remote store kept entirely in memory.
///
/// Mirrors the PostgREST behaviour the client relies on: ids are assigned on
/// insert, `created_at` defaults to now, updates of missing rows report
/// `NotFound`, deletes of missing rows succeed. Every call is logged and
/// failures can be queued per operation.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a record in place without logging a call
    pub fn seed(&self, collection: &str, record: Record) {
        self.state()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Snapshot of a collection in insertion order
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.state()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call made so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    /// Number of calls of one kind
    pub fn call_count(&self, op: StoreOp) -> usize {
        self.state().calls.iter().filter(|call| call.op == op).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Make the next `op` call fail with `StoreError::Unavailable(message)`
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.state()
            .failures
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call and pop a queued failure, if any
    fn begin(
        state: &mut MemoryState,
        op: StoreOp,
        collection: &str,
        id: Option<&str>,
    ) -> StoreResult<()> {
        state.calls.push(StoreCall {
            op,
            collection: collection.to_string(),
            id: id.map(ToString::to_string),
        });
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(()),
        }
    }
}

fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, collection: &str, order: &OrderBy) -> StoreResult<Vec<Record>> {
        let mut state = self.state();
        Self::begin(&mut state, StoreOp::List, collection, None)?;

        let mut records = state
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| {
            let ordering = compare_values(a.get(&order.field), b.get(&order.field));
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
        Ok(records)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Record> {
        let mut state = self.state();
        Self::begin(&mut state, StoreOp::Get, collection, Some(id))?;

        state
            .collections
            .get(collection)
            .and_then(|records| {
                records
                    .iter()
                    .find(|record| record_id(record).as_deref() == Some(id))
            })
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, collection: &str, mut fields: Record) -> StoreResult<Record> {
        let mut state = self.state();
        Self::begin(&mut state, StoreOp::Insert, collection, None)?;

        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
        fields
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(fields.clone());
        Ok(fields)
    }

    async fn update(&self, collection: &str, id: &str, fields: Record) -> StoreResult<()> {
        let mut state = self.state();
        Self::begin(&mut state, StoreOp::Update, collection, Some(id))?;

        let record = state
            .collections
            .get_mut(collection)
            .and_then(|records| {
                records
                    .iter_mut()
                    .find(|record| record_id(record).as_deref() == Some(id))
            })
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut state = self.state();
        Self::begin(&mut state, StoreOp::Delete, collection, Some(id))?;

        if let Some(records) = state.collections.get_mut(collection) {
            records.retain(|record| record_id(record).as_deref() != Some(id));
        }
        Ok(())
    }
}

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethernote_core::store::{
    MemoryStore, OrderBy, Record, RemoteStore, StoreOp, StoreResult,
};
use ethernote_core::NotesService;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Memory store whose calls can be held until the test releases them.
#[derive(Default)]
pub struct GatedStore {
    pub inner: MemoryStore,
    gates: Mutex<HashMap<StoreOp, VecDeque<oneshot::Receiver<()>>>>,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next `op` call until the returned sender fires or drops.
    pub fn hold_next(&self, op: StoreOp) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates
            .lock()
            .expect("gates lock")
            .entry(op)
            .or_default()
            .push_back(gate);
        release
    }

    pub fn service(self: &Arc<Self>) -> NotesService {
        NotesService::new(self.clone())
    }

    async fn pass(&self, op: StoreOp) {
        let gate = self
            .gates
            .lock()
            .expect("gates lock")
            .get_mut(&op)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn list(&self, collection: &str, order: &OrderBy) -> StoreResult<Vec<Record>> {
        self.pass(StoreOp::List).await;
        self.inner.list(collection, order).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Record> {
        self.pass(StoreOp::Get).await;
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: &str, fields: Record) -> StoreResult<Record> {
        self.pass(StoreOp::Insert).await;
        self.inner.insert(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Record) -> StoreResult<()> {
        self.pass(StoreOp::Update).await;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.pass(StoreOp::Delete).await;
        self.inner.delete(collection, id).await
    }
}

pub fn note_record(id: &str, title: &str, content: &str, created_at: &str) -> Record {
    match json!({
        "id": id,
        "title": title,
        "content": content,
        "created_at": created_at,
        "updated_at": created_at,
    }) {
        Value::Object(record) => record,
        _ => unreachable!(),
    }
}

/// Store holding the `n1` Groceries note plus an older `n2`.
pub fn seeded_store() -> Arc<GatedStore> {
    let store = GatedStore::new();
    store.inner.seed(
        "notes",
        note_record("n1", "Groceries", "Milk", "2024-05-02T08:00:00Z"),
    );
    store.inner.seed(
        "notes",
        note_record("n2", "Books", "Dune", "2024-05-01T08:00:00Z"),
    );
    store
}

pub fn stored_field(store: &GatedStore, id: &str, field: &str) -> Option<Value> {
    store
        .inner
        .records("notes")
        .into_iter()
        .find(|record| record.get("id") == Some(&json!(id)))
        .and_then(|record| record.get(field).cloned())
}

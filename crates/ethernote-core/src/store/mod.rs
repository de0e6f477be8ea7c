//! Remote store client: CRUD over named collections of JSON records.

mod memory;
mod supabase;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::{MemoryStore, StoreCall};
pub use supabase::SupabaseStore;

/// One row of a collection.
pub type Record = Map<String, Value>;

/// Sort direction for [`RemoteStore::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// PostgREST spelling
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Ordering clause for [`RemoteStore::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }
}

/// Store operation kinds, used for call logs and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Get,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid record payload: {0}")]
    Decode(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Network-backed CRUD interface.
///
/// Implementations must not retry; callers decide what to do with a failure.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All records of `collection`, sorted by `order`
    async fn list(&self, collection: &str, order: &OrderBy) -> StoreResult<Vec<Record>>;

    /// Single record by id; `NotFound` when no row matches
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Record>;

    /// Insert a record and return it with server-assigned fields filled in
    async fn insert(&self, collection: &str, fields: Record) -> StoreResult<Record>;

    /// Overwrite the given fields of an existing record
    async fn update(&self, collection: &str, id: &str, fields: Record) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

//! Notes table access shared by the list and note controllers.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{StoreConfig, DEFAULT_NOTES_TABLE};
use crate::models::{Note, NoteFields, NoteId, NoteSummary};
use crate::store::{OrderBy, Record, RemoteStore, StoreError, StoreResult, SupabaseStore};

/// Cheap-to-clone handle to the notes collection of a remote store.
#[derive(Clone)]
pub struct NotesService {
    store: Arc<dyn RemoteStore>,
    table: String,
}

impl NotesService {
    /// Wrap an injected store, using the default `notes` table.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            table: DEFAULT_NOTES_TABLE.to_string(),
        }
    }

    /// Connect to the Supabase project described by `config`.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        let store = SupabaseStore::from_config(config)?;
        Ok(Self::new(Arc::new(store)).with_table(config.notes_table.clone()))
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// All notes as list items, newest first.
    pub async fn list_summaries(&self) -> StoreResult<Vec<NoteSummary>> {
        let records = self
            .store
            .list(&self.table, &OrderBy::descending("created_at"))
            .await?;
        records
            .into_iter()
            .map(|record| decode_note(record).map(NoteSummary::from))
            .collect()
    }

    /// Fetch a note by id.
    pub async fn get_note(&self, id: &NoteId) -> StoreResult<Note> {
        let record = self.store.get(&self.table, id.as_str()).await?;
        decode_note(record)
    }

    /// Insert a note and return it with its server-assigned id.
    pub async fn create_note(&self, fields: NoteFields) -> StoreResult<Note> {
        let record = self.store.insert(&self.table, fields.into_record()).await?;
        decode_note(record)
    }

    /// Overwrite the given fields of an existing note.
    pub async fn update_note(&self, id: &NoteId, fields: NoteFields) -> StoreResult<()> {
        self.store
            .update(&self.table, id.as_str(), fields.into_record())
            .await
    }

    /// Delete a note.
    pub async fn delete_note(&self, id: &NoteId) -> StoreResult<()> {
        self.store.delete(&self.table, id.as_str()).await
    }
}

fn decode_note(record: Record) -> StoreResult<Note> {
    serde_json::from_value(Value::Object(record))
        .map_err(|error| StoreError::Decode(error.to_string()))
}

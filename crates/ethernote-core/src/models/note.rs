//! Note model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Title given to a note created from the list before the user names it.
pub const PLACEHOLDER_TITLE: &str = "Untitled Note";

/// Server-assigned note identifier.
///
/// Opaque to the client. The remote table may key notes by `uuid` (JSON
/// string) or `bigint` (JSON number); both decode into the same text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wrap an identifier string as-is
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Note ID cannot be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Integer(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Integer(number) => Self(number.to_string()),
        })
    }
}

/// A persisted note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NoteRow")]
pub struct Note {
    /// Server-assigned identifier
    pub id: NoteId,
    /// Title; never empty once saved through a controller
    pub title: String,
    /// Plain text body
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last save timestamp
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of a `notes` row. Rows written by other clients may leave
/// `title`, `content` or `updated_at` null.
#[derive(Deserialize)]
struct NoteRow {
    id: NoteId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.id,
            title: row.title.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at.unwrap_or(row.created_at),
        }
    }
}

/// List item: the fields the list view shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteSummary {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            created_at: note.created_at,
        }
    }
}

/// Partial field set sent on insert or update. `None` fields are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteFields {
    /// Fields for a freshly created, not yet named note
    #[must_use]
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            title: Some(PLACEHOLDER_TITLE.to_string()),
            content: Some(String::new()),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Fields written by a save: trimmed text plus a fresh `updated_at`
    #[must_use]
    pub fn saved(title: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: Some(title.trim().to_string()),
            content: Some(content.trim().to_string()),
            created_at: None,
            updated_at: Some(now),
        }
    }

    /// JSON object body for the store
    #[must_use]
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = Map::new();
        if let Some(title) = self.title {
            record.insert("title".to_string(), Value::String(title));
        }
        if let Some(content) = self.content {
            record.insert("content".to_string(), Value::String(content));
        }
        if let Some(created_at) = self.created_at {
            record.insert(
                "created_at".to_string(),
                Value::String(created_at.to_rfc3339()),
            );
        }
        if let Some(updated_at) = self.updated_at {
            record.insert(
                "updated_at".to_string(),
                Value::String(updated_at.to_rfc3339()),
            );
        }
        record
    }
}

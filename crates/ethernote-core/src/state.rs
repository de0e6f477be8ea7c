//! Render state shared by every front-end.
//!
//! Controllers publish these snapshots; front-ends only read them.

use std::fmt;

use crate::error::Error;
use crate::models::{Note, NoteId, NoteSummary};
use crate::util::note_count_label;

/// Where a note's edit session currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteMode {
    Loading,
    Viewing,
    Editing,
    Saving,
    Deleting,
    LoadError,
    Closed,
}

impl fmt::Display for NoteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Viewing => "viewing",
            Self::Editing => "editing",
            Self::Saving => "saving",
            Self::Deleting => "deleting",
            Self::LoadError => "showing a load error",
            Self::Closed => "closed",
        })
    }
}

/// Working copy of the editable fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn from_note(note: &Note) -> Self {
        Self::new(note.title.clone(), note.content.clone())
    }
}

/// Read-only view of a [`crate::NoteController`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteSnapshot {
    pub note_id: Option<NoteId>,
    pub mode: NoteMode,
    /// Last values confirmed by the store
    pub note: Option<Note>,
    /// Values shown in the editor; `None` when nothing is loaded
    pub draft: Option<NoteDraft>,
    pub last_error: Option<Error>,
    /// Never saved by the user yet
    pub is_new: bool,
    pub is_busy: bool,
}

impl NoteSnapshot {
    /// Working copy differs from the persisted copy
    pub fn has_unsaved_changes(&self) -> bool {
        match (&self.note, &self.draft) {
            (Some(note), Some(draft)) => draft.title != note.title || draft.content != note.content,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

/// Which fetch indicator the list should show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListPhase {
    #[default]
    Idle,
    /// Full-screen loading indicator
    Loading,
    /// Pull-to-refresh indicator over the current list
    Refreshing,
}

/// What the list screen should render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Error,
    Empty,
    Populated,
}

/// Read-only view of a [`crate::ListController`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListSnapshot {
    pub phase: ListPhase,
    pub summaries: Vec<NoteSummary>,
    pub last_error: Option<Error>,
    /// At least one fetch has succeeded
    pub has_loaded: bool,
    pub is_creating: bool,
    pub is_busy: bool,
}

impl ListSnapshot {
    pub fn view(&self) -> ListView {
        if !self.summaries.is_empty() {
            ListView::Populated
        } else if self.phase == ListPhase::Loading {
            ListView::Loading
        } else if self.last_error.is_some() {
            ListView::Error
        } else if self.has_loaded {
            ListView::Empty
        } else {
            ListView::Loading
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == ListPhase::Refreshing
    }

    pub fn count_label(&self) -> String {
        note_count_label(self.summaries.len())
    }
}

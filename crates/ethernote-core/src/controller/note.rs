//! Edit-session controller for a single note.
//!
//! # Lifecycle
//! - `Loading -> Viewing | LoadError` through [`NoteController::open`].
//! - `Viewing <-> Editing` through `begin_edit` / `cancel_edit`.
//! - `Editing -> Saving -> Viewing`, or back to `Editing` with the error kept.
//! - `Viewing | Editing -> Deleting -> Closed`, or back to the prior mode.
//!
//! # Invariants
//! - At most one store call is in flight. `save` and `delete` are rejected
//!   while anything is pending; `open` replaces a pending `open` and is
//!   rejected while a save or delete is pending.
//! - A result that belongs to a replaced request is dropped.
//! - The working copy is never discarded by a failed store call.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{Operation, Publish, StateCell};
use crate::error::{Error, Result};
use crate::models::{Note, NoteFields, NoteId, PLACEHOLDER_TITLE};
use crate::services::NotesService;
use crate::state::{NoteDraft, NoteMode, NoteSnapshot};

struct Session {
    note_id: Option<NoteId>,
    mode: NoteMode,
    persisted: Option<Note>,
    draft: Option<NoteDraft>,
    last_error: Option<Error>,
    is_new: bool,
    in_flight: Option<Operation>,
    generation: u64,
}

impl Session {
    fn require(&self, operation: Operation, allowed: &[NoteMode]) -> Result<()> {
        if allowed.contains(&self.mode) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation,
                mode: self.mode,
            })
        }
    }

    fn require_idle(&self, operation: Operation) -> Result<()> {
        match self.in_flight {
            Some(_) => Err(Error::Busy(operation)),
            None => Ok(()),
        }
    }

    /// Mark a store call as started and return its generation.
    fn start(&mut self, operation: Operation, mode: NoteMode) -> u64 {
        self.generation += 1;
        self.in_flight = Some(operation);
        self.mode = mode;
        self.last_error = None;
        self.generation
    }

    /// Close out a store call; `Superseded` when a newer one has started.
    fn finish(&mut self, generation: u64) -> Result<()> {
        if generation != self.generation {
            return Err(Error::Superseded);
        }
        self.in_flight = None;
        Ok(())
    }

    /// Undo `start` for a call whose future was dropped before it finished.
    fn abandon(&mut self, generation: u64, mode: NoteMode) {
        if generation == self.generation && self.in_flight.is_some() {
            self.in_flight = None;
            self.mode = mode;
        }
    }

    fn fail(&mut self, mode: NoteMode, error: Error) -> Error {
        self.mode = mode;
        self.last_error = Some(error.clone());
        error
    }

    fn draft_mut(&mut self) -> &mut NoteDraft {
        self.draft.get_or_insert_with(NoteDraft::default)
    }
}

impl Publish for Session {
    type Snapshot = NoteSnapshot;

    fn snapshot(&self) -> NoteSnapshot {
        NoteSnapshot {
            note_id: self.note_id.clone(),
            mode: self.mode,
            note: self.persisted.clone(),
            draft: self.draft.clone(),
            last_error: self.last_error.clone(),
            is_new: self.is_new,
            is_busy: self.in_flight.is_some(),
        }
    }
}

/// What a started save will write.
struct SavePlan {
    generation: u64,
    note_id: Option<NoteId>,
    fields: NoteFields,
    created_at: DateTime<Utc>,
}

/// Owns the working copy of one note while its screen is open.
pub struct NoteController {
    service: NotesService,
    cell: StateCell<Session>,
}

impl NoteController {
    /// Controller for an existing note; call [`Self::open`] next.
    pub fn new(service: NotesService) -> Self {
        Self::with_session(
            service,
            Session {
                note_id: None,
                mode: NoteMode::Loading,
                persisted: None,
                draft: None,
                last_error: None,
                is_new: false,
                in_flight: None,
                generation: 0,
            },
        )
    }

    /// Controller for a placeholder record that was just inserted.
    ///
    /// Starts in `Editing`; saving updates the inserted record.
    pub fn for_created(service: NotesService, note: Note) -> Self {
        Self::with_session(
            service,
            Session {
                note_id: Some(note.id.clone()),
                mode: NoteMode::Editing,
                draft: Some(NoteDraft::new(note.title.clone(), String::new())),
                persisted: Some(note),
                last_error: None,
                is_new: true,
                in_flight: None,
                generation: 0,
            },
        )
    }

    /// Controller for a note that does not exist remotely yet.
    ///
    /// Starts in `Editing`; the first save inserts the record.
    pub fn draft(service: NotesService) -> Self {
        Self::with_session(
            service,
            Session {
                note_id: None,
                mode: NoteMode::Editing,
                persisted: None,
                draft: Some(NoteDraft::new(PLACEHOLDER_TITLE, String::new())),
                last_error: None,
                is_new: true,
                in_flight: None,
                generation: 0,
            },
        )
    }

    fn with_session(service: NotesService, session: Session) -> Self {
        Self {
            service,
            cell: StateCell::new(session),
        }
    }

    pub fn snapshot(&self) -> NoteSnapshot {
        self.cell.snapshot()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<NoteSnapshot> {
        self.cell.subscribe()
    }

    pub fn mode(&self) -> NoteMode {
        self.cell.snapshot().mode
    }

    /// Fetch `id` and show it.
    ///
    /// A later `open` on the same controller wins; this call then returns
    /// [`Error::Superseded`] and leaves state alone.
    pub async fn open(&self, id: NoteId) -> Result<()> {
        let generation = self.cell.update(|session| {
            if matches!(session.in_flight, Some(Operation::Save | Operation::Delete)) {
                return Err(Error::Busy(Operation::Open));
            }
            session.note_id = Some(id.clone());
            session.persisted = None;
            session.draft = None;
            session.is_new = false;
            Ok(session.start(Operation::Open, NoteMode::Loading))
        })?;
        let _in_flight = self
            .cell
            .on_drop(move |session| session.abandon(generation, NoteMode::Loading));
        tracing::debug!("Opening note {}", id);

        let result = self.service.get_note(&id).await;

        let outcome = self.cell.update(|session| {
            session.finish(generation)?;
            match result {
                Ok(note) => {
                    session.draft = Some(NoteDraft::from_note(&note));
                    session.persisted = Some(note);
                    session.mode = NoteMode::Viewing;
                    Ok(())
                }
                Err(error) => Err(session.fail(NoteMode::LoadError, error.into())),
            }
        });
        match &outcome {
            Err(Error::Superseded) => tracing::debug!("Dropped stale result for note {}", id),
            Err(error) => tracing::warn!("Failed to load note {}: {}", id, error),
            Ok(()) => {}
        }
        outcome
    }

    /// Start editing the loaded note.
    pub fn begin_edit(&self) -> Result<()> {
        self.cell.update(|session| {
            session.require(Operation::BeginEdit, &[NoteMode::Viewing])?;
            session.draft = session.persisted.as_ref().map(NoteDraft::from_note);
            session.mode = NoteMode::Editing;
            Ok(())
        })
    }

    pub fn update_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        self.cell.update(|session| {
            session.require(Operation::UpdateTitle, &[NoteMode::Editing])?;
            session.draft_mut().title = title;
            Ok(())
        })
    }

    pub fn update_content(&self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.cell.update(|session| {
            session.require(Operation::UpdateContent, &[NoteMode::Editing])?;
            session.draft_mut().content = content;
            Ok(())
        })
    }

    /// Drop unsaved edits. A note that was never saved closes instead.
    pub fn cancel_edit(&self) -> Result<()> {
        self.cell.update(|session| {
            session.require(Operation::CancelEdit, &[NoteMode::Editing])?;
            session.last_error = None;
            if session.is_new {
                session.mode = NoteMode::Closed;
            } else {
                session.draft = session.persisted.as_ref().map(NoteDraft::from_note);
                session.mode = NoteMode::Viewing;
            }
            Ok(())
        })
    }

    /// Write the working copy with trimmed title and content.
    ///
    /// An empty title is rejected locally and recorded as the last error.
    /// On failure the controller returns to `Editing` with the edits intact.
    pub async fn save(&self) -> Result<()> {
        let plan = self.cell.update(|session| {
            session.require_idle(Operation::Save)?;
            session.require(Operation::Save, &[NoteMode::Editing])?;

            let draft = session.draft.clone().unwrap_or_default();
            if draft.title.trim().is_empty() {
                let error = Error::Validation("Title cannot be empty".to_string());
                session.last_error = Some(error.clone());
                return Err(error);
            }

            let now = Utc::now();
            let mut fields = NoteFields::saved(&draft.title, &draft.content, now);
            if session.note_id.is_none() {
                fields.created_at = Some(now);
            }
            Ok(SavePlan {
                generation: session.start(Operation::Save, NoteMode::Saving),
                note_id: session.note_id.clone(),
                created_at: session.persisted.as_ref().map_or(now, |note| note.created_at),
                fields,
            })
        })?;
        let generation = plan.generation;
        let _in_flight = self
            .cell
            .on_drop(move |session| session.abandon(generation, NoteMode::Editing));

        let result = match &plan.note_id {
            Some(id) => {
                let saved = self.service.update_note(id, plan.fields.clone()).await;
                saved.map(|()| Note {
                    id: id.clone(),
                    title: plan.fields.title.clone().unwrap_or_default(),
                    content: plan.fields.content.clone().unwrap_or_default(),
                    created_at: plan.created_at,
                    updated_at: plan.fields.updated_at.unwrap_or_else(Utc::now),
                })
            }
            None => self.service.create_note(plan.fields.clone()).await,
        };

        let outcome = self.cell.update(|session| {
            session.finish(plan.generation)?;
            match result {
                Ok(note) => {
                    session.note_id = Some(note.id.clone());
                    session.draft = Some(NoteDraft::from_note(&note));
                    session.persisted = Some(note);
                    session.is_new = false;
                    session.mode = NoteMode::Viewing;
                    Ok(())
                }
                Err(error) => Err(session.fail(NoteMode::Editing, error.into())),
            }
        });
        match &outcome {
            Ok(()) => tracing::info!("Saved note {}", self.note_label()),
            Err(error) => tracing::warn!("Failed to save note {}: {}", self.note_label(), error),
        }
        outcome
    }

    /// Delete the note. Confirmation is the caller's job.
    ///
    /// A draft that was never inserted just closes.
    pub async fn delete(&self) -> Result<()> {
        let started = self.cell.update(|session| -> Result<Option<(NoteId, NoteMode, u64)>> {
            session.require_idle(Operation::Delete)?;
            session.require(Operation::Delete, &[NoteMode::Viewing, NoteMode::Editing])?;
            let prior = session.mode;
            let Some(id) = session.note_id.clone() else {
                session.mode = NoteMode::Closed;
                return Ok(None);
            };
            let generation = session.start(Operation::Delete, NoteMode::Deleting);
            Ok(Some((id, prior, generation)))
        })?;
        let Some((id, prior, generation)) = started else {
            return Ok(());
        };
        let _in_flight = self
            .cell
            .on_drop(move |session| session.abandon(generation, prior));

        let result = self.service.delete_note(&id).await;

        let outcome = self.cell.update(|session| {
            session.finish(generation)?;
            match result {
                Ok(()) => {
                    session.mode = NoteMode::Closed;
                    Ok(())
                }
                Err(error) => Err(session.fail(prior, error.into())),
            }
        });
        match &outcome {
            Ok(()) => tracing::info!("Deleted note {}", id),
            Err(error) => tracing::warn!("Failed to delete note {}: {}", id, error),
        }
        outcome
    }

    /// Clear the last error once it has been shown.
    pub fn dismiss_error(&self) {
        self.cell.update(|session| session.last_error = None);
    }

    fn note_label(&self) -> String {
        self.cell
            .snapshot()
            .note_id
            .map_or_else(|| "(draft)".to_string(), |id| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn store_with_groceries() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let Value::Object(record) = json!({
            "id": "n1",
            "title": "Groceries",
            "content": "Milk",
            "created_at": "2024-05-01T08:00:00Z",
            "updated_at": "2024-05-01T08:00:00Z",
        }) else {
            unreachable!()
        };
        store.seed("notes", record);
        store
    }

    async fn opened(store: &Arc<MemoryStore>) -> NoteController {
        let controller = NoteController::new(NotesService::new(store.clone()));
        controller.open(NoteId::new("n1")).await.unwrap();
        controller
    }

    #[tokio::test]
    async fn new_controller_starts_loading() {
        let controller = NoteController::new(NotesService::new(Arc::new(MemoryStore::new())));
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.mode, NoteMode::Loading);
        assert!(snapshot.draft.is_none());
    }

    #[tokio::test]
    async fn begin_edit_is_rejected_outside_viewing() {
        let store = store_with_groceries();
        let controller = opened(&store).await;
        controller.begin_edit().unwrap();

        assert_eq!(
            controller.begin_edit(),
            Err(Error::InvalidState {
                operation: Operation::BeginEdit,
                mode: NoteMode::Editing,
            })
        );
    }

    #[tokio::test]
    async fn edits_are_rejected_while_viewing() {
        let store = store_with_groceries();
        let controller = opened(&store).await;

        assert!(controller.update_title("x").is_err());
        assert!(controller.update_content("x").is_err());
        assert!(controller.cancel_edit().is_err());
        assert_eq!(controller.snapshot().draft.unwrap().title, "Groceries");
    }

    #[tokio::test]
    async fn save_from_viewing_is_rejected_without_store_call() {
        let store = store_with_groceries();
        let controller = opened(&store).await;

        let error = controller.save().await.unwrap_err();
        assert!(matches!(error, Error::InvalidState { .. }));
        assert_eq!(store.call_count(StoreOp::Update), 0);
    }

    #[tokio::test]
    async fn dismiss_error_clears_last_error() {
        let store = store_with_groceries();
        let controller = opened(&store).await;
        controller.begin_edit().unwrap();
        controller.update_title("   ").unwrap();
        let _ = controller.save().await;
        assert!(controller.snapshot().last_error.is_some());

        controller.dismiss_error();
        assert!(controller.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn draft_delete_closes_without_store_call() {
        let store = Arc::new(MemoryStore::new());
        let controller = NoteController::draft(NotesService::new(store.clone()));

        controller.delete().await.unwrap();
        assert_eq!(controller.mode(), NoteMode::Closed);
        assert!(store.calls().is_empty());
    }
}

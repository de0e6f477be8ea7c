//! Controller behind the note list screen.

use chrono::Utc;
use tokio::sync::watch;

use super::{NoteController, Operation, Publish, StateCell};
use crate::error::{Error, Result};
use crate::models::{NoteFields, NoteId, NoteSummary};
use crate::services::NotesService;
use crate::state::{ListPhase, ListSnapshot};

#[derive(Default)]
struct ListState {
    phase: ListPhase,
    summaries: Vec<NoteSummary>,
    last_error: Option<Error>,
    has_loaded: bool,
    creating: bool,
    fetch_generation: u64,
}

impl Publish for ListState {
    type Snapshot = ListSnapshot;

    fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            phase: self.phase,
            summaries: self.summaries.clone(),
            last_error: self.last_error.clone(),
            has_loaded: self.has_loaded,
            is_creating: self.creating,
            is_busy: self.creating || self.phase != ListPhase::Idle,
        }
    }
}

/// Keeps the newest-first note list and spawns note controllers.
///
/// A failed fetch leaves the previous list in place and only records the
/// error, so the screen can keep showing stale rows.
pub struct ListController {
    service: NotesService,
    cell: StateCell<ListState>,
}

impl ListController {
    pub fn new(service: NotesService) -> Self {
        Self {
            service,
            cell: StateCell::new(ListState::default()),
        }
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.cell.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.cell.subscribe()
    }

    /// Initial fetch, shown with the full-screen indicator.
    pub async fn load_all(&self) -> Result<()> {
        self.fetch(Operation::LoadAll, ListPhase::Loading).await
    }

    /// Pull-to-refresh fetch; rows stay visible meanwhile.
    pub async fn refresh(&self) -> Result<()> {
        self.fetch(Operation::Refresh, ListPhase::Refreshing).await
    }

    /// Re-fetch after returning from a note screen.
    pub async fn resume(&self) -> Result<()> {
        self.load_all().await
    }

    async fn fetch(&self, operation: Operation, phase: ListPhase) -> Result<()> {
        let generation = self.cell.update(|state| {
            state.fetch_generation += 1;
            state.phase = phase;
            state.last_error = None;
            state.fetch_generation
        });
        let _in_flight = self.cell.on_drop(move |state| {
            if state.fetch_generation == generation {
                state.phase = ListPhase::Idle;
            }
        });
        tracing::debug!("Starting to {}", operation);

        let result = self.service.list_summaries().await;

        self.cell.update(|state| {
            // Only the newest fetch may touch the list.
            if generation != state.fetch_generation {
                return Err(Error::Superseded);
            }
            state.phase = ListPhase::Idle;
            match result {
                Ok(summaries) => {
                    tracing::debug!("Loaded {} notes", summaries.len());
                    state.summaries = summaries;
                    state.has_loaded = true;
                    Ok(())
                }
                Err(error) => {
                    let error = Error::from(error);
                    tracing::warn!("Failed to {}: {}", operation, error);
                    state.last_error = Some(error.clone());
                    Err(error)
                }
            }
        })
    }

    /// Insert a placeholder note and return a controller editing it.
    ///
    /// Nothing is returned when the insert fails; the error is also kept as
    /// the list's last error.
    pub async fn create_and_open(&self) -> Result<NoteController> {
        self.cell.update(|state| {
            if state.creating {
                return Err(Error::Busy(Operation::Create));
            }
            state.creating = true;
            state.last_error = None;
            Ok(())
        })?;
        let _in_flight = self.cell.on_drop(|state| state.creating = false);

        let result = self
            .service
            .create_note(NoteFields::placeholder(Utc::now()))
            .await;

        self.cell.update(|state| {
            state.creating = false;
            match result {
                Ok(note) => {
                    tracing::info!("Created note {}", note.id);
                    Ok(NoteController::for_created(self.service.clone(), note))
                }
                Err(error) => {
                    let error = Error::from(error);
                    tracing::warn!("Failed to create note: {}", error);
                    state.last_error = Some(error.clone());
                    Err(error)
                }
            }
        })
    }

    /// Controller for an existing note, not yet opened.
    pub fn note_controller(&self) -> NoteController {
        NoteController::new(self.service.clone())
    }

    /// Controller for `id` after its first load attempt.
    ///
    /// Load failures are reported through the controller's snapshot.
    pub async fn open_note(&self, id: NoteId) -> NoteController {
        let controller = self.note_controller();
        if let Err(error) = controller.open(id).await {
            tracing::debug!("Opened note controller in error state: {}", error);
        }
        controller
    }

    pub fn dismiss_error(&self) {
        self.cell.update(|state| state.last_error = None);
    }
}

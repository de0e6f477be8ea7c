//! Controllers owning list and note state.
//!
//! Each controller keeps its state behind a mutex that is only held for
//! synchronous updates, never across an `.await`. Intents take `&self`, so a
//! front-end may poll several of them on one task; store calls are the only
//! suspension points. Every update republishes a snapshot on a `watch`
//! channel.

mod list;
mod note;

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

pub use list::ListController;
pub use note::NoteController;

/// User intents, as named in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Open,
    BeginEdit,
    UpdateTitle,
    UpdateContent,
    CancelEdit,
    Save,
    Delete,
    LoadAll,
    Refresh,
    Create,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open a note",
            Self::BeginEdit => "begin editing",
            Self::UpdateTitle => "edit the title",
            Self::UpdateContent => "edit the content",
            Self::CancelEdit => "cancel editing",
            Self::Save => "save",
            Self::Delete => "delete",
            Self::LoadAll => "load notes",
            Self::Refresh => "refresh notes",
            Self::Create => "create a note",
        })
    }
}

/// Internal controller state that can render itself for front-ends.
trait Publish {
    type Snapshot: Clone + PartialEq;

    fn snapshot(&self) -> Self::Snapshot;
}

/// Mutex-guarded state plus the channel its snapshots are published on.
struct StateCell<S: Publish> {
    state: Mutex<S>,
    updates: watch::Sender<S::Snapshot>,
}

impl<S: Publish> StateCell<S> {
    fn new(state: S) -> Self {
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            state: Mutex::new(state),
            updates,
        }
    }

    /// Apply `f` and notify subscribers if the rendered state changed.
    fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut state);
        let next = state.snapshot();
        self.updates.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        result
    }

    fn snapshot(&self) -> S::Snapshot {
        self.updates.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<S::Snapshot> {
        self.updates.subscribe()
    }

    /// Run `cleanup` on the state when the returned guard drops.
    ///
    /// Held across a store call, so it also runs when the caller drops the
    /// future mid-call. `cleanup` must be a no-op once the call has finished.
    fn on_drop<F: FnOnce(&mut S)>(&self, cleanup: F) -> InFlight<'_, S, F> {
        InFlight {
            cell: self,
            cleanup: Some(cleanup),
        }
    }
}

/// Guard returned by [`StateCell::on_drop`].
struct InFlight<'a, S: Publish, F: FnOnce(&mut S)> {
    cell: &'a StateCell<S>,
    cleanup: Option<F>,
}

impl<S: Publish, F: FnOnce(&mut S)> Drop for InFlight<'_, S, F> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            self.cell.update(cleanup);
        }
    }
}

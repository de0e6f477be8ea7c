//! Typed services layered over the remote store.

mod notes;

pub use notes::NotesService;

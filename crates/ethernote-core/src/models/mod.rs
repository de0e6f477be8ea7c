//! Data models for Ethernote

mod note;

pub use note::{Note, NoteFields, NoteId, NoteSummary, PLACEHOLDER_TITLE};

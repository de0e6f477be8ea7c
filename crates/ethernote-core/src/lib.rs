//! ethernote-core - Core library for Ethernote
//!
//! This crate contains the note models, the remote store client, and the
//! controllers that own list and edit-session state for every Ethernote
//! front-end. Front-ends render [`NoteSnapshot`] / [`ListSnapshot`] values and
//! forward user intents as controller method calls.

pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod util;

pub use controller::{ListController, NoteController, Operation};
pub use error::{Error, Result};
pub use models::{Note, NoteFields, NoteId, NoteSummary};
pub use services::NotesService;
pub use state::{ListPhase, ListSnapshot, ListView, NoteDraft, NoteMode, NoteSnapshot};

use std::io::Write;

use ethernote_core::{ListController, NotesService};

use crate::commands::common::{edit_in_editor, split_title_content, NoteEdits};
use crate::error::CliError;

pub async fn run_new(
    service: &NotesService,
    edits: NoteEdits,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let edits = if edits.is_empty() {
        edit_in_editor("")?
            .as_deref()
            .and_then(split_title_content)
            .ok_or(CliError::EmptyContent)?
    } else {
        edits
    };

    let list = ListController::new(service.clone());
    let note = list.create_and_open().await?;
    edits.apply(&note)?;

    if let Err(error) = note.save().await {
        // Don't leave the placeholder row behind.
        if let Err(cleanup) = note.delete().await {
            tracing::warn!("Failed to remove placeholder note: {}", cleanup);
        }
        return Err(error.into());
    }

    if let Some(id) = note.snapshot().note_id {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

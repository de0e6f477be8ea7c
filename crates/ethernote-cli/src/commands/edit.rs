use std::io::Write;

use ethernote_core::{NoteController, NotesService};

use crate::commands::common::{
    edit_in_editor, editor_template, normalize_note_identifier, split_title_content, NoteEdits,
};
use crate::error::CliError;

pub async fn run_edit(
    service: &NotesService,
    id: &str,
    edits: NoteEdits,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let controller = NoteController::new(service.clone());
    controller.open(id.clone()).await?;
    controller.begin_edit()?;

    let edits = if edits.is_empty() {
        let draft = controller.snapshot().draft.unwrap_or_default();
        edit_in_editor(&editor_template(&draft.title, &draft.content))?
            .as_deref()
            .and_then(split_title_content)
            .ok_or(CliError::EmptyEditedContent)?
    } else {
        edits
    };
    edits.apply(&controller)?;

    if controller.snapshot().has_unsaved_changes() {
        controller.save().await?;
    } else {
        controller.cancel_edit()?;
    }
    writeln!(out, "{id}")?;
    Ok(())
}

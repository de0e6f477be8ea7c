use std::io::{BufRead, Write};

use ethernote_core::{NoteController, NotesService};

use crate::commands::common::{confirm, normalize_note_identifier};
use crate::error::CliError;

pub async fn run_delete(
    service: &NotesService,
    id: &str,
    assume_yes: bool,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let controller = NoteController::new(service.clone());
    controller.open(id.clone()).await?;

    let title = controller
        .snapshot()
        .note
        .map(|note| note.title)
        .unwrap_or_default();
    if !assume_yes && !confirm(&format!("Delete \"{title}\"?"), input, out)? {
        writeln!(out, "Cancelled")?;
        return Ok(());
    }

    controller.delete().await?;
    writeln!(out, "{id}")?;
    Ok(())
}

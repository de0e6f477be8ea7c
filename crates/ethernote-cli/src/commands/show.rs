use std::io::Write;

use ethernote_core::{NoteController, NotesService};

use crate::commands::common::normalize_note_identifier;
use crate::error::CliError;

pub async fn run_show(
    service: &NotesService,
    id: &str,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let controller = NoteController::new(service.clone());
    controller.open(id.clone()).await?;
    let Some(note) = controller.snapshot().note else {
        return Err(ethernote_core::Error::NotFound(id.to_string()).into());
    };

    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(&note)?)?;
        return Ok(());
    }

    writeln!(out, "{}", note.title)?;
    writeln!(
        out,
        "created {}  updated {}",
        note.created_at.format("%Y-%m-%d %H:%M"),
        note.updated_at.format("%Y-%m-%d %H:%M")
    )?;
    if !note.content.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", note.content)?;
    }
    Ok(())
}

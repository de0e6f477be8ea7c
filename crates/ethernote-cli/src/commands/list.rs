use std::io::Write;

use ethernote_core::{ListController, ListView, NotesService};

use crate::commands::common::{format_summary_lines, summary_to_list_item, NoteListItem};
use crate::error::CliError;

pub async fn run_list(
    service: &NotesService,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let controller = ListController::new(service.clone());
    controller.load_all().await?;
    let snapshot = controller.snapshot();

    if as_json {
        let json_items = snapshot
            .summaries
            .iter()
            .map(summary_to_list_item)
            .collect::<Vec<NoteListItem>>();
        writeln!(out, "{}", serde_json::to_string_pretty(&json_items)?)?;
        return Ok(());
    }

    if snapshot.view() == ListView::Empty {
        writeln!(out, "No notes yet. Create one with `ethernote new`.")?;
        return Ok(());
    }
    for line in format_summary_lines(&snapshot.summaries) {
        writeln!(out, "{line}")?;
    }
    writeln!(out, "{}", snapshot.count_label())?;
    Ok(())
}

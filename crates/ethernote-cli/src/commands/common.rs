use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, Utc};
use ethernote_core::{NoteController, NoteId, NoteSummary};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    age: String,
}

/// Field changes requested on the command line or in the editor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoteEdits {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteEdits {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Push the edits into a controller that is already editing.
    pub fn apply(self, controller: &NoteController) -> Result<(), CliError> {
        if let Some(title) = self.title {
            controller.update_title(title)?;
        }
        if let Some(content) = self.content {
            controller.update_content(content)?;
        }
        Ok(())
    }
}

pub fn format_summary_lines(summaries: &[NoteSummary]) -> Vec<String> {
    let now = Utc::now();
    let id_width = summaries
        .iter()
        .map(|summary| summary.id.as_str().chars().count())
        .max()
        .unwrap_or(0);

    summaries
        .iter()
        .map(|summary| {
            let id = summary.id.as_str();
            let title = title_preview(&summary.title, 40);
            let created = summary.created_at.format("%Y-%m-%d");
            let age = note_age(summary.created_at, now);
            format!("{id:<id_width$}  {title:<40}  {created} ({age})")
        })
        .collect()
}

pub fn summary_to_list_item(summary: &NoteSummary) -> NoteListItem {
    NoteListItem {
        id: summary.id.to_string(),
        title: summary.title.clone(),
        created_at: summary.created_at,
        age: note_age(summary.created_at, Utc::now()),
    }
}

pub fn title_preview(title: &str, max_chars: usize) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Age of a note as shown in the list, e.g. `5m ago`.
///
/// Timestamps ahead of `now` read as `just now`.
pub fn note_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const DAY: i64 = 86_400;
    const UNITS: [(i64, &str); 6] = [
        (365 * DAY, "y"),
        (30 * DAY, "mo"),
        (7 * DAY, "w"),
        (DAY, "d"),
        (3_600, "h"),
        (60, "m"),
    ];

    let seconds = now.signed_duration_since(created_at).num_seconds();
    UNITS
        .iter()
        .find(|(size, _)| seconds >= *size)
        .map_or_else(
            || "just now".to_owned(),
            |(size, unit)| format!("{}{unit} ago", seconds / size),
        )
}

pub fn normalize_note_identifier(id: &str) -> Result<NoteId, CliError> {
    id.parse().map_err(|_| CliError::EmptyNoteId)
}

/// First line is the title, the rest is the content.
pub fn split_title_content(text: &str) -> Option<NoteEdits> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (title, content) = trimmed.split_once('\n').unwrap_or((trimmed, ""));
    Some(NoteEdits {
        title: Some(title.trim().to_string()),
        content: Some(content.trim().to_string()),
    })
}

pub fn editor_template(title: &str, content: &str) -> String {
    if content.is_empty() {
        format!("{title}\n")
    } else {
        format!("{title}\n\n{content}\n")
    }
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Variables consulted, in order, for the editor command.
const EDITOR_VARS: [&str; 3] = ["ETHERNOTE_EDITOR", "VISUAL", "EDITOR"];

/// Editor command split into program and arguments, e.g. `code --wait`.
pub fn editor_command(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let command = EDITOR_VARS
        .iter()
        .find_map(|name| lookup(name).filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| fallback_editor().to_owned());
    command.split_whitespace().map(str::to_owned).collect()
}

const fn fallback_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

/// Let the user edit `initial` and return what they saved.
///
/// `None` when the buffer was left blank.
pub fn edit_in_editor(initial: &str) -> Result<Option<String>, CliError> {
    let mut buffer = tempfile::Builder::new()
        .prefix("ethernote-")
        .suffix(".md")
        .tempfile()?;
    buffer.write_all(initial.as_bytes())?;
    buffer.flush()?;

    run_editor(&editor_command(|name| env::var(name).ok()), buffer.path())?;

    let edited = std::fs::read_to_string(buffer.path())?;
    let edited = edited.trim();
    Ok((!edited.is_empty()).then(|| edited.to_owned()))
}

fn run_editor(command: &[String], path: &Path) -> Result<(), CliError> {
    let Some((program, args)) = command.split_first() else {
        return Err(CliError::EditorFailed("no editor configured".to_owned()));
    };
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .map_err(|error| CliError::EditorFailed(format!("could not start `{program}`: {error}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!("`{program}` exited with {status}")))
    }
}

//! Ethernote CLI - terminal front-end for a Supabase-backed notes table
//!
//! Each command drives the same list and note controllers a graphical
//! front-end would use.

mod cli;
mod commands;
mod error;


use std::io;

use clap::Parser;
use ethernote_core::config::StoreConfig;
use ethernote_core::NotesService;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::NoteEdits;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::new::run_new;
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ethernote=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => StoreConfig::load_from_path(path)?,
        None => StoreConfig::from_env()?,
    };
    tracing::debug!("Using notes table '{}'", config.notes_table);
    let service = NotesService::from_config(&config)?;
    let mut out = io::stdout();

    match cli.command {
        Commands::List { json } => run_list(&service, json, &mut out).await?,
        Commands::Show { id, json } => run_show(&service, &id, json, &mut out).await?,
        Commands::New { title, content } => {
            run_new(&service, NoteEdits { title, content }, &mut out).await?;
        }
        Commands::Edit { id, title, content } => {
            run_edit(&service, &id, NoteEdits { title, content }, &mut out).await?;
        }
        Commands::Delete { id, yes } => {
            run_delete(&service, &id, yes, &mut io::stdin().lock(), &mut out).await?;
        }
    }

    Ok(())
}

//! drivekit - command-line utilities for Google Drive, Google Sheets, and a
//! local speech-synthesis engine.
//!
//! Every invocation is a short-lived process: resolve a credential, make one
//! or two API calls, print a summary, exit zero on success.

mod api;
mod auth;
mod cli;
mod commands;
mod config;
mod error;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{AuthCommands, Cli, Commands, DriveCommands, SheetsCommands};
use config::Settings;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::from_env(cli.credentials, cli.token)?;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login { client_secrets } => {
                commands::auth::login(&settings, client_secrets).await
            }
            AuthCommands::Status => commands::auth::status(&settings).await,
        },

        Commands::Drive { command } => match command {
            DriveCommands::List { query, limit } => {
                commands::drive::list(&settings, query, limit).await
            }
            DriveCommands::Search { name } => commands::drive::search(&settings, &name).await,
            DriveCommands::Upload { file, name, folder } => {
                commands::drive::upload(&settings, &file, name, folder).await
            }
            DriveCommands::Download { name, id, out } => {
                commands::drive::download(&settings, name, id, out).await
            }
            DriveCommands::Mkdir { name, parent } => {
                commands::drive::mkdir(&settings, &name, parent).await
            }
            DriveCommands::Delete {
                name,
                id,
                permanent,
                dry_run,
            } => commands::drive::delete(&settings, name, id, permanent, dry_run).await,
        },

        Commands::Sheets { command } => match command {
            SheetsCommands::Get { range, spreadsheet } => {
                commands::sheets::get(&settings, &range, spreadsheet).await
            }
            SheetsCommands::Write {
                cell,
                value,
                spreadsheet,
            } => commands::sheets::write(&settings, &cell, &value, spreadsheet).await,
            SheetsCommands::Append {
                values,
                sheet,
                spreadsheet,
            } => commands::sheets::append(&settings, values, &sheet, spreadsheet).await,
            SheetsCommands::AddSheet { title, spreadsheet } => {
                commands::sheets::add_sheet(&settings, &title, spreadsheet).await
            }
            SheetsCommands::ListSheets { spreadsheet } => {
                commands::sheets::list_sheets(&settings, spreadsheet).await
            }
            SheetsCommands::DeleteSheet {
                sheet_id,
                spreadsheet,
            } => commands::sheets::delete_sheet(&settings, sheet_id, spreadsheet).await,
            SheetsCommands::RenameSheet {
                sheet_id,
                title,
                spreadsheet,
            } => commands::sheets::rename_sheet(&settings, sheet_id, &title, spreadsheet).await,
            SheetsCommands::DuplicateSheet {
                sheet_id,
                title,
                spreadsheet,
            } => {
                commands::sheets::duplicate_sheet(&settings, sheet_id, &title, spreadsheet).await
            }
            SheetsCommands::Search {
                value,
                pattern,
                column,
                sheet,
                spreadsheet,
            } => {
                commands::sheets::search(&settings, value, pattern, column, &sheet, spreadsheet)
                    .await
            }
        },

        Commands::Say(args) => commands::speech::say(&settings, args).await,
    }
}

//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drivekit")]
#[command(
    version,
    about = "Command-line utilities for Google Drive, Google Sheets, and local speech synthesis"
)]
pub struct Cli {
    /// Service-account key file (overrides DRIVEKIT_CREDENTIALS)
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Token file path (overrides DRIVEKIT_TOKEN)
    #[arg(long, global = true, value_name = "PATH")]
    pub token: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication management
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Drive file operations
    Drive {
        #[command(subcommand)]
        command: DriveCommands,
    },

    /// Spreadsheet operations
    Sheets {
        #[command(subcommand)]
        command: SheetsCommands,
    },

    /// Synthesize speech with the local engine
    Say(SayArgs),
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Run the one-time interactive consent flow and persist the token
    Login {
        /// Installed-app OAuth client file (overrides DRIVEKIT_OAUTH_CLIENT)
        #[arg(long, value_name = "PATH")]
        client_secrets: Option<PathBuf>,
    },

    /// Show which credential resolves and when it expires
    Status,
}

#[derive(Subcommand)]
pub enum DriveCommands {
    /// List files, most recently modified first
    List {
        /// Raw Drive query expression (e.g. "mimeType = 'application/pdf'")
        #[arg(long)]
        query: Option<String>,

        /// Maximum number of files to list (single page)
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Find files by exact name
    Search {
        name: String,
    },

    /// Upload a local file
    Upload {
        file: PathBuf,

        /// Remote name (defaults to the local file name)
        #[arg(long)]
        name: Option<String>,

        /// Parent folder ID
        #[arg(long)]
        folder: Option<String>,
    },

    /// Download a file by name or ID (exports native Google documents)
    Download {
        /// File name (must match exactly one file)
        name: Option<String>,

        /// File ID (use when the name is ambiguous)
        #[arg(long, conflicts_with = "name")]
        id: Option<String>,

        /// Output path (defaults to the remote name)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Create a folder
    Mkdir {
        name: String,

        /// Parent folder ID (defaults to the Drive root)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Move a file to the trash (or delete it permanently)
    Delete {
        /// File name (must match exactly one file)
        name: Option<String>,

        /// File ID (use when the name is ambiguous)
        #[arg(long, conflicts_with = "name")]
        id: Option<String>,

        /// Bypass the trash and delete permanently
        #[arg(long)]
        permanent: bool,

        /// Show what would be deleted without doing it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum SheetsCommands {
    /// Read a range of values
    Get {
        /// A1-notation range, e.g. "Sheet1!A1:C10"
        #[arg(long)]
        range: String,

        /// Spreadsheet ID (falls back to DRIVEKIT_SPREADSHEET_ID)
        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Write a single cell
    Write {
        /// Target cell, e.g. "Sheet1!B2"
        #[arg(long)]
        cell: String,

        #[arg(long)]
        value: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Append a row after the last data row
    Append {
        /// Comma-separated cell values for the new row
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<String>,

        /// Sheet (tab) to append to
        #[arg(long, default_value = "Sheet1")]
        sheet: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Add a new sheet (tab) to the spreadsheet
    AddSheet {
        title: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// List the sheets (tabs) of the spreadsheet
    ListSheets {
        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Delete a sheet (tab) by its numeric ID
    DeleteSheet {
        /// Sheet ID (see list-sheets)
        #[arg(long)]
        sheet_id: i64,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Rename a sheet (tab)
    RenameSheet {
        /// Sheet ID (see list-sheets)
        #[arg(long)]
        sheet_id: i64,

        /// New title
        title: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Duplicate a sheet (tab) within the spreadsheet
    DuplicateSheet {
        /// Sheet ID (see list-sheets)
        #[arg(long)]
        sheet_id: i64,

        /// Title for the copy
        title: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },

    /// Find rows whose cells match a substring or regular expression
    Search {
        /// Substring to look for
        #[arg(long, conflicts_with = "pattern")]
        value: Option<String>,

        /// Regular expression to match against cell values
        #[arg(long)]
        pattern: Option<String>,

        /// Restrict the match to one column (letter, e.g. "C")
        #[arg(long)]
        column: Option<String>,

        /// Sheet (tab) to search
        #[arg(long, default_value = "Sheet1")]
        sheet: String,

        #[arg(long)]
        spreadsheet: Option<String>,
    },
}

#[derive(Args)]
pub struct SayArgs {
    /// Text to synthesize
    pub text: Option<String>,

    /// Speaker style ID (see --list-speakers)
    #[arg(long, default_value_t = 1)]
    pub speaker: u32,

    /// Output WAV path
    #[arg(long, default_value = "speech.wav")]
    pub out: PathBuf,

    /// Engine base URL (overrides DRIVEKIT_SPEECH_URL)
    #[arg(long)]
    pub engine: Option<String>,

    /// List available voices and exit
    #[arg(long)]
    pub list_speakers: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_drive_download_by_id() {
        let cli = Cli::parse_from([
            "drivekit", "drive", "download", "--id", "abc123", "--out", "report.pdf",
        ]);
        match cli.command {
            Commands::Drive {
                command: DriveCommands::Download { name, id, out },
            } => {
                assert!(name.is_none());
                assert_eq!(id.as_deref(), Some("abc123"));
                assert_eq!(out, Some(PathBuf::from("report.pdf")));
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_parse_drive_delete_defaults_to_trash() {
        let cli = Cli::parse_from(["drivekit", "drive", "delete", "old-notes.txt"]);
        match cli.command {
            Commands::Drive {
                command:
                    DriveCommands::Delete {
                        name,
                        permanent,
                        dry_run,
                        ..
                    },
            } => {
                assert_eq!(name.as_deref(), Some("old-notes.txt"));
                assert!(!permanent);
                assert!(!dry_run);
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_parse_drive_delete_permanent_dry_run() {
        let cli = Cli::parse_from([
            "drivekit", "drive", "delete", "--id", "abc", "--permanent", "--dry-run",
        ]);
        match cli.command {
            Commands::Drive {
                command:
                    DriveCommands::Delete {
                        id,
                        permanent,
                        dry_run,
                        ..
                    },
            } => {
                assert_eq!(id.as_deref(), Some("abc"));
                assert!(permanent);
                assert!(dry_run);
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_parse_sheets_search() {
        let cli = Cli::parse_from([
            "drivekit", "sheets", "search", "--value", "apples", "--column", "B",
        ]);
        match cli.command {
            Commands::Sheets {
                command:
                    SheetsCommands::Search {
                        value,
                        pattern,
                        column,
                        sheet,
                        ..
                    },
            } => {
                assert_eq!(value.as_deref(), Some("apples"));
                assert!(pattern.is_none());
                assert_eq!(column.as_deref(), Some("B"));
                assert_eq!(sheet, "Sheet1");
            }
            _ => panic!("parsed into the wrong command"),
        }
    }

    #[test]
    fn test_parse_sheets_append_values() {
        let cli = Cli::parse_from([
            "drivekit", "sheets", "append", "--values", "a,b,c", "--sheet", "Log",
        ]);
        match cli.command {
            Commands::Sheets {
                command: SheetsCommands::Append { values, sheet, .. },
            } => {
                assert_eq!(values, vec!["a", "b", "c"]);
                assert_eq!(sheet, "Log");
            }
            _ => panic!("parsed into the wrong command"),
        }
    }
}

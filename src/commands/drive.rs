//! `drivekit drive` - file operations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::api;
use crate::api::drive::{export_format, mime_for_path, DriveClient, DriveFile};
use crate::auth::{self, DRIVE_SCOPE};
use crate::config::Settings;
use crate::error::Error;

async fn drive_client(settings: &Settings) -> Result<DriveClient> {
    let http = api::http_client()?;
    let resolver = auth::google_resolver(settings, &[DRIVE_SCOPE]);
    let token = auth::bearer_token(&http, &resolver).await?;
    Ok(DriveClient::new(http, token))
}

pub async fn list(settings: &Settings, query: Option<String>, limit: u32) -> Result<()> {
    let client = drive_client(settings).await?;
    let files = client.list(query.as_deref(), limit).await?;

    if files.is_empty() {
        println!("No files found.");
        return Ok(());
    }
    for file in &files {
        print_file(file);
    }
    println!("{} file(s)", files.len());
    Ok(())
}

pub async fn search(settings: &Settings, name: &str) -> Result<()> {
    let client = drive_client(settings).await?;
    let matches = client.find_by_name(name).await?;

    if matches.is_empty() {
        println!("No files named '{}'.", name);
        return Ok(());
    }
    for file in &matches {
        print_file(file);
    }
    if matches.len() > 1 {
        println!(
            "{} files share this name - use --id with download/delete to pick one",
            matches.len()
        );
    }
    Ok(())
}

pub async fn upload(
    settings: &Settings,
    file: &Path,
    name: Option<String>,
    folder: Option<String>,
) -> Result<()> {
    let content = std::fs::read(file)
        .with_context(|| format!("failed to read local file {}", file.display()))?;
    let remote_name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    });
    let mime = mime_for_path(file);

    println!("Uploading {} ({} bytes, {})...", remote_name, content.len(), mime);
    let client = drive_client(settings).await?;
    let uploaded = client
        .upload(&remote_name, mime, content, folder.as_deref())
        .await?;

    println!("Uploaded '{}' (id: {})", uploaded.name, uploaded.id);
    Ok(())
}

pub async fn download(
    settings: &Settings,
    name: Option<String>,
    id: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let client = drive_client(settings).await?;
    let file = resolve_target(&client, name, id).await?;

    let (content, out_path) = if file.is_workspace_doc() {
        let mime = file.mime_type.as_deref().unwrap_or_default();
        let (export_mime, ext) = export_format(mime).ok_or_else(|| {
            Error::Config(format!(
                "'{}' is a native Google document ({}) with no supported export format",
                file.name, mime
            ))
        })?;
        println!("Exporting '{}' as {}...", file.name, export_mime);
        let content = client.export(&file.id, export_mime).await?;
        let out_path = out.unwrap_or_else(|| PathBuf::from(format!("{}.{}", file.name, ext)));
        (content, out_path)
    } else {
        println!("Downloading '{}'...", file.name);
        let content = client.download(&file.id).await?;
        let out_path = out.unwrap_or_else(|| PathBuf::from(&file.name));
        (content, out_path)
    };

    std::fs::write(&out_path, &content)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    println!("Wrote {} bytes to {}", content.len(), out_path.display());
    Ok(())
}

pub async fn mkdir(settings: &Settings, name: &str, parent: Option<String>) -> Result<()> {
    let client = drive_client(settings).await?;
    let folder = client.create_folder(name, parent.as_deref()).await?;

    println!("Created folder '{}' (id: {})", folder.name, folder.id);
    Ok(())
}

/// Deleting moves the file to the trash unless `--permanent` is given;
/// a trashed file stays recoverable, a deleted one does not.
pub async fn delete(
    settings: &Settings,
    name: Option<String>,
    id: Option<String>,
    permanent: bool,
    dry_run: bool,
) -> Result<()> {
    let client = drive_client(settings).await?;
    let file = resolve_target(&client, name, id).await?;

    if dry_run {
        let action = if permanent { "permanently delete" } else { "trash" };
        println!("Would {} '{}' (id: {})", action, file.name, file.id);
        return Ok(());
    }

    if permanent {
        client.delete(&file.id).await?;
        println!("Permanently deleted '{}' (id: {})", file.name, file.id);
    } else {
        client.trash(&file.id).await?;
        println!("Moved '{}' to trash (id: {})", file.name, file.id);
    }
    Ok(())
}

/// Resolve a name-or-ID argument to exactly one file.
///
/// Several remote files may share a name; acting on "the first one" would
/// silently hit an arbitrary file, so an ambiguous name is an error that
/// lists the candidates and asks for an explicit ID.
async fn resolve_target(
    client: &DriveClient,
    name: Option<String>,
    id: Option<String>,
) -> Result<DriveFile> {
    if let Some(id) = id {
        return Ok(client.metadata(&id).await?);
    }
    let Some(name) = name else {
        return Err(Error::Config("give a file name or --id".to_string()).into());
    };

    let mut matches = client.find_by_name(&name).await?;
    match matches.len() {
        0 => Err(Error::NotFound(format!("no file named '{}'", name)).into()),
        1 => Ok(matches.remove(0)),
        n => {
            let candidates: Vec<String> = matches
                .iter()
                .map(|f| format!("  {}  ({})", f.id, f.modified_time.as_deref().unwrap_or("?")))
                .collect();
            Err(Error::Config(format!(
                "{} files are named '{}' - re-run with --id <ID>:\n{}",
                n,
                name,
                candidates.join("\n")
            ))
            .into())
        }
    }
}

fn print_file(file: &DriveFile) {
    let size = file
        .size
        .as_deref()
        .map(|s| format!("{:>10}", s))
        .unwrap_or_else(|| format!("{:>10}", "-"));
    println!(
        "{:<36} {} {:<24} {}",
        file.id,
        size,
        file.modified_time.as_deref().unwrap_or("-"),
        file.name
    );
}

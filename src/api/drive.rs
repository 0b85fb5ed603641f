//! Google Drive v3 client: list, search, upload, download/export,
//! folder creation, trash/delete.

use rand::Rng;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

use super::check_response;

const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Fields requested on every file listing/metadata call
const FILE_FIELDS: &str = "id,name,mimeType,size,modifiedTime";

/// Native Google Workspace documents have no byte content and must be
/// exported instead of downloaded.
const WORKSPACE_MIME_PREFIX: &str = "application/vnd.google-apps";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Fresh boundary per upload so arbitrary file content cannot collide
/// with the part separator.
fn upload_boundary() -> String {
    let n: u128 = rand::thread_rng().gen();
    format!("drivekit_{:032x}", n)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    /// Drive reports sizes as decimal strings
    pub size: Option<String>,
    #[serde(rename = "modifiedTime")]
    pub modified_time: Option<String>,
}

impl DriveFile {
    pub fn is_workspace_doc(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with(WORKSPACE_MIME_PREFIX))
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveClient {
    http: Client,
    token: String,
}

impl DriveClient {
    pub fn new(http: Client, token: String) -> Self {
        Self { http, token }
    }

    /// List files, single page. `query` is a raw Drive query expression.
    pub async fn list(&self, query: Option<&str>, limit: u32) -> Result<Vec<DriveFile>> {
        let mut params = vec![
            ("pageSize", limit.to_string()),
            ("fields", format!("files({})", FILE_FIELDS)),
            ("orderBy", "modifiedTime desc".to_string()),
        ];
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/files", DRIVE_BASE_URL))
            .query(&params)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;

        let list: FileList = response.json().await?;
        debug!(count = list.files.len(), "listed drive files");
        Ok(list.files)
    }

    /// All non-trashed files matching a name exactly. Callers decide what to
    /// do when more than one matches; this never picks one silently.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<DriveFile>> {
        let query = format!(
            "name = '{}' and trashed = false",
            escape_query_value(name)
        );
        self.list(Some(&query), 100).await
    }

    pub async fn metadata(&self, file_id: &str) -> Result<DriveFile> {
        let response = self
            .http
            .get(format!("{}/files/{}", DRIVE_BASE_URL, file_id))
            .query(&[("fields", FILE_FIELDS)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Multipart-related upload: JSON metadata part plus media part.
    pub async fn upload(
        &self,
        name: &str,
        mime_type: &str,
        content: Vec<u8>,
        folder_id: Option<&str>,
    ) -> Result<DriveFile> {
        let mut metadata = serde_json::json!({ "name": name });
        if let Some(folder) = folder_id {
            metadata["parents"] = serde_json::json!([folder]);
        }

        let boundary = upload_boundary();
        let body = multipart_related_body(&boundary, &metadata.to_string(), mime_type, &content);
        debug!(name, mime_type, bytes = content.len(), "uploading file");

        let response = self
            .http
            .post(format!("{}/files", UPLOAD_BASE_URL))
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .bearer_auth(&self.token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Create a folder, optionally inside a parent folder.
    pub async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<DriveFile> {
        let mut metadata = serde_json::json!({ "name": name, "mimeType": FOLDER_MIME });
        if let Some(parent) = parent_id {
            metadata["parents"] = serde_json::json!([parent]);
        }

        let response = self
            .http
            .post(format!("{}/files", DRIVE_BASE_URL))
            .query(&[("fields", FILE_FIELDS)])
            .bearer_auth(&self.token)
            .json(&metadata)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Download raw file bytes (`alt=media`).
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/files/{}", DRIVE_BASE_URL, file_id))
            .query(&[("alt", "media")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Export a native workspace document to a conventional format.
    pub async fn export(&self, file_id: &str, export_mime: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/files/{}/export", DRIVE_BASE_URL, file_id))
            .query(&[("mimeType", export_mime)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Move a file to the trash. Recoverable from the Drive UI for 30 days.
    pub async fn trash(&self, file_id: &str) -> Result<()> {
        let response = self
            .http
            .patch(format!("{}/files/{}", DRIVE_BASE_URL, file_id))
            .bearer_auth(&self.token)
            .json(&trash_metadata())
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// Permanently delete a file by ID, bypassing the trash.
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/files/{}", DRIVE_BASE_URL, file_id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }
}

fn trash_metadata() -> serde_json::Value {
    serde_json::json!({ "trashed": true })
}

/// Escape a value for embedding in a single-quoted Drive query string.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Export target for a workspace mime type: (mime, file extension).
pub fn export_format(mime_type: &str) -> Option<(&'static str, &'static str)> {
    match mime_type {
        "application/vnd.google-apps.document" => Some(("application/pdf", "pdf")),
        "application/vnd.google-apps.spreadsheet" => Some((
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
        )),
        "application/vnd.google-apps.presentation" => Some(("application/pdf", "pdf")),
        _ => None,
    }
}

/// Content-type guess from the file extension. Unknown extensions upload as
/// opaque bytes.
pub fn mime_for_path(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

fn multipart_related_body(
    boundary: &str,
    metadata: &str,
    mime_type: &str,
    content: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\ncontent-type: {mime}\r\n\r\n",
            b = boundary,
            meta = metadata,
            mime = mime_type,
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query_value() {
        assert_eq!(escape_query_value("plain.txt"), "plain.txt");
        assert_eq!(escape_query_value("it's here"), "it\\'s here");
        assert_eq!(escape_query_value("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_mime_for_path() {
        use std::path::Path;
        assert_eq!(mime_for_path(Path::new("notes.TXT")), "text/plain");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("data")), "application/octet-stream");
        assert_eq!(
            mime_for_path(Path::new("archive.unknown")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_export_format_mapping() {
        assert_eq!(
            export_format("application/vnd.google-apps.document"),
            Some(("application/pdf", "pdf"))
        );
        assert!(export_format("application/vnd.google-apps.spreadsheet")
            .is_some_and(|(_, ext)| ext == "xlsx"));
        assert_eq!(export_format("text/plain"), None);
    }

    #[test]
    fn test_workspace_doc_detection() {
        let doc = DriveFile {
            id: "1".to_string(),
            name: "Plan".to_string(),
            mime_type: Some("application/vnd.google-apps.document".to_string()),
            size: None,
            modified_time: None,
        };
        assert!(doc.is_workspace_doc());

        let plain = DriveFile {
            mime_type: Some("text/plain".to_string()),
            ..doc.clone()
        };
        assert!(!plain.is_workspace_doc());
    }

    #[test]
    fn test_parse_file_list() {
        let json = r#"{
            "kind": "drive#fileList",
            "files": [
                {"id": "abc", "name": "report.pdf", "mimeType": "application/pdf",
                 "size": "1024", "modifiedTime": "2025-11-02T10:00:00.000Z"},
                {"id": "def", "name": "Plan", "mimeType": "application/vnd.google-apps.document"}
            ]
        }"#;
        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].size.as_deref(), Some("1024"));
        assert!(list.files[1].size.is_none());
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("bnd42", r#"{"name":"a.txt"}"#, "text/plain", b"hello");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--bnd42\r\n"));
        assert!(text.contains(r#"{"name":"a.txt"}"#));
        assert!(text.contains("content-type: text/plain"));
        assert!(text.ends_with("\r\n--bnd42--\r\n"));
    }

    #[test]
    fn test_upload_boundary_is_unique_per_call() {
        let a = upload_boundary();
        let b = upload_boundary();
        assert_ne!(a, b);
        assert!(a.starts_with("drivekit_"));
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_trash_metadata_body() {
        assert_eq!(trash_metadata().to_string(), r#"{"trashed":true}"#);
    }
}

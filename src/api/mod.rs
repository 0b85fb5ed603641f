//! Thin typed clients over the remote HTTP APIs.
//!
//! Each client wraps a shared `reqwest::Client` (cheap to clone, pooled
//! connections) plus whatever it needs to authenticate. No retries, no
//! pagination: one logical operation per process invocation.

pub mod drive;
pub mod sheets;
pub mod speech;

pub use drive::DriveClient;
pub use sheets::SheetsClient;
pub use speech::SpeechClient;

use crate::error::{Error, Result};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the process-wide HTTP client.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(Error::Transport)
}

/// Check if a response is successful, mapping failures onto the taxonomy.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::from_status(status, &body))
    }
}

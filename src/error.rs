//! Error taxonomy shared by the auth and API layers.
//!
//! Every failure is terminal for the invoking command: `main` prints one
//! message and exits non-zero. The variants exist so commands can print
//! actionable guidance (re-run `auth login` vs fix a config path).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed credential file, or a required identifier
    /// (e.g. spreadsheet ID) that could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// Expired, invalid, or unresolvable credential.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Remote resource absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network-level failure talking to a remote service.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any other non-success HTTP response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl Error {
    /// Truncate a response body to avoid logging excessive data.
    /// Error bodies are often non-ASCII (localized messages), so the cut
    /// point backs up to the nearest character boundary.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => Error::Auth("unauthorized - token may be expired or revoked".to_string()),
            403 => Error::Auth(format!("access denied: {}", truncated)),
            404 => Error::NotFound(truncated),
            _ => Error::Api {
                status: status.as_u16(),
                message: truncated,
            },
        }
    }
}

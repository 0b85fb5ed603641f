//! Runtime configuration resolution.
//!
//! Everything an invocation needs is captured into a `Settings` struct up
//! front: credential and token paths, the default spreadsheet, and the speech
//! engine URL. Paths resolve with deterministic precedence:
//! explicit flag > environment variable > hard-coded default.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// App name used for the default token directory (`~/.config/drivekit/`)
const APP_NAME: &str = "drivekit";

/// Token file name in the config directory
const TOKEN_FILE: &str = "token.json";

/// Service-account key path (resolver step 2)
pub const CREDENTIALS_ENV: &str = "DRIVEKIT_CREDENTIALS";

/// Token file path override (resolver step 3)
pub const TOKEN_ENV: &str = "DRIVEKIT_TOKEN";

/// Installed-app OAuth client file for `auth login`
pub const OAUTH_CLIENT_ENV: &str = "DRIVEKIT_OAUTH_CLIENT";

/// Default spreadsheet when `--spreadsheet` is omitted
pub const SPREADSHEET_ENV: &str = "DRIVEKIT_SPREADSHEET_ID";

/// Speech engine base URL
pub const SPEECH_URL_ENV: &str = "DRIVEKIT_SPEECH_URL";

/// Default base URL of the local speech-synthesis engine
const DEFAULT_SPEECH_URL: &str = "http://127.0.0.1:50021";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Service-account key path, if one resolved (flag or env var)
    pub credentials_path: Option<PathBuf>,
    /// Where the persisted user token lives
    pub token_path: PathBuf,
    /// Installed-app OAuth client file, if one resolved
    pub oauth_client_path: Option<PathBuf>,
    /// Default spreadsheet ID from the environment
    pub spreadsheet_id: Option<String>,
    /// Base URL of the local speech engine
    pub speech_url: String,
}

impl Settings {
    /// Capture the environment once, layering explicit flags on top.
    pub fn from_env(
        credentials_flag: Option<PathBuf>,
        token_flag: Option<PathBuf>,
    ) -> Result<Self> {
        let credentials_path = credentials_flag.or_else(|| env_path(CREDENTIALS_ENV));

        let token_path = resolve_path(token_flag, env_path(TOKEN_ENV), default_token_path()?);

        let oauth_client_path = env_path(OAUTH_CLIENT_ENV);

        let spreadsheet_id = std::env::var(SPREADSHEET_ENV)
            .ok()
            .filter(|s| !s.is_empty());

        let speech_url = std::env::var(SPEECH_URL_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SPEECH_URL.to_string());

        Ok(Self {
            credentials_path,
            token_path,
            oauth_client_path,
            spreadsheet_id,
            speech_url,
        })
    }

    /// The spreadsheet to operate on: flag wins, then the env default.
    pub fn spreadsheet(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(|| self.spreadsheet_id.clone()).ok_or_else(|| {
            Error::Config(format!(
                "no spreadsheet ID given - pass --spreadsheet or set {}",
                SPREADSHEET_ENV
            ))
        })
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn default_token_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine a config directory".to_string()))?;
    Ok(config_dir.join(APP_NAME).join(TOKEN_FILE))
}

/// Precedence: explicit flag > environment variable > default.
fn resolve_path(explicit: Option<PathBuf>, env: Option<PathBuf>, default: PathBuf) -> PathBuf {
    explicit.or(env).unwrap_or(default)
}

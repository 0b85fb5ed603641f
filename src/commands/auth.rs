//! `drivekit auth` - consent flow and credential status.

use std::path::PathBuf;

use anyhow::Result;

use crate::api;
use crate::auth::{self, flow};
use crate::config::{Settings, OAUTH_CLIENT_ENV};
use crate::error::Error;

/// Run the one-time interactive consent flow.
pub async fn login(settings: &Settings, client_secrets: Option<PathBuf>) -> Result<()> {
    let client_path = client_secrets
        .or_else(|| settings.oauth_client_path.clone())
        .ok_or_else(|| {
            Error::Config(format!(
                "no OAuth client file given - pass --client-secrets or set {}",
                OAUTH_CLIENT_ENV
            ))
        })?;

    let client = flow::load_oauth_client(&client_path)?;
    let http = api::http_client()?;
    let scopes = vec![
        auth::DRIVE_SCOPE.to_string(),
        auth::SHEETS_SCOPE.to_string(),
    ];

    let token = flow::login(&http, &client, &scopes, &settings.token_path).await?;

    println!("Authorized. Token saved to {}", settings.token_path.display());
    if token.refresh_token.is_none() {
        println!(
            "Warning: no refresh token was granted; you will need to log in again \
             once this token expires."
        );
    }
    Ok(())
}

/// Report which credential source resolves and its validity.
pub async fn status(settings: &Settings) -> Result<()> {
    let http = api::http_client()?;
    let resolver = auth::google_resolver(settings, &[auth::DRIVE_SCOPE, auth::SHEETS_SCOPE]);
    let credential = resolver.resolve(&http).await?;

    println!("Credential: {}", credential.describe());
    if settings.credentials_path.is_none() {
        println!("Token file: {}", resolver.token_path().display());
    }
    Ok(())
}

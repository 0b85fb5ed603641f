//! Authentication: credential types, the resolver, the service-account
//! assertion exchange, and the one-time interactive consent flow.

mod credential;
pub mod flow;
mod resolver;
mod service_account;

pub use credential::{Credential, ServiceAccountKey, UserToken};
pub use resolver::{AuthConfig, Resolver};

use reqwest::Client;

use crate::config::Settings;
use crate::error::Result;

/// Drive scope: full file access (list/upload/download/delete)
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Sheets scope: read/write spreadsheet values and structure
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Build a resolver for the Google integration from captured settings.
pub fn google_resolver(settings: &Settings, scopes: &[&str]) -> Resolver {
    Resolver::new(AuthConfig {
        credentials_path: settings.credentials_path.clone(),
        token_path: settings.token_path.clone(),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
    })
}

/// Resolve a credential and mint the bearer token API clients attach.
///
/// User tokens are already valid when the resolver returns them; a
/// service-account key costs one assertion exchange here.
pub async fn bearer_token(http: &Client, resolver: &Resolver) -> Result<String> {
    let credential = resolver.resolve(http).await?;
    match credential {
        Credential::User(token) => Ok(token.access_token),
        Credential::ServiceAccount(key) => {
            service_account::mint_access_token(http, &key, resolver.scopes()).await
        }
    }
}

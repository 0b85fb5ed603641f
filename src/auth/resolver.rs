//! Credential resolution.
//!
//! Given the paths captured in `AuthConfig`, produce a credential the API
//! clients can mint bearer tokens from. Precedence: an explicit
//! service-account key (flag or env var) wins; otherwise the persisted user
//! token is loaded, refreshed in place if expired, and handed back.
//!
//! Steady-state cost per invocation: at most one disk read, one disk write
//! (refresh only), and one network call (refresh only). A known-expired
//! credential is never returned.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::credential::{Credential, ServiceAccountKey, TokenResponse, UserToken};

pub struct AuthConfig {
    /// Explicit service-account key path (flag > env var), if any
    pub credentials_path: Option<PathBuf>,
    /// Resolved token file path (flag > env var > default)
    pub token_path: PathBuf,
    /// Permission scopes the target API requires
    pub scopes: Vec<String>,
}

pub struct Resolver {
    config: AuthConfig,
}

impl Resolver {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn scopes(&self) -> &[String] {
        &self.config.scopes
    }

    pub fn token_path(&self) -> &Path {
        &self.config.token_path
    }

    /// Resolve a valid credential, refreshing and persisting as needed.
    pub async fn resolve(&self, http: &Client) -> Result<Credential> {
        if let Some(ref path) = self.config.credentials_path {
            let key = load_service_account_key(path)?;
            debug!(path = %path.display(), "loaded service-account key");
            return Ok(Credential::ServiceAccount(key));
        }

        let path = &self.config.token_path;
        if !path.exists() {
            return Err(Error::Auth(format!(
                "no credentials found ({} does not exist) - run `drivekit auth login` first",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Auth(format!("failed to read token file: {}", e)))?;
        let token: UserToken = serde_json::from_str(&contents).map_err(|e| {
            Error::Auth(format!(
                "token file {} is not valid - run `drivekit auth login` again ({})",
                path.display(),
                e
            ))
        })?;

        if !token.is_expired() {
            debug!("persisted token still valid");
            return Ok(Credential::User(token));
        }

        let Some(ref refresh_token) = token.refresh_token else {
            return Err(Error::Auth(
                "token expired and has no refresh token - run `drivekit auth login` again"
                    .to_string(),
            ));
        };

        info!("token expired, refreshing");
        let refreshed = refresh_user_token(http, &token, refresh_token).await?;
        save_token(path, &refreshed)?;
        debug!(path = %path.display(), "persisted refreshed token");

        Ok(Credential::User(refreshed))
    }
}

/// Load and validate a service-account key file.
pub fn load_service_account_key(path: &Path) -> Result<ServiceAccountKey> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "credentials file {} does not exist",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "{} is not a valid service-account key: {}",
            path.display(),
            e
        ))
    })
}

/// One refresh-grant call against the token endpoint.
async fn refresh_user_token(
    http: &Client,
    token: &UserToken,
    refresh_token: &str,
) -> Result<UserToken> {
    let params = [
        ("client_id", token.client_id.as_str()),
        ("client_secret", token.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = http.post(&token.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "token refresh failed ({}): {} - run `drivekit auth login` again",
            status, body
        )));
    }

    let granted: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("token refresh returned invalid JSON: {}", e)))?;

    let expiry = Some(granted.expiry());
    Ok(UserToken {
        access_token: granted.access_token,
        // Google omits the refresh token on refresh grants; keep the old one
        refresh_token: granted
            .refresh_token
            .or_else(|| Some(refresh_token.to_string())),
        client_id: token.client_id.clone(),
        client_secret: token.client_secret.clone(),
        token_uri: token.token_uri.clone(),
        expiry,
        scopes: token.scopes.clone(),
    })
}

/// Persist a token file atomically: write a sibling temp file, then rename
/// over the target so a crash never leaves a half-written token behind.
pub fn save_token(path: &Path, token: &UserToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    let contents = serde_json::to_string_pretty(token)
        .map_err(|e| Error::Config(format!("failed to serialize token: {}", e)))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)
        .map_err(|e| Error::Config(format!("failed to write {}: {}", tmp.display(), e)))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::Config(format!("failed to replace {}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn test_config(dir: &Path, credentials: Option<PathBuf>) -> AuthConfig {
        AuthConfig {
            credentials_path: credentials,
            token_path: dir.join("token.json"),
            scopes: vec!["https://www.googleapis.com/auth/drive".to_string()],
        }
    }

    fn write_token(path: &Path, token: &UserToken) {
        std::fs::write(path, serde_json::to_string(token).unwrap()).unwrap();
    }

    fn user_token(expired: bool, token_uri: &str) -> UserToken {
        let offset = if expired {
            Duration::minutes(-10)
        } else {
            Duration::hours(1)
        };
        UserToken {
            access_token: "ya29.old".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            client_id: "id.apps.googleusercontent.com".to_string(),
            client_secret: "secret".to_string(),
            token_uri: token_uri.to_string(),
            expiry: Some(Utc::now() + offset),
            scopes: vec![],
        }
    }

    /// Minimal token endpoint: answers every connection with the given JSON
    /// body and counts how many requests it served.
    async fn spawn_token_endpoint(body: &'static str, hits: Arc<AtomicUsize>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_valid_token_returned_without_network_or_write() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), None);
        // token_uri points nowhere routable, so any network attempt would fail
        let token = user_token(false, "http://127.0.0.1:1/token");
        write_token(&config.token_path, &token);
        let before = std::fs::read_to_string(&config.token_path).unwrap();

        let resolver = Resolver::new(config);
        let credential = resolver.resolve(&Client::new()).await.unwrap();

        match credential {
            Credential::User(t) => assert_eq!(t.access_token, "ya29.old"),
            other => panic!("expected user token, got {:?}", other),
        }
        let after = std::fs::read_to_string(resolver.token_path()).unwrap();
        assert_eq!(before, after, "token file must not be rewritten");
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once_and_persists() {
        let hits = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_token_endpoint(
            r#"{"access_token":"ya29.new","expires_in":3600,"token_type":"Bearer"}"#,
            hits.clone(),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), None);
        write_token(&config.token_path, &user_token(true, &endpoint));

        let resolver = Resolver::new(config);
        let credential = resolver.resolve(&Client::new()).await.unwrap();

        match credential {
            Credential::User(t) => {
                assert_eq!(t.access_token, "ya29.new");
                // refresh grant omitted the refresh token; the old one survives
                assert_eq!(t.refresh_token.as_deref(), Some("1//refresh"));
                assert!(!t.is_expired());
            }
            other => panic!("expected user token, got {:?}", other),
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1, "exactly one refresh call");

        let persisted: UserToken =
            serde_json::from_str(&std::fs::read_to_string(resolver.token_path()).unwrap())
                .unwrap();
        assert_eq!(persisted.access_token, "ya29.new");
    }

    #[tokio::test]
    async fn test_missing_token_file_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(test_config(dir.path(), None));
        let err = resolver.resolve(&Client::new()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_token_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path(), None);
        let mut token = user_token(true, "http://127.0.0.1:1/token");
        token.refresh_token = None;
        write_token(&config.token_path, &token);

        let err = Resolver::new(config)
            .resolve(&Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_malformed_credentials_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.json");
        std::fs::write(&key_path, "{ not json").unwrap();

        let err = Resolver::new(test_config(dir.path(), Some(key_path)))
            .resolve(&Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_missing_credentials_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Resolver::new(test_config(dir.path(), Some(dir.path().join("nope.json"))))
            .resolve(&Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_credentials_path_wins_over_existing_token() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.json");
        std::fs::write(
            &key_path,
            r#"{"client_email":"robot@project.iam.gserviceaccount.com","private_key":"pem"}"#,
        )
        .unwrap();

        let config = test_config(dir.path(), Some(key_path));
        write_token(&config.token_path, &user_token(false, "http://127.0.0.1:1"));

        let credential = Resolver::new(config)
            .resolve(&Client::new())
            .await
            .unwrap();
        assert!(matches!(credential, Credential::ServiceAccount(_)));
    }

    #[test]
    fn test_save_token_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");

        let token = user_token(false, "http://127.0.0.1:1");
        save_token(&path, &token).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let mut updated = token.clone();
        updated.access_token = "ya29.updated".to_string();
        save_token(&path, &updated).unwrap();

        let persisted: UserToken =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted.access_token, "ya29.updated");
    }
}

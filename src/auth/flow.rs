//! One-time interactive consent flow.
//!
//! `drivekit auth login` runs the installed-app authorization code flow with
//! PKCE: bind a loopback listener on an ephemeral port, send the user to the
//! consent screen, catch the single redirect, exchange the code, and persist
//! the resulting user token where the resolver will find it.

use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::credential::{TokenResponse, UserToken};
use super::resolver::save_token;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Page shown in the browser once the redirect lands.
const CONSENT_DONE_PAGE: &str = "<html><body><h2>drivekit: authorization complete</h2>\
<p>You can close this tab and return to the terminal.</p></body></html>";

/// An installed-app OAuth client, as downloaded from the cloud console.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    super::credential::DEFAULT_TOKEN_URI.to_string()
}

#[derive(serde::Deserialize)]
struct OAuthClientFile {
    #[serde(default)]
    installed: Option<OAuthClient>,
    #[serde(default)]
    web: Option<OAuthClient>,
}

/// Load the OAuth client definition for the consent flow.
pub fn load_oauth_client(path: &Path) -> Result<OAuthClient> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "OAuth client file {} does not exist",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
    let file: OAuthClientFile = serde_json::from_str(&contents).map_err(|e| {
        Error::Config(format!(
            "{} is not a valid OAuth client file: {}",
            path.display(),
            e
        ))
    })?;
    file.installed.or(file.web).ok_or_else(|| {
        Error::Config(format!(
            "{} has neither an \"installed\" nor a \"web\" client section",
            path.display()
        ))
    })
}

/// Run the consent flow and persist the obtained token to `token_path`.
pub async fn login(
    http: &Client,
    client: &OAuthClient,
    scopes: &[String],
    token_path: &Path,
) -> Result<UserToken> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Config(format!("failed to bind loopback listener: {}", e)))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Config(format!("failed to read listener address: {}", e)))?
        .port();
    let redirect_uri = format!("http://127.0.0.1:{}/", port);

    let state = random_token();
    let verifier = random_token();
    let challenge = code_challenge(&verifier);
    let url = authorize_url(client, scopes, &redirect_uri, &state, &challenge);

    println!("Open this URL in your browser to authorize drivekit:\n\n  {url}\n");
    println!("Waiting for the authorization redirect on {redirect_uri} ...");

    let (code, returned_state) = wait_for_redirect(&listener).await?;
    if returned_state != state {
        return Err(Error::Auth(
            "authorization redirect carried an unexpected state parameter".to_string(),
        ));
    }
    debug!("authorization code received");

    let granted = exchange_code(http, client, &code, &verifier, &redirect_uri).await?;
    if granted.refresh_token.is_none() {
        // Google only hands out a refresh token on the first consent;
        // without one the token cannot be renewed once it expires.
        info!("no refresh token granted; revoke prior access and re-consent to get one");
    }

    let token = UserToken {
        access_token: granted.access_token.clone(),
        refresh_token: granted.refresh_token.clone(),
        client_id: client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        token_uri: client.token_uri.clone(),
        expiry: Some(granted.expiry()),
        scopes: scopes.to_vec(),
    };
    save_token(token_path, &token)?;
    info!(path = %token_path.display(), "token persisted");

    Ok(token)
}

fn authorize_url(
    client: &OAuthClient,
    scopes: &[String],
    redirect_uri: &str,
    state: &str,
    challenge: &str,
) -> String {
    let scope = scopes.join(" ");
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}\
         &code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
        AUTH_ENDPOINT,
        urlencoding::encode(&client.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scope),
        urlencoding::encode(state),
        urlencoding::encode(challenge),
    )
}

/// Accept the single redirect request and pull the code and state out of it.
async fn wait_for_redirect(listener: &TcpListener) -> Result<(String, String)> {
    let (mut socket, _) = listener
        .accept()
        .await
        .map_err(|e| Error::Auth(format!("failed to accept redirect connection: {}", e)))?;

    let mut buf = vec![0u8; 8192];
    let n = socket
        .read(&mut buf)
        .await
        .map_err(|e| Error::Auth(format!("failed to read redirect request: {}", e)))?;
    let request = String::from_utf8_lossy(&buf[..n]).to_string();

    let result = parse_redirect_request(&request);

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        CONSENT_DONE_PAGE.len(),
        CONSENT_DONE_PAGE
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;

    result
}

/// Parse `GET /?code=...&state=... HTTP/1.1` into (code, state).
fn parse_redirect_request(request: &str) -> Result<(String, String)> {
    let line = request.lines().next().unwrap_or_default();
    let target = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| Error::Auth("malformed redirect request".to_string()))?;
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or_default();

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map_err(|e| Error::Auth(format!("malformed redirect parameter: {}", e)))?
            .into_owned();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => error = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(Error::Auth(format!("authorization was refused: {}", error)));
    }
    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(Error::Auth(
            "redirect request is missing the code or state parameter".to_string(),
        )),
    }
}

/// One authorization-code exchange at the token endpoint.
async fn exchange_code(
    http: &Client,
    client: &OAuthClient,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let params = [
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];

    let response = http.post(&client.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "authorization code exchange failed ({}): {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("code exchange returned invalid JSON: {}", e)))
}

/// 32 random bytes, base64url without padding. Used for both the CSRF state
/// and the PKCE verifier (43 characters, within the RFC 7636 bounds).
fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// S256 code challenge per RFC 7636.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

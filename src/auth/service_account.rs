//! Service-account token minting.
//!
//! A service-account key never talks to a consent screen: it signs an RS256
//! JWT assertion over the requested scopes and trades it for a bearer token
//! at the key's token endpoint. One exchange per invocation is enough for a
//! short-lived CLI process.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

use super::credential::{ServiceAccountKey, TokenResponse};

/// Assertion lifetime in seconds (the maximum Google accepts)
const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl AssertionClaims {
    fn new(key: &ServiceAccountKey, scopes: &[String]) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Exchange a signed assertion for an access token.
pub async fn mint_access_token(
    http: &Client,
    key: &ServiceAccountKey,
    scopes: &[String],
) -> Result<String> {
    let claims = AssertionClaims::new(key, scopes);

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| Error::Config(format!("service-account private key is not valid: {}", e)))?;
    let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| Error::Auth(format!("failed to sign token assertion: {}", e)))?;

    debug!(email = %key.client_email, "exchanging service-account assertion");

    let params = [
        ("grant_type", JWT_BEARER_GRANT),
        ("assertion", assertion.as_str()),
    ];
    let response = http.post(&key.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "service-account token exchange failed ({}): {}",
            status, body
        )));
    }

    let granted: TokenResponse = response
        .json()
        .await
        .map_err(|e| Error::Auth(format!("token exchange returned invalid JSON: {}", e)))?;

    Ok(granted.access_token)
}

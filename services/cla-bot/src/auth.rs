//! Google Service Account Authentication
//!
//! Signs an RS256 JWT assertion with the service-account key and exchanges
//! it for a short-lived OAuth access token.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClaBotError, Result};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a service-account JSON key that token exchange needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ServiceAccountKey {
    /// Load a key from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| ClaBotError::Credentials(format!("Invalid service account key: {}", e)))
    }
}

/// JWT claims for the service-account assertion
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceAccountClaims {
    /// Issuer (service account email)
    pub iss: String,
    /// Space-separated OAuth scopes
    pub scope: String,
    /// Audience (token endpoint)
    pub aud: String,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Generate a signed assertion valid for one hour
pub fn generate_jwt(key: &ServiceAccountKey, scope: &str) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ClaBotError::Credentials(format!("Failed to get current time: {}", e)))?
        .as_secs();

    let claims = ServiceAccountClaims {
        iss: key.client_email.clone(),
        scope: scope.to_string(),
        aud: key.token_uri.clone(),
        iat: now.saturating_sub(60), // 60 seconds ago to account for clock skew
        exp: now + 3600,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| ClaBotError::Credentials(format!("Failed to parse private key: {}", e)))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ClaBotError::Credentials(format!("Failed to encode JWT: {}", e)))
}

/// Response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Exchange a signed assertion for an access token
pub async fn exchange_jwt(client: &Client, token_uri: &str, jwt: &str) -> Result<AccessToken> {
    let response = client
        .post(token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt)])
        .send()
        .await
        .map_err(|e| ClaBotError::Credentials(format!("Token request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ClaBotError::Credentials(format!(
            "Token endpoint error ({}): {}",
            status, body
        )));
    }

    let token = response
        .json::<AccessToken>()
        .await
        .map_err(|e| ClaBotError::Credentials(format!("Failed to parse token response: {}", e)))?;

    debug!(expires_in = ?token.expires_in, "Obtained service account access token");
    Ok(token)
}

/// Sign and exchange in one step
pub async fn fetch_access_token(
    client: &Client,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<String> {
    let jwt = generate_jwt(key, scope)?;
    let token = exchange_jwt(client, &key.token_uri, &jwt).await?;
    Ok(token.access_token)
}

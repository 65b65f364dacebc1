use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::constants;
use crate::error::{AppError, AppResult};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    constants::GOOGLE_TOKEN_URI.to_string()
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("invalid service account JSON: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS > now
    }
}

/// Mints Firestore access tokens from a service-account key using the
/// JWT-bearer grant and caches them until shortly before expiry.
pub struct AccessTokenProvider {
    key: ServiceAccountKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        let assertion = build_assertion(&self.key, now)?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("token parsing failed: {}", e)))?;
        tracing::debug!(
            "Service account token minted for {} (expires in {}s)",
            self.key.client_email,
            token.expires_in
        );
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in,
        });
        Ok(access_token)
    }
}

fn build_claims(key: &ServiceAccountKey, now: i64) -> Claims<'_> {
    Claims {
        iss: &key.client_email,
        scope: constants::FIRESTORE_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    }
}

fn build_assertion(key: &ServiceAccountKey, now: i64) -> AppResult<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| AppError::Auth(format!("invalid service account private key: {}", e)))?;
    jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &build_claims(key, now),
        &encoding_key,
    )
    .map_err(|e| AppError::Auth(format!("failed to sign assertion: {}", e)))
}

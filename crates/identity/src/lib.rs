//! Scriptly identity adapter.
//!
//! Implements [`pipeline::IdentityVerifier`] by exchanging the browser's ID
//! token for the account it belongs to through the Identity Toolkit
//! `accounts:lookup` endpoint (the REST surface behind Firebase
//! Authentication). A token the service does not recognise, including an
//! expired one, is [`IdentityError::InvalidToken`]; anything that keeps the
//! service from answering is [`IdentityError::Unavailable`].

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{IdentityError, IdentityVerifier, UserId, VerifiedIdentity};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    /// Web API key of the project.
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl IdentityToolkitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct IdentityToolkitVerifier {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl IdentityToolkitVerifier {
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, IdentityError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1/accounts:lookup",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl IdentityVerifier for IdentityToolkitVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if id_token.trim().is_empty() {
            return Err(IdentityError::InvalidToken("empty token".into()));
        }

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            // 400 is how the service reports INVALID_ID_TOKEN, TOKEN_EXPIRED
            // and USER_NOT_FOUND. Other statuses are ours to fix, not the
            // user's.
            return Err(if status == StatusCode::BAD_REQUEST {
                IdentityError::InvalidToken(message)
            } else {
                warn!(status = status.as_u16(), %message, "identity lookup failed");
                IdentityError::Unavailable(format!("HTTP {}: {message}", status.as_u16()))
            });
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("unexpected lookup response: {e}")))?;
        let account = body
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::InvalidToken("no account for token".into()))?;
        let uid = UserId::new(account.local_id)
            .ok_or_else(|| IdentityError::InvalidToken("account without id".into()))?;

        debug!(%uid, "identity verified");
        Ok(VerifiedIdentity {
            uid,
            name: account.display_name,
            email: account.email,
            picture: account.photo_url,
        })
    }
}

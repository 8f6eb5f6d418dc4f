use std::fmt;

use serde::Deserialize;
use url::Url;

use crate::fetch::FetchSettings;
use crate::{FailureKind, PreviewError};

/// Short-lived credential authorizing a single download.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadToken(String);

impl DownloadToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DownloadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DownloadToken(<redacted>)")
    }
}

#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<DownloadToken, PreviewError>;
}

/// Hands out the same token every time. Useful for pre-issued credentials.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: DownloadToken,
}

impl StaticTokenProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: DownloadToken::new(secret),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<DownloadToken, PreviewError> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// Requests a fresh token with `POST {base_url}{token_path}`; the endpoint
/// answers `{"token": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpTokenProvider {
    client: reqwest::Client,
    url: Url,
}

impl HttpTokenProvider {
    pub fn new(settings: &FetchSettings) -> Result<Self, PreviewError> {
        let url = settings
            .base_url()?
            .join(&settings.token_path)
            .map_err(|err| PreviewError::new(FailureKind::InvalidUrl, err.to_string()))?;
        Ok(Self {
            client: settings.build_client()?,
            url,
        })
    }
}

#[async_trait::async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> Result<DownloadToken, PreviewError> {
        let response = self
            .client
            .post(self.url.clone())
            .send()
            .await
            .map_err(token_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(token_error(format!("token endpoint returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(token_transport_error)?;
        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| token_error(format!("malformed token response: {err}")))?;

        let secret = parsed.token.trim();
        if secret.is_empty() {
            return Err(token_error("token endpoint returned an empty token"));
        }
        Ok(DownloadToken::new(secret))
    }
}

fn token_transport_error(err: reqwest::Error) -> PreviewError {
    if err.is_timeout() {
        return token_error("token request timed out");
    }
    token_error(err.to_string())
}

fn token_error(detail: impl Into<String>) -> PreviewError {
    let detail = detail.into();
    PreviewError::new(
        FailureKind::Token,
        format!("Could not authorize download: {detail}"),
    )
    .with_detail(detail)
}

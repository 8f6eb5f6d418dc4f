use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use preview_logging::preview_debug;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{DownloadToken, FailureKind, PreviewError, FETCH_FAILED_MESSAGE};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub download_path: String,
    pub token_path: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            download_path: "/api/download".to_string(),
            token_path: "/api/download-token".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

impl FetchSettings {
    pub(crate) fn base_url(&self) -> Result<Url, PreviewError> {
        Url::parse(&self.base_url)
            .map_err(|err| PreviewError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, PreviewError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|err| PreviewError::new(FailureKind::Network, err.to_string()))
    }
}

/// Raw body of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(
        &self,
        encrypted_id: &str,
        token: &DownloadToken,
    ) -> Result<DownloadedContent, PreviewError>;
}

/// Builds `{base}{download_path}/{encrypted_id}?token={token}`. The id is
/// escaped as a single path segment.
pub fn download_url(
    base: &Url,
    download_path: &str,
    encrypted_id: &str,
    token: &DownloadToken,
) -> Result<Url, PreviewError> {
    let mut url = base
        .join(download_path)
        .map_err(|err| PreviewError::new(FailureKind::InvalidUrl, err.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| {
            PreviewError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
        })?
        .pop_if_empty()
        .push(encrypted_id);
    url.query_pairs_mut()
        .clear()
        .append_pair("token", token.secret());
    Ok(url)
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    client: reqwest::Client,
    base_url: Url,
    download_path: String,
    max_bytes: u64,
}

impl ReqwestDownloader {
    pub fn new(settings: &FetchSettings) -> Result<Self, PreviewError> {
        Ok(Self {
            client: settings.build_client()?,
            base_url: settings.base_url()?,
            download_path: settings.download_path.clone(),
            max_bytes: settings.max_bytes,
        })
    }

    fn too_large(&self, actual: u64) -> PreviewError {
        PreviewError::new(
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual: Some(actual),
            },
            "Image is too large to preview",
        )
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn download(
        &self,
        encrypted_id: &str,
        token: &DownloadToken,
    ) -> Result<DownloadedContent, PreviewError> {
        let url = download_url(&self.base_url, &self.download_path, encrypted_id, token)?;
        preview_debug!("Downloading preview content for {}", encrypted_id);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                PreviewError::new(FailureKind::HttpStatus(status.as_u16()), FETCH_FAILED_MESSAGE)
                    .with_detail(status.to_string()),
            );
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(self.too_large(next_len));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(DownloadedContent {
            bytes: body.freeze(),
            content_type,
        })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> PreviewError {
    if err.is_timeout() {
        return PreviewError::new(FailureKind::Timeout, "The image request timed out")
            .with_detail(err.to_string());
    }
    PreviewError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn download_url_carries_id_and_token() {
        let url = download_url(&base(), "/api/download", "abc", &DownloadToken::new("tok-123"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/download/abc?token=tok-123"
        );
    }

    #[test]
    fn download_url_escapes_id_as_one_segment() {
        let url =
            download_url(&base(), "/api/download", "a/b", &DownloadToken::new("t")).unwrap();
        assert_eq!(url.path(), "/api/download/a%2Fb");
    }

    #[test]
    fn download_url_ignores_base_path_and_query() {
        let base = Url::parse("https://files.example.com/app/?x=1").unwrap();
        let url = download_url(&base, "/api/download", "id", &DownloadToken::new("t")).unwrap();
        assert_eq!(url.as_str(), "https://files.example.com/api/download/id?token=t");
    }

    #[test]
    fn non_base_url_is_rejected() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        let err = download_url(&base, "/api/download", "id", &DownloadToken::new("t"));
        assert!(err.is_err());
    }
}

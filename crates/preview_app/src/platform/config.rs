use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use preview_engine::FetchSettings;
use preview_logging::{preview_info, preview_warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

/// Runtime settings, read from a RON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub base_url: String,
    pub token_path: String,
    pub download_path: String,
    /// Pre-issued token; when set, no token endpoint is called.
    pub static_token: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_bytes: u64,
    /// Upper bound on waiting for one preview to settle.
    pub settle_timeout_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            base_url: fetch.base_url,
            token_path: fetch.token_path,
            download_path: fetch.download_path,
            static_token: None,
            connect_timeout_ms: fetch.connect_timeout.as_millis() as u64,
            request_timeout_ms: fetch.request_timeout.as_millis() as u64,
            max_bytes: fetch.max_bytes,
            settle_timeout_ms: 60_000,
        }
    }
}

impl PreviewConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            base_url: self.base_url.clone(),
            download_path: self.download_path.clone(),
            token_path: self.token_path.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_bytes,
        }
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<PreviewConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(PreviewConfig::default());
    };

    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            preview_warn!("Config {:?} not found, using defaults", path);
            return Ok(PreviewConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    preview_info!("Loaded config from {:?}", path);
    Ok(config)
}

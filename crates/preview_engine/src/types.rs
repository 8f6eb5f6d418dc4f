use std::fmt;

use crate::DecodedImage;

pub type AttemptId = u64;

pub const NO_PREVIEW_MESSAGE: &str = "No image to preview";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch image";
pub const DECODE_FAILED_MESSAGE: &str = "Could not preview this image, try downloading the file";

/// Step of a preview attempt, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Token,
    Download,
    Decode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Validate => "validate",
            Stage::Token => "token",
            Stage::Download => "download",
            Stage::Decode => "decode",
        };
        f.write_str(label)
    }
}

/// The engine thread is no longer accepting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Preview engine is not running")]
pub struct EngineStopped;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PreviewSettled {
        attempt: AttemptId,
        result: Result<DecodedImage, PreviewError>,
    },
}

/// A failed preview attempt. `message` is what the user sees; `detail`
/// carries the underlying cause for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewError {
    pub kind: FailureKind,
    pub message: String,
    pub detail: Option<String>,
}

impl PreviewError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for PreviewError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    MissingContent,
    Token,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Cancelled,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::MissingContent => write!(f, "missing content"),
            FailureKind::Token => write!(f, "token unavailable"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "decode failure"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

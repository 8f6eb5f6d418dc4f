//! Preview engine: token acquisition, authenticated download, data-URI decoding
//! and the background runtime that executes preview effects.
mod decode;
mod diagnostics;
mod engine;
mod fetch;
mod loader;
mod persist;
mod token;
mod types;

pub use decode::{
    data_uri, DataUriEncoder, DecodeError, DecodedImage, ImageDataUriEncoder,
};
pub use diagnostics::{DiagnosticSink, LogDiagnostics};
pub use engine::EngineHandle;
pub use fetch::{download_url, DownloadedContent, Downloader, FetchSettings, ReqwestDownloader};
pub use loader::PreviewLoader;
pub use persist::{write_atomic, PersistError};
pub use token::{DownloadToken, HttpTokenProvider, StaticTokenProvider, TokenProvider};
pub use types::{
    AttemptId, EngineEvent, EngineStopped, FailureKind, PreviewError, Stage, DECODE_FAILED_MESSAGE,
    FETCH_FAILED_MESSAGE, NO_PREVIEW_MESSAGE,
};

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use preview_engine::{
    DiagnosticSink, DownloadToken, DownloadedContent, Downloader, FailureKind, FetchSettings,
    PreviewError, PreviewLoader, ReqwestDownloader, Stage, StaticTokenProvider, TokenProvider,
    DECODE_FAILED_MESSAGE, NO_PREVIEW_MESSAGE,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(5, 4))
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode png");
    buf
}

#[derive(Default)]
struct RecordingDiagnostics {
    reports: Mutex<Vec<(String, Stage, FailureKind)>>,
}

impl RecordingDiagnostics {
    fn take(&self) -> Vec<(String, Stage, FailureKind)> {
        self.reports.lock().unwrap().drain(..).collect()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, encrypted_id: &str, stage: Stage, error: &PreviewError) {
        self.reports
            .lock()
            .unwrap()
            .push((encrypted_id.to_string(), stage, error.kind.clone()));
    }
}

#[derive(Default)]
struct CountingTokens {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait::async_trait]
impl TokenProvider for CountingTokens {
    async fn fetch_token(&self) -> Result<DownloadToken, PreviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PreviewError::new(FailureKind::Token, "session expired"))
        } else {
            Ok(DownloadToken::new("tok"))
        }
    }
}

struct FixedDownloader {
    body: Vec<u8>,
    content_type: Option<String>,
    calls: AtomicUsize,
}

impl FixedDownloader {
    fn new(body: Vec<u8>, content_type: Option<&str>) -> Self {
        Self {
            body,
            content_type: content_type.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Downloader for FixedDownloader {
    async fn download(
        &self,
        _encrypted_id: &str,
        _token: &DownloadToken,
    ) -> Result<DownloadedContent, PreviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DownloadedContent {
            bytes: self.body.clone().into(),
            content_type: self.content_type.clone(),
        })
    }
}

#[tokio::test]
async fn full_flow_against_mock_endpoint_yields_data_uri() {
    preview_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download/enc-cat"))
        .and(query_param("token", "static-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png_bytes(), "image/png"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        base_url: server.uri(),
        ..FetchSettings::default()
    };
    let loader = PreviewLoader::new(
        Arc::new(StaticTokenProvider::new("static-token")),
        Arc::new(ReqwestDownloader::new(&settings).expect("client")),
    );

    let image = loader.load("enc-cat").await.expect("preview ready");
    assert_eq!(image.mime, "image/png");
    assert_eq!(image.dimensions, Some((5, 4)));
    assert!(image.data_uri.starts_with("data:image/png;base64,"));
    assert!(image.data_uri.len() > "data:image/png;base64,".len());
}

#[tokio::test]
async fn blank_id_fails_before_any_network_call() {
    let tokens = Arc::new(CountingTokens::default());
    let downloader = Arc::new(FixedDownloader::new(png_bytes(), None));
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let loader = PreviewLoader::new(tokens.clone(), downloader.clone())
        .with_diagnostics(diagnostics.clone());

    let err = loader.load("  ").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::MissingContent);
    assert_eq!(err.message, NO_PREVIEW_MESSAGE);
    assert_eq!(tokens.calls.load(Ordering::SeqCst), 0);
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        diagnostics.take(),
        vec![("  ".to_string(), Stage::Validate, FailureKind::MissingContent)]
    );
}

#[tokio::test]
async fn token_failure_surfaces_its_message_and_skips_download() {
    let tokens = Arc::new(CountingTokens {
        fail: true,
        ..CountingTokens::default()
    });
    let downloader = Arc::new(FixedDownloader::new(png_bytes(), None));
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let loader = PreviewLoader::new(tokens, downloader.clone())
        .with_diagnostics(diagnostics.clone());

    let err = loader.load("enc-1").await.unwrap_err();

    assert_eq!(err.to_string(), "session expired");
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        diagnostics.take(),
        vec![("enc-1".to_string(), Stage::Token, FailureKind::Token)]
    );
}

#[tokio::test]
async fn undecodable_body_asks_user_to_download() {
    let downloader = Arc::new(FixedDownloader::new(
        b"%PDF-1.7 not an image".to_vec(),
        Some("application/pdf"),
    ));
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let loader = PreviewLoader::new(Arc::new(CountingTokens::default()), downloader)
        .with_diagnostics(diagnostics.clone());

    let err = loader.load("enc-pdf").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
    assert_eq!(err.message, DECODE_FAILED_MESSAGE);
    assert!(err.message.contains("try downloading the file"));
    assert!(err.detail.is_some());
    assert_eq!(
        diagnostics.take(),
        vec![("enc-pdf".to_string(), Stage::Decode, FailureKind::Decode)]
    );
}

#[tokio::test]
async fn http_failure_is_attributed_to_download_stage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        base_url: server.uri(),
        ..FetchSettings::default()
    };
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let loader = PreviewLoader::new(
        Arc::new(StaticTokenProvider::new("t")),
        Arc::new(ReqwestDownloader::new(&settings).expect("client")),
    )
    .with_diagnostics(diagnostics.clone());

    let err = loader.load("enc-x").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(
        diagnostics.take(),
        vec![("enc-x".to_string(), Stage::Download, FailureKind::HttpStatus(500))]
    );
}

#[tokio::test]
async fn successful_load_reports_nothing() {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let loader = PreviewLoader::new(
        Arc::new(CountingTokens::default()),
        Arc::new(FixedDownloader::new(png_bytes(), Some("image/png"))),
    )
    .with_diagnostics(diagnostics.clone());

    loader.load("enc-ok").await.expect("preview ready");

    assert!(diagnostics.take().is_empty());
}

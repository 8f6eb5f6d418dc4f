use std::sync::Arc;

use preview_logging::preview_debug;

use crate::{
    DataUriEncoder, DecodedImage, DiagnosticSink, Downloader, FailureKind, ImageDataUriEncoder,
    LogDiagnostics, PreviewError, Stage, TokenProvider, DECODE_FAILED_MESSAGE,
    NO_PREVIEW_MESSAGE,
};

/// Runs one preview attempt: token, download, decode. Each step's failure is
/// attributed to its stage and reported to the diagnostic sink exactly once.
#[derive(Clone)]
pub struct PreviewLoader {
    tokens: Arc<dyn TokenProvider>,
    downloader: Arc<dyn Downloader>,
    encoder: Arc<dyn DataUriEncoder>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PreviewLoader {
    pub fn new(tokens: Arc<dyn TokenProvider>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            tokens,
            downloader,
            encoder: Arc::new(ImageDataUriEncoder),
            diagnostics: Arc::new(LogDiagnostics),
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn DataUriEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub async fn load(&self, encrypted_id: &str) -> Result<DecodedImage, PreviewError> {
        if encrypted_id.trim().is_empty() {
            return Err(self.fail(
                encrypted_id,
                Stage::Validate,
                PreviewError::new(FailureKind::MissingContent, NO_PREVIEW_MESSAGE),
            ));
        }

        let token = self
            .tokens
            .fetch_token()
            .await
            .map_err(|err| self.fail(encrypted_id, Stage::Token, err))?;

        let content = self
            .downloader
            .download(encrypted_id, &token)
            .await
            .map_err(|err| self.fail(encrypted_id, Stage::Download, err))?;
        preview_debug!(
            "Downloaded {} bytes for {} ({:?})",
            content.bytes.len(),
            encrypted_id,
            content.content_type
        );

        // Encoding large images is CPU-bound; keep it off the async workers.
        let encoder = self.encoder.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            encoder.encode(&content.bytes, content.content_type.as_deref())
        })
        .await;

        match decoded {
            Ok(Ok(image)) => Ok(image),
            Ok(Err(err)) => Err(self.fail(
                encrypted_id,
                Stage::Decode,
                PreviewError::new(FailureKind::Decode, DECODE_FAILED_MESSAGE)
                    .with_detail(err.to_string()),
            )),
            Err(join_err) => Err(self.fail(
                encrypted_id,
                Stage::Decode,
                PreviewError::new(FailureKind::Decode, DECODE_FAILED_MESSAGE)
                    .with_detail(join_err.to_string()),
            )),
        }
    }

    fn fail(&self, encrypted_id: &str, stage: Stage, err: PreviewError) -> PreviewError {
        self.diagnostics.report(encrypted_id, stage, &err);
        err
    }
}

use preview_logging::preview_error;

use crate::{PreviewError, Stage};

/// Receives every failed preview attempt before it reaches the UI.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, encrypted_id: &str, stage: Stage, error: &PreviewError);
}

/// Forwards failures to the global logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&self, encrypted_id: &str, stage: Stage, error: &PreviewError) {
        match &error.detail {
            Some(detail) => preview_error!(
                "Preview of {} failed at {} ({}): {} [{}]",
                encrypted_id,
                stage,
                error.kind,
                error.message,
                detail
            ),
            None => preview_error!(
                "Preview of {} failed at {} ({}): {}",
                encrypted_id,
                stage,
                error.kind,
                error.message
            ),
        }
    }
}

use crate::view_model::{PreviewView, PreviewViewModel};
use crate::FileRecord;

/// Generation tag for one fetch attempt. Only the newest attempt may settle.
pub type AttemptId = u64;

pub const NO_PREVIEW_MESSAGE: &str = "No image to preview";
pub const LOADING_TEXT: &str = "Loading image...";

/// Decoded preview ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub data_uri: String,
    pub mime: String,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Loading,
    Error(String),
    Ready(PreviewImage),
}

impl PreviewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PreviewState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    record: Option<FileRecord>,
    preview: PreviewState,
    last_attempt: AttemptId,
    current_attempt: Option<AttemptId>,
    settled_count: u32,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&FileRecord> {
        self.record.as_ref()
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.current_attempt
    }

    /// How many times the current attempt has settled. Never exceeds 1.
    pub fn settled_count(&self) -> u32 {
        self.settled_count
    }

    /// Attempt that is still waiting on the engine, if any.
    pub fn pending_attempt(&self) -> Option<AttemptId> {
        self.current_attempt.filter(|_| self.preview.is_loading())
    }

    pub fn view(&self) -> PreviewViewModel {
        let preview = match &self.preview {
            PreviewState::Loading => PreviewView::Loading {
                text: LOADING_TEXT.to_string(),
            },
            PreviewState::Error(message) => PreviewView::Error {
                message: message.clone(),
            },
            PreviewState::Ready(image) => PreviewView::Image {
                src: image.data_uri.clone(),
                alt: self
                    .record
                    .as_ref()
                    .map(|record| record.name.clone())
                    .unwrap_or_default(),
                width: image.dimensions.map(|(w, _)| w),
                height: image.dimensions.map(|(_, h)| h),
            },
        };
        PreviewViewModel {
            preview,
            loading: self.preview.is_loading(),
        }
    }

    pub(crate) fn begin_attempt(&mut self, record: FileRecord) -> AttemptId {
        let attempt = self.allocate_attempt(record);
        self.preview = PreviewState::Loading;
        attempt
    }

    /// Settles a record that cannot be fetched at all. The attempt id still
    /// advances so in-flight work for the previous record goes stale.
    pub(crate) fn reject_record(&mut self, record: FileRecord, message: &str) {
        self.allocate_attempt(record);
        self.preview = PreviewState::Error(message.to_string());
        self.settled_count = 1;
    }

    /// Applies a terminal outcome. Returns false for stale or repeated results.
    pub(crate) fn settle(&mut self, attempt: AttemptId, outcome: PreviewState) -> bool {
        if self.pending_attempt() != Some(attempt) || outcome.is_loading() {
            return false;
        }
        self.preview = outcome;
        self.settled_count += 1;
        true
    }

    fn allocate_attempt(&mut self, record: FileRecord) -> AttemptId {
        self.last_attempt += 1;
        self.current_attempt = Some(self.last_attempt);
        self.record = Some(record);
        self.settled_count = 0;
        self.last_attempt
    }
}

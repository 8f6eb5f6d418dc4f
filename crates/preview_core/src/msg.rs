#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The record to preview changed.
    RecordSelected(crate::FileRecord),
    /// User asked to fetch the current record again.
    ReloadClicked,
    /// Engine finished decoding the preview for an attempt.
    PreviewLoaded {
        attempt: crate::AttemptId,
        image: crate::PreviewImage,
    },
    /// Engine gave up on an attempt.
    PreviewFailed {
        attempt: crate::AttemptId,
        message: String,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}

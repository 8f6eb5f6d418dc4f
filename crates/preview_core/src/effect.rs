use crate::AttemptId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and decode the preview for `encrypted_id`, tagged with `attempt`.
    LoadPreview {
        attempt: AttemptId,
        encrypted_id: String,
    },
    /// A newer attempt superseded this one; its result will be ignored.
    CancelPreview { attempt: AttemptId },
}

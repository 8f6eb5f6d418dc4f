use serde::{Deserialize, Serialize};

/// File metadata handed to the preview by its caller.
///
/// The shape is validated upstream; this crate only trusts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub name: String,
    pub encrypted_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_web_content_link: Option<String>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, encrypted_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encrypted_id: encrypted_id.into(),
            encrypted_web_content_link: None,
        }
    }

    pub fn with_content_link(mut self, link: impl Into<String>) -> Self {
        self.encrypted_web_content_link = Some(link.into());
        self
    }

    /// True when the record advertises web content that can be previewed.
    pub fn has_previewable_content(&self) -> bool {
        self.encrypted_web_content_link
            .as_deref()
            .is_some_and(|link| !link.trim().is_empty())
    }
}

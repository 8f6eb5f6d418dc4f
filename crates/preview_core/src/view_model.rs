/// What the preview should display. A pure function of the preview state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewView {
    /// Spinner plus a short status line.
    Loading { text: String },
    /// Error icon plus the message, styled as destructive.
    Error { message: String },
    /// Image sourced from a data URI.
    Image {
        src: String,
        alt: String,
        width: Option<u32>,
        height: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewViewModel {
    pub preview: PreviewView,
    pub loading: bool,
}

//! Preview core: pure state machine and view-model helpers for image previews.
mod effect;
mod msg;
mod record;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use record::FileRecord;
pub use state::{AppState, AttemptId, PreviewImage, PreviewState, LOADING_TEXT, NO_PREVIEW_MESSAGE};
pub use update::update;
pub use view_model::{PreviewView, PreviewViewModel};

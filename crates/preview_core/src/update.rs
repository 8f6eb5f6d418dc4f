use crate::{AppState, Effect, FileRecord, Msg, PreviewState, NO_PREVIEW_MESSAGE};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RecordSelected(record) => {
            // The fetch runs once per record identity.
            if state.record() == Some(&record) {
                return (state, Vec::new());
            }
            start_attempt(&mut state, record)
        }
        Msg::ReloadClicked => match state.record().cloned() {
            Some(record) if !state.preview().is_loading() => start_attempt(&mut state, record),
            _ => Vec::new(),
        },
        Msg::PreviewLoaded { attempt, image } => {
            state.settle(attempt, PreviewState::Ready(image));
            Vec::new()
        }
        Msg::PreviewFailed { attempt, message } => {
            state.settle(attempt, PreviewState::Error(message));
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_attempt(state: &mut AppState, record: FileRecord) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(stale) = state.pending_attempt() {
        effects.push(Effect::CancelPreview { attempt: stale });
    }

    if !record.has_previewable_content() {
        state.reject_record(record, NO_PREVIEW_MESSAGE);
        return effects;
    }

    let encrypted_id = record.encrypted_id.clone();
    let attempt = state.begin_attempt(record);
    effects.push(Effect::LoadPreview {
        attempt,
        encrypted_id,
    });
    effects
}

use std::io;
use std::sync::Arc;
use std::time::Duration;

use preview_core::{Effect, Msg, PreviewImage};
use preview_engine::{
    DecodedImage, EngineEvent, EngineHandle, HttpTokenProvider, PreviewLoader, ReqwestDownloader,
    StaticTokenProvider, TokenProvider,
};
use preview_logging::{preview_debug, preview_info};

use super::config::PreviewConfig;

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: &PreviewConfig) -> anyhow::Result<Self> {
        let settings = config.fetch_settings();
        let tokens: Arc<dyn TokenProvider> = match &config.static_token {
            Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
            None => Arc::new(HttpTokenProvider::new(&settings)?),
        };
        let downloader = Arc::new(ReqwestDownloader::new(&settings)?);
        Ok(Self::from_loader(PreviewLoader::new(tokens, downloader))?)
    }

    pub fn from_loader(loader: PreviewLoader) -> io::Result<Self> {
        EngineHandle::new(loader).map(Self::with_engine)
    }

    pub(super) fn with_engine(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Hands effects to the engine. A load the engine cannot accept comes back
    /// as a failure message so its attempt still settles.
    pub fn enqueue(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::LoadPreview {
                    attempt,
                    encrypted_id,
                } => {
                    preview_info!("LoadPreview attempt={} id={}", attempt, encrypted_id);
                    if let Err(err) = self.engine.load(attempt, encrypted_id) {
                        follow_ups.push(Msg::PreviewFailed {
                            attempt,
                            message: err.to_string(),
                        });
                    }
                }
                Effect::CancelPreview { attempt } => {
                    preview_debug!("CancelPreview attempt={}", attempt);
                    // A stopped engine has nothing left to cancel.
                    let _ = self.engine.cancel(attempt);
                }
            }
        }
        follow_ups
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PreviewSettled { attempt, result } => match result {
            Ok(image) => Msg::PreviewLoaded {
                attempt,
                image: map_image(image),
            },
            Err(err) => Msg::PreviewFailed {
                attempt,
                message: err.message,
            },
        },
    }
}

fn map_image(image: DecodedImage) -> PreviewImage {
    PreviewImage {
        data_uri: image.data_uri,
        mime: image.mime,
        dimensions: image.dimensions,
    }
}

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Context;
use preview_core::{update, AppState, Effect, FileRecord, Msg};
use preview_engine::write_atomic;
use preview_logging::{preview_info, preview_warn};

use super::cli::Cli;
use super::config::load_config;
use super::effects::EffectRunner;
use super::records::collect_records;
use super::{logging, ui};

const SETTLE_TIMEOUT_MESSAGE: &str = "Timed out waiting for the image";

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    logging::initialize(cli.log);

    let config = load_config(cli.config.as_deref())?;
    let records = collect_records(&cli)?;
    let runner = EffectRunner::new(&config).context("failed to start preview engine")?;

    let html = preview_all(records, &runner, config.settle_timeout()).join("\n");
    match &cli.output {
        Some(path) => {
            write_atomic(path, &html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            preview_info!("Wrote preview to {:?}", path);
        }
        None => println!("{html}"),
    }
    Ok(())
}

/// Selects each record in turn and renders it once its attempt has settled.
fn preview_all(
    records: Vec<FileRecord>,
    runner: &EffectRunner,
    settle_timeout: Duration,
) -> Vec<String> {
    let mut state = AppState::new();
    let mut fragments = Vec::with_capacity(records.len());
    for record in records {
        preview_info!("Previewing {} ({})", record.name, record.encrypted_id);
        state = dispatch(state, Msg::RecordSelected(record), runner);
        state = await_settled(state, runner, settle_timeout);
        fragments.push(ui::render::render_html(&state.view()));
    }
    fragments
}

fn dispatch(mut state: AppState, msg: Msg, runner: &EffectRunner) -> AppState {
    let mut queue = VecDeque::from([msg]);
    while let Some(msg) = queue.pop_front() {
        let (next, effects) = update(state, msg);
        state = next;
        queue.extend(runner.enqueue(effects));
    }
    state
}

/// Pumps engine events into the state until the current attempt settles.
fn await_settled(mut state: AppState, runner: &EffectRunner, timeout: Duration) -> AppState {
    let deadline = Instant::now() + timeout;
    while let Some(attempt) = state.pending_attempt() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            preview_warn!(
                "Preview attempt {} did not settle within {:?}",
                attempt,
                timeout
            );
            runner.enqueue(vec![Effect::CancelPreview { attempt }]);
            return dispatch(
                state,
                Msg::PreviewFailed {
                    attempt,
                    message: SETTLE_TIMEOUT_MESSAGE.to_string(),
                },
                runner,
            );
        }
        let msg = runner.next_msg(remaining).unwrap_or(Msg::NoOp);
        state = dispatch(state, msg, runner);
    }
    state
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bytes::Bytes;
    use preview_engine::{
        DownloadToken, DownloadedContent, Downloader, EngineHandle, EngineStopped, PreviewError,
        PreviewLoader, StaticTokenProvider, TokenProvider,
    };

    use super::*;

    /// Never answers its first request; later requests get a token at once.
    #[derive(Default)]
    struct StallFirstTokens {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TokenProvider for StallFirstTokens {
        async fn fetch_token(&self) -> Result<DownloadToken, PreviewError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            Ok(DownloadToken::new("tok"))
        }
    }

    struct SvgDownloader;

    #[async_trait::async_trait]
    impl Downloader for SvgDownloader {
        async fn download(
            &self,
            _encrypted_id: &str,
            _token: &DownloadToken,
        ) -> Result<DownloadedContent, PreviewError> {
            Ok(DownloadedContent {
                bytes: Bytes::from_static(br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#),
                content_type: Some("image/svg+xml".to_string()),
            })
        }
    }

    fn record(name: &str, encrypted_id: &str) -> FileRecord {
        FileRecord::new(name, encrypted_id).with_content_link(format!("link-{encrypted_id}"))
    }

    #[test]
    fn hung_token_request_times_out_and_next_record_still_loads() {
        preview_logging::initialize_for_tests();
        let tokens = Arc::new(StallFirstTokens::default());
        let loader = PreviewLoader::new(tokens.clone(), Arc::new(SvgDownloader));
        let runner = EffectRunner::from_loader(loader).expect("engine");

        let fragments = preview_all(
            vec![record("stuck.svg", "enc-1"), record("fine.svg", "enc-2")],
            &runner,
            Duration::from_millis(300),
        );

        assert_eq!(fragments.len(), 2);
        assert!(fragments[0].contains(SETTLE_TIMEOUT_MESSAGE));
        assert!(fragments[0].contains(r#"role="alert""#));
        // The cancelled first attempt reports back while the second is
        // pending; that late result must not settle the second record.
        assert!(fragments[1].contains("data:image/svg+xml;base64,"));
        assert!(fragments[1].contains(r#"alt="fine.svg""#));
        assert_eq!(tokens.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_cancelled_event_is_ignored_by_the_next_attempt() {
        preview_logging::initialize_for_tests();
        let loader = PreviewLoader::new(
            Arc::new(StallFirstTokens::default()),
            Arc::new(SvgDownloader),
        );
        let runner = EffectRunner::from_loader(loader).expect("engine");

        let state = dispatch(
            AppState::new(),
            Msg::RecordSelected(record("a.svg", "enc-1")),
            &runner,
        );
        let state = await_settled(state, &runner, Duration::from_millis(100));
        assert_eq!(state.settled_count(), 1);
        let first = state.current_attempt().expect("first attempt");

        let state = dispatch(state, Msg::RecordSelected(record("b.svg", "enc-2")), &runner);
        let second = state.pending_attempt().expect("second attempt pending");
        assert_ne!(first, second);

        let state = dispatch(
            state,
            Msg::PreviewFailed {
                attempt: first,
                message: "Preview cancelled".to_string(),
            },
            &runner,
        );
        assert_eq!(state.pending_attempt(), Some(second));
        assert_eq!(state.settled_count(), 0);

        let state = await_settled(state, &runner, Duration::from_secs(5));
        assert_eq!(state.settled_count(), 1);
        assert!(matches!(
            state.view().preview,
            preview_core::PreviewView::Image { .. }
        ));
    }

    #[test]
    fn stopped_engine_settles_record_with_error() {
        preview_logging::initialize_for_tests();
        let loader = PreviewLoader::new(
            Arc::new(StaticTokenProvider::new("tok")),
            Arc::new(SvgDownloader),
        );
        let mut engine = EngineHandle::new(loader).expect("engine");
        engine.shutdown();
        let runner = EffectRunner::with_engine(engine);

        let started = Instant::now();
        let fragments = preview_all(
            vec![record("a.svg", "enc-1")],
            &runner,
            Duration::from_secs(30),
        );

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(fragments[0].contains(&EngineStopped.to_string()));
    }
}

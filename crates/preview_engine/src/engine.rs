use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use preview_logging::{preview_debug, preview_info, preview_warn};
use tokio_util::sync::CancellationToken;

use crate::{AttemptId, EngineEvent, EngineStopped, FailureKind, PreviewError, PreviewLoader};

enum EngineCommand {
    Load {
        attempt: AttemptId,
        encrypted_id: String,
    },
    Cancel {
        attempt: AttemptId,
    },
    Shutdown,
}

type InFlight = Arc<Mutex<HashMap<AttemptId, CancellationToken>>>;

/// Runs preview attempts on a background tokio runtime. Every `load` yields
/// exactly one `EngineEvent::PreviewSettled` for its attempt.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(loader: PreviewLoader) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let loader = Arc::new(loader);

        let worker = thread::Builder::new()
            .name("preview-engine".to_string())
            .spawn(move || {
                let in_flight: InFlight = Arc::default();
                while let Ok(command) = cmd_rx.recv() {
                    if matches!(command, EngineCommand::Shutdown) {
                        break;
                    }
                    handle_command(&runtime, &loader, &in_flight, command, &event_tx);
                }
                preview_debug!("Preview engine stopped");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        })
    }

    /// Starts an attempt. Fails when the engine thread is gone, in which case
    /// no event will ever arrive for `attempt`.
    pub fn load(
        &self,
        attempt: AttemptId,
        encrypted_id: impl Into<String>,
    ) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Load {
            attempt,
            encrypted_id: encrypted_id.into(),
        })
        .inspect_err(|_| preview_warn!("Preview engine is down; attempt {} dropped", attempt))
    }

    pub fn cancel(&self, attempt: AttemptId) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Cancel { attempt })
            .inspect_err(|_| preview_warn!("Preview engine is down; cannot cancel {}", attempt))
    }

    /// Stops the engine thread and waits for it. In-flight attempts are dropped.
    pub fn shutdown(&mut self) {
        if self.send(EngineCommand::Shutdown).is_err() {
            preview_debug!("Preview engine already stopped");
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                preview_warn!("Preview engine thread panicked");
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineStopped> {
        self.cmd_tx.send(command).map_err(|_| EngineStopped)
    }
}

fn handle_command(
    runtime: &tokio::runtime::Runtime,
    loader: &Arc<PreviewLoader>,
    in_flight: &InFlight,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Load {
            attempt,
            encrypted_id,
        } => {
            let cancel = CancellationToken::new();
            if let Ok(mut map) = in_flight.lock() {
                map.insert(attempt, cancel.clone());
            }
            let loader = loader.clone();
            let in_flight = in_flight.clone();
            let event_tx = event_tx.clone();
            runtime.spawn(async move {
                let result = tokio::select! {
                    result = loader.load(&encrypted_id) => result,
                    _ = cancel.cancelled() => Err(PreviewError::new(
                        FailureKind::Cancelled,
                        "Preview cancelled",
                    )),
                };
                if let Ok(mut map) = in_flight.lock() {
                    map.remove(&attempt);
                }
                if event_tx
                    .send(EngineEvent::PreviewSettled { attempt, result })
                    .is_err()
                {
                    preview_warn!("Preview engine handle dropped; attempt {} lost", attempt);
                }
            });
        }
        EngineCommand::Cancel { attempt } => {
            let token = in_flight.lock().ok().and_then(|mut map| map.remove(&attempt));
            if let Some(token) = token {
                preview_info!("Cancelling superseded preview attempt {}", attempt);
                token.cancel();
            }
        }
        EngineCommand::Shutdown => {}
    }
}

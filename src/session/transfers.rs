//! Transfer drivers
//!
//! Starting a download registers a task, then spawns a driver that owns the
//! transfer for its whole lifetime: it forwards backend progress into the
//! tracker, watches for cancellation, and applies exactly one terminal
//! transition when the transfer ends.
//!
//! Re-issuing a key replaces the previous transfer: the old driver is
//! cancelled and its entry superseded. Drivers carry a generation number and
//! check it before touching shared state, so a superseded driver can never
//! write into the task that replaced it.

use super::PortalSession;
use crate::error::Error;
use crate::types::{
    DownloadTask, Event, File, ProgressPayload, TaskTarget, TransferEvent, VideoPlayInfo,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress channel depth between a backend transfer and its driver.
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Registry entry for a transfer whose driver is still running.
pub(super) struct ActiveTransfer {
    pub(super) generation: u64,
    pub(super) token: CancellationToken,
}

/// How a driver's transfer ended.
enum Outcome {
    Succeeded,
    Failed(Error),
    Cancelled,
}

impl PortalSession {
    /// Start downloading a course file.
    ///
    /// The task is keyed by the file's uuid. If a transfer with that key is
    /// already active it is cancelled and replaced; the returned snapshot is
    /// the fresh task in the `Downloading` state.
    pub async fn start_file_download(self: &Arc<Self>, file: &File) -> DownloadTask {
        self.start_transfer(file.uuid.clone(), TaskTarget::File(file.clone()))
            .await
    }

    /// Start downloading a lecture video, keyed by the video's id.
    pub async fn start_video_download(self: &Arc<Self>, video: &VideoPlayInfo) -> DownloadTask {
        self.start_transfer(video.id.to_string(), TaskTarget::Video(video.clone()))
            .await
    }

    /// Request cancellation of an active transfer.
    ///
    /// Returns whether a transfer was active under `key`. Cancellation is
    /// asynchronous: the driver emits [`Event::DownloadCancelled`] once it
    /// has stopped.
    pub async fn cancel_download(&self, key: &str) -> bool {
        let active = self.active_transfers.lock().await;
        match active.get(key) {
            Some(transfer) => {
                info!(key, "Cancelling download");
                transfer.token.cancel();
                true
            }
            None => {
                debug!(key, "No active transfer to cancel");
                false
            }
        }
    }

    async fn start_transfer(self: &Arc<Self>, key: String, target: TaskTarget) -> DownloadTask {
        let generation = self.transfer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let task = {
            let mut active = self.active_transfers.lock().await;
            if let Some(old) = active.insert(
                key.clone(),
                ActiveTransfer {
                    generation,
                    token: token.clone(),
                },
            ) {
                debug!(key, "Replacing active transfer");
                old.token.cancel();
            }
            // Registering and re-keying the task under one registry critical
            // section keeps the registry and the tracker in step with each
            // other across overlapping re-issues.
            self.tracker.lock().await.begin(key.clone(), target.clone())
        };
        info!(key, name = target.name(), "Download started");
        self.emit(Event::DownloadStarted {
            key: key.clone(),
            name: target.name().to_string(),
        });

        let session = Arc::clone(self);
        tokio::spawn(session.run_transfer(key, generation, target, token));
        task
    }

    /// Drive one transfer to completion.
    async fn run_transfer(
        self: Arc<Self>,
        key: String,
        generation: u64,
        target: TaskTarget,
        token: CancellationToken,
    ) {
        let (progress_tx, mut progress_rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let backend = Arc::clone(&self.backend);
        let transfer = async move {
            match &target {
                TaskTarget::File(file) => backend.download_file(file, progress_tx).await,
                TaskTarget::Video(video) => backend.download_video(video, progress_tx).await,
            }
        };
        tokio::pin!(transfer);

        let outcome = loop {
            tokio::select! {
                () = token.cancelled() => break Outcome::Cancelled,
                Some(payload) = progress_rx.recv() => {
                    self.report_progress(&key, generation, &payload).await;
                }
                result = &mut transfer => {
                    // The backend can finish before its last reports are
                    // observed; flush them before the terminal transition.
                    while let Ok(payload) = progress_rx.try_recv() {
                        self.report_progress(&key, generation, &payload).await;
                    }
                    break match result {
                        Ok(()) => Outcome::Succeeded,
                        Err(e) => Outcome::Failed(Error::Transfer {
                            key: key.clone(),
                            reason: e.to_string(),
                        }),
                    };
                }
            }
        };

        self.finish_transfer(&key, generation, outcome).await;
    }

    async fn report_progress(&self, key: &str, generation: u64, payload: &ProgressPayload) {
        // The registry lock stays held until the tracker write lands: a
        // re-issue for this key blocks on the registry, so the generation
        // check cannot go stale between check and write.
        let active = self.active_transfers.lock().await;
        if !active
            .get(key)
            .is_some_and(|transfer| transfer.generation == generation)
        {
            debug!(key, "Dropping progress from superseded transfer");
            return;
        }
        let event = TransferEvent::Progress {
            key: key.to_string(),
            processed: payload.processed,
            total: payload.total,
        };
        let applied = self.tracker.lock().await.apply(&event).is_some();
        drop(active);
        if applied {
            self.emit(Event::DownloadProgress {
                key: key.to_string(),
                processed: payload.processed,
                total: payload.total,
            });
        }
    }

    async fn finish_transfer(&self, key: &str, generation: u64, outcome: Outcome) {
        // Same lock discipline as `report_progress`: the entry is removed
        // and the terminal transition applied under one registry critical
        // section, so a re-issue can only begin once both are done.
        let mut active = self.active_transfers.lock().await;
        match active.get(key) {
            Some(transfer) if transfer.generation == generation => {
                active.remove(key);
            }
            _ => {
                debug!(key, "Superseded transfer finished");
                return;
            }
        }

        let (event, notification) = match outcome {
            Outcome::Succeeded => {
                info!(key, "Download succeeded");
                (
                    TransferEvent::Succeeded {
                        key: key.to_string(),
                    },
                    Event::DownloadSucceeded {
                        key: key.to_string(),
                    },
                )
            }
            Outcome::Failed(error) => {
                warn!(key, %error, "Download failed");
                let error = error.to_string();
                (
                    TransferEvent::Failed {
                        key: key.to_string(),
                        error: error.clone(),
                    },
                    Event::DownloadFailed {
                        key: key.to_string(),
                        error,
                    },
                )
            }
            Outcome::Cancelled => {
                info!(key, "Download cancelled");
                (
                    TransferEvent::Failed {
                        key: key.to_string(),
                        error: "cancelled".to_string(),
                    },
                    Event::DownloadCancelled {
                        key: key.to_string(),
                    },
                )
            }
        };

        self.tracker.lock().await.apply(&event);
        drop(active);
        self.emit(notification);
    }
}

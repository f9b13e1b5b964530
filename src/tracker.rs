//! Download task bookkeeping
//!
//! The tracker owns every [`DownloadTask`] snapshot the session exposes. It
//! is a pure reducer: transfer drivers report what happened through
//! [`TransferEvent`]s, and the tracker folds them into task state. It does no
//! I/O and spawns nothing, which keeps every lifecycle rule unit-testable
//! without a backend.
//!
//! Two rules govern the fold: progress is monotonic (a regressing report is
//! dropped), and terminal states are frozen (no event moves a task out of
//! [`DownloadState::Succeed`] or [`DownloadState::Fail`]).

use crate::types::{DownloadState, DownloadTask, TaskTarget, TransferEvent};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Pure state machine for download task lifecycles.
///
/// Keys are caller-chosen identifiers, typically the file uuid or video id.
/// Re-issuing a key replaces the previous task outright, so a retry of a
/// failed download starts from a clean snapshot.
#[derive(Debug, Default)]
pub struct TaskTracker {
    tasks: HashMap<String, DownloadTask>,
}

impl TaskTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task in the `Downloading` state and return its
    /// snapshot.
    ///
    /// If a task already exists under `key` it is replaced, terminal or not.
    pub fn begin(&mut self, key: impl Into<String>, target: TaskTarget) -> DownloadTask {
        let key = key.into();
        let task = DownloadTask {
            key: key.clone(),
            target,
            processed: 0,
            total: 0,
            state: DownloadState::Downloading,
        };
        if self.tasks.insert(key.clone(), task.clone()).is_some() {
            debug!(key, "Replaced existing download task");
        }
        task
    }

    /// Fold one transfer event into task state.
    ///
    /// Returns the updated snapshot, or `None` when the event was dropped:
    /// unknown key, terminal task, or a progress report that would move
    /// `processed` backwards.
    pub fn apply(&mut self, event: &TransferEvent) -> Option<DownloadTask> {
        let key = event.key();
        let Some(task) = self.tasks.get_mut(key) else {
            debug!(key, "Dropping transfer event for unknown task");
            return None;
        };
        if task.state.is_terminal() {
            debug!(key, state = ?task.state, "Dropping transfer event for finished task");
            return None;
        }

        match event {
            TransferEvent::Progress {
                processed, total, ..
            } => {
                if *processed < task.processed {
                    warn!(
                        key,
                        reported = *processed,
                        current = task.processed,
                        "Dropping regressing progress report"
                    );
                    return None;
                }
                task.processed = *processed;
                task.total = *total;
            }
            TransferEvent::Succeeded { .. } => {
                // A transfer can finish before its last progress report is
                // observed; pin the bar to full.
                if task.total > 0 {
                    task.processed = task.total;
                }
                task.state = DownloadState::Succeed;
            }
            TransferEvent::Failed { .. } => {
                task.state = DownloadState::Fail;
            }
        }
        Some(task.clone())
    }

    /// Snapshot of a single task.
    pub fn task(&self, key: &str) -> Option<&DownloadTask> {
        self.tasks.get(key)
    }

    /// Snapshots of every tracked task, ordered by key.
    pub fn tasks(&self) -> Vec<DownloadTask> {
        let mut tasks: Vec<DownloadTask> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.key.cmp(&b.key));
        tasks
    }

    /// Number of tasks still in the `Downloading` state.
    pub fn active_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.state.is_terminal())
            .count()
    }

    /// Drop a task from the tracker, returning its final snapshot.
    pub fn remove(&mut self, key: &str) -> Option<DownloadTask> {
        self.tasks.remove(key)
    }
}

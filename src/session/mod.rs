//! Session facade
//!
//! [`PortalSession`] is the single entry point an embedding client holds. It
//! owns the backend handle, the persisted configuration, the assignment
//! aggregator, and the download task registry, and it fans state changes out
//! to subscribers over a broadcast [`Event`] channel so a UI layer can stay
//! a passive renderer of session state.

mod transfers;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests;

use crate::aggregator::{AssignmentAggregator, AssignmentBatch};
use crate::backend::PortalBackend;
use crate::config::AppConfig;
use crate::error::Result;
use crate::tracker::TaskTracker;
use crate::types::{Course, DownloadTask, Event};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info};

use self::transfers::ActiveTransfer;

/// Broadcast channel depth for session events. Slow subscribers that fall
/// further behind than this lose the oldest events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A course portal session.
///
/// Cheap to share behind an [`Arc`]; all operations take `&self`. Transfer
/// drivers spawned by the session hold their own clone of the handle and
/// outlive the call that started them, reporting back through the task
/// registry and the event channel.
pub struct PortalSession {
    backend: Arc<dyn PortalBackend>,
    config: RwLock<AppConfig>,
    config_path: PathBuf,
    aggregator: AssignmentAggregator,
    tracker: Mutex<TaskTracker>,
    active_transfers: Mutex<HashMap<String, ActiveTransfer>>,
    transfer_generation: AtomicU64,
    events: broadcast::Sender<Event>,
}

impl PortalSession {
    /// Open a session against `backend`, loading configuration from
    /// `config_path`.
    ///
    /// A missing configuration file yields defaults; a malformed one is an
    /// error so a corrupted token is never silently discarded.
    pub async fn new(
        backend: Arc<dyn PortalBackend>,
        config_path: impl Into<PathBuf>,
    ) -> Result<Arc<Self>> {
        let config_path = config_path.into();
        let config = AppConfig::load(&config_path).await?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        info!(config_path = %config_path.display(), "Opened portal session");
        Ok(Arc::new(Self {
            backend,
            config: RwLock::new(config),
            config_path,
            aggregator: AssignmentAggregator::new(),
            tracker: Mutex::new(TaskTracker::new()),
            active_transfers: Mutex::new(HashMap::new()),
            transfer_generation: AtomicU64::new(0),
            events,
        }))
    }

    /// Subscribe to session events.
    ///
    /// Each receiver sees every event emitted after the call, subject to the
    /// channel's lag policy.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// List the courses visible to the configured account.
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let courses = self.backend.list_courses().await?;
        debug!(count = courses.len(), "Listed courses");
        Ok(courses)
    }

    /// Fetch and assemble the assignments of one course.
    ///
    /// Returns `Ok(None)` when the response arrived after a newer request
    /// superseded it; an [`Event::StaleResponseDiscarded`] is emitted in
    /// that case, [`Event::AssignmentsLoaded`] otherwise.
    pub async fn course_assignments(
        &self,
        course_id: i64,
        only_unfinished: bool,
    ) -> Result<Option<AssignmentBatch>> {
        let batch = self
            .aggregator
            .course_assignments(self.backend.as_ref(), course_id, only_unfinished)
            .await?;

        match &batch {
            Some(batch) => self.emit(Event::AssignmentsLoaded {
                course_id,
                count: batch.assignments.len(),
            }),
            None => self.emit(Event::StaleResponseDiscarded { course_id }),
        }
        Ok(batch)
    }

    /// Snapshot of a single download task.
    pub async fn task(&self, key: &str) -> Option<DownloadTask> {
        self.tracker.lock().await.task(key).cloned()
    }

    /// Snapshots of every download task the session has seen, ordered by
    /// key. Terminal tasks remain listed until replaced by a re-issue.
    pub async fn tasks(&self) -> Vec<DownloadTask> {
        self.tracker.lock().await.tasks()
    }

    /// Current configuration snapshot.
    pub async fn config(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Replace the configuration and persist it.
    ///
    /// The in-memory configuration is only swapped once the file write
    /// succeeded.
    pub async fn update_config(&self, config: AppConfig) -> Result<()> {
        config.save(&self.config_path).await?;
        *self.config.write().await = config;
        info!("Updated session configuration");
        Ok(())
    }

    /// Send an event to subscribers. A send error only means nobody is
    /// listening right now.
    pub(crate) fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}

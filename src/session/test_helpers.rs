//! Scripted backend for session tests.

use crate::backend::PortalBackend;
use crate::error::{Error, Result};
use crate::types::{
    Assignment, Course, File, Folder, ProgressPayload, VideoPlayInfo,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::{Mutex, Semaphore, mpsc};

/// Per-transfer behavior for [`MockBackend::scripted`].
pub(crate) struct TransferScript {
    pub(crate) progress: Vec<(u64, u64)>,
    /// Park on the backend's `hold` gate after sending progress.
    pub(crate) hold: bool,
}

/// A [`PortalBackend`] that plays back canned data.
///
/// Transfers send the scripted progress reports, optionally park on `hold`
/// until released (or cancelled), then finish with the scripted outcome.
/// With `scripted`, each transfer consumes the next script instead, so
/// consecutive downloads can behave differently.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub(crate) courses: Vec<Course>,
    pub(crate) assignments: Vec<Assignment>,
    pub(crate) progress: Vec<ProgressPayload>,
    pub(crate) fail_with: Option<String>,
    pub(crate) hold: Option<Semaphore>,
    pub(crate) scripts: Mutex<VecDeque<TransferScript>>,
}

impl MockBackend {
    pub(crate) fn with_progress(progress: Vec<(u64, u64)>) -> Self {
        Self {
            progress: progress
                .into_iter()
                .map(|(processed, total)| ProgressPayload {
                    uuid: String::new(),
                    processed,
                    total,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn held() -> Self {
        Self {
            hold: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub(crate) fn scripted(scripts: Vec<TransferScript>) -> Self {
        Self {
            hold: Some(Semaphore::new(0)),
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }

    /// Let every held transfer through, including superseded ones that are
    /// racing a cancellation.
    pub(crate) fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1024);
        }
    }

    async fn run_transfer(&self, progress: mpsc::Sender<ProgressPayload>) -> Result<()> {
        if let Some(script) = self.scripts.lock().await.pop_front() {
            for (processed, total) in script.progress {
                let payload = ProgressPayload {
                    uuid: String::new(),
                    processed,
                    total,
                };
                if progress.send(payload).await.is_err() {
                    return Ok(());
                }
            }
            if script.hold {
                if let Some(hold) = &self.hold {
                    let _ = hold.acquire().await;
                }
            }
            return Ok(());
        }

        for payload in &self.progress {
            if progress.send(payload.clone()).await.is_err() {
                // The driver went away; mirror a real backend and stop.
                return Ok(());
            }
        }
        if let Some(hold) = &self.hold {
            let _ = hold.acquire().await;
        }
        match &self.fail_with {
            Some(reason) => Err(Error::Backend(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortalBackend for MockBackend {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        Ok(self.courses.clone())
    }

    async fn list_course_assignments(&self, _course_id: i64) -> Result<Vec<Assignment>> {
        Ok(self.assignments.clone())
    }

    async fn list_course_files(&self, _course_id: i64) -> Result<Vec<File>> {
        Ok(Vec::new())
    }

    async fn list_folders(&self, _course_id: i64) -> Result<Vec<Folder>> {
        Ok(Vec::new())
    }

    async fn list_folder_files(&self, _folder_id: i64) -> Result<Vec<File>> {
        Ok(Vec::new())
    }

    async fn download_file(
        &self,
        _file: &File,
        progress: mpsc::Sender<ProgressPayload>,
    ) -> Result<()> {
        self.run_transfer(progress).await
    }

    async fn download_video(
        &self,
        _video: &VideoPlayInfo,
        progress: mpsc::Sender<ProgressPayload>,
    ) -> Result<()> {
        self.run_transfer(progress).await
    }
}

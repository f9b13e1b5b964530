//! Backend command boundary
//!
//! The core performs no network I/O itself. Everything it needs from the
//! portal — course listings, assignment listings, file transfers — goes
//! through [`PortalBackend`]. Implementations live outside this crate (the
//! HTTP client of the desktop shell); tests script their own.

use crate::error::Result;
use crate::types::{Assignment, Course, File, Folder, ProgressPayload, VideoPlayInfo};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Command boundary to the process that actually talks to the portal.
///
/// Listing calls are plain request/response. Transfer calls are
/// request/event-stream: progress is delivered through the provided channel
/// while the call is in flight, and the terminal outcome is the return
/// value. Implementations must be cheap to share (`Send + Sync`); the
/// session wraps them in an `Arc`.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    /// List the courses the user is enrolled in
    async fn list_courses(&self) -> Result<Vec<Course>>;

    /// List all assignments of a course, including the user's submissions
    async fn list_course_assignments(&self, course_id: i64) -> Result<Vec<Assignment>>;

    /// List all files of a course
    async fn list_course_files(&self, course_id: i64) -> Result<Vec<File>>;

    /// List all folders of a course
    async fn list_folders(&self, course_id: i64) -> Result<Vec<Folder>>;

    /// List the files directly inside a folder
    async fn list_folder_files(&self, folder_id: i64) -> Result<Vec<File>>;

    /// Transfer a file to local storage.
    ///
    /// Progress is reported through `progress` while the transfer runs; a
    /// closed receiver must not abort the transfer. Returns once the
    /// transfer finished or failed.
    async fn download_file(
        &self,
        file: &File,
        progress: mpsc::Sender<ProgressPayload>,
    ) -> Result<()>;

    /// Transfer a recorded lecture video to local storage.
    ///
    /// Same contract as [`download_file`](PortalBackend::download_file).
    async fn download_video(
        &self,
        video: &VideoPlayInfo,
        progress: mpsc::Sender<ProgressPayload>,
    ) -> Result<()>;
}

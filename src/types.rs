//! Core types for portal-dl
//!
//! Wire models mirror the course portal's JSON shapes; everything else is
//! internal state for transfer tracking and the broadcast event channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course the user is enrolled in
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Course {
    /// Numeric course id
    pub id: i64,

    /// Portal-wide unique identifier
    #[serde(default)]
    pub uuid: String,

    /// Course display name
    pub name: String,

    /// Short course code (e.g., "CS2952")
    #[serde(default)]
    pub course_code: String,

    /// Enrollments of the current user in this course
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,

    /// Teaching staff
    #[serde(default)]
    pub teachers: Vec<Teacher>,

    /// Term the course belongs to
    #[serde(default)]
    pub term: Option<Term>,
}

/// Academic term
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Term {
    /// Numeric term id
    pub id: i64,

    /// Term display name
    #[serde(default)]
    pub name: String,

    /// Term start
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,

    /// Term end
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,

    /// Term workflow state as reported by the portal
    #[serde(default)]
    pub workflow_state: String,
}

/// One enrollment of the current user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrollment type string
    #[serde(rename = "type", default)]
    pub enrollment_type: String,

    /// Role name (e.g., "StudentEnrollment", "TaEnrollment")
    #[serde(default)]
    pub role: String,

    /// Role id
    #[serde(default)]
    pub role_id: i64,

    /// Enrolled user id
    #[serde(default)]
    pub user_id: i64,

    /// Enrollment state (e.g., "active")
    #[serde(default)]
    pub enrollment_state: String,
}

/// A member of the teaching staff
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Teacher {
    /// Numeric user id
    pub id: i64,

    /// Display name
    #[serde(default)]
    pub display_name: String,

    /// Avatar image URL
    #[serde(default)]
    pub avatar_image_url: String,

    /// Profile URL
    #[serde(default)]
    pub html_url: String,
}

/// A downloadable file descriptor
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct File {
    /// UI-facing row key, assigned client-side (usually the id); not
    /// guaranteed globally unique across entry variants
    #[serde(default)]
    pub key: String,

    /// Numeric file id
    pub id: i64,

    /// Portal-wide unique identifier
    #[serde(default)]
    pub uuid: String,

    /// Id of the folder containing this file
    #[serde(default)]
    pub folder_id: i64,

    /// Download URL
    pub url: String,

    /// Human-readable name; presence of this field is what classifies an
    /// entry as a file on the wire
    pub display_name: String,

    /// Whether the file is locked for the current user
    #[serde(default)]
    pub locked: bool,

    /// On-disk filename
    #[serde(default)]
    pub filename: String,

    /// Coarse mime class (e.g., "pdf", "image")
    #[serde(default)]
    pub mime_class: String,

    /// Full content type
    #[serde(rename = "content-type", default)]
    pub content_type: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,
}

/// A folder descriptor
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Folder {
    /// UI-facing row key, assigned client-side (usually the id)
    #[serde(default)]
    pub key: String,

    /// Numeric folder id
    pub id: i64,

    /// Folder name
    pub name: String,

    /// Full path of the folder ("course files/slides")
    #[serde(default)]
    pub full_name: String,

    /// Parent folder id (None for the root folder)
    #[serde(default)]
    pub parent_folder_id: Option<i64>,

    /// Whether the folder is locked for the current user
    #[serde(default)]
    pub locked: bool,

    /// Endpoint listing child folders
    #[serde(default)]
    pub folders_url: String,

    /// Endpoint listing child files
    #[serde(default)]
    pub files_url: String,

    /// Number of files directly inside
    #[serde(default)]
    pub files_count: u32,

    /// Number of folders directly inside
    #[serde(default)]
    pub folders_count: u32,
}

/// Uniform abstraction over a remote file or folder descriptor.
///
/// In memory this is an explicit tagged variant; on the wire the
/// discriminator is structural: the portal sends no tag, so deserialization
/// tries `File` first and an object is a file iff it carries `display_name`
/// (folders never do). Exactly these two shapes are supported; a new entry
/// kind needs its own discriminating field and variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// A downloadable file
    File(File),
    /// A folder
    Folder(Folder),
}

/// Classification of an [`Entry`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// The entry is a file
    File,
    /// The entry is a folder
    Folder,
}

impl Entry {
    /// Classify this entry
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) => EntryKind::File,
            Entry::Folder(_) => EntryKind::Folder,
        }
    }

    /// Uniform name accessor: `display_name` for files, `name` for folders
    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => &file.display_name,
            Entry::Folder(folder) => &folder.name,
        }
    }

    /// UI-facing row key
    pub fn key(&self) -> &str {
        match self {
            Entry::File(file) => &file.key,
            Entry::Folder(folder) => &folder.key,
        }
    }

    /// Numeric id of the underlying descriptor
    pub fn id(&self) -> i64 {
        match self {
            Entry::File(file) => file.id,
            Entry::Folder(folder) => folder.id,
        }
    }

    /// Whether the entry is locked for the current user
    pub fn locked(&self) -> bool {
        match self {
            Entry::File(file) => file.locked,
            Entry::Folder(folder) => folder.locked,
        }
    }
}

/// Submission workflow state, used for the "only unfinished" filter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    /// Work has been submitted
    Submitted,
    /// Nothing submitted yet
    #[default]
    Unsubmitted,
    /// Submission has been graded
    Graded,
    /// Any state this client does not know about
    #[serde(other)]
    Unknown,
}

/// A comment on a submission
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionComment {
    /// Numeric comment id
    pub id: i64,

    /// Comment body
    #[serde(default)]
    pub comment: String,

    /// Author user id
    #[serde(default)]
    pub author_id: i64,

    /// Author display name
    #[serde(default)]
    pub author_name: String,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The current user's submission for an assignment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Submission {
    /// UI-facing row key, assigned client-side
    #[serde(default)]
    pub key: i64,

    /// Numeric submission id
    pub id: i64,

    /// Grade string, if graded
    #[serde(default)]
    pub grade: Option<String>,

    /// When the submission was handed in
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Owning assignment id
    #[serde(default)]
    pub assignment_id: i64,

    /// Submitting user id
    #[serde(default)]
    pub user_id: i64,

    /// Whether the submission was late
    #[serde(default)]
    pub late: bool,

    /// Files attached to the submission
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Comment thread
    #[serde(default)]
    pub submission_comments: Vec<SubmissionComment>,

    /// Workflow state driving the "only unfinished" filter
    #[serde(default)]
    pub workflow_state: WorkflowState,
}

/// A file-shaped resource tied to a submission, or synthesized from a
/// description link.
///
/// Real submission attachments come from the backend fully populated.
/// Synthesized attachments carry only `url`, `display_name`, and `key` (the
/// owning assignment's id); every other field stays at its default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Attachment {
    /// UI-facing row key: attachment id for real submissions, owning
    /// assignment id for extracted description links
    #[serde(default)]
    pub key: i64,

    /// Numeric attachment id (0 for synthesized attachments)
    #[serde(default)]
    pub id: i64,

    /// Download URL
    #[serde(default)]
    pub url: String,

    /// Human-readable name (anchor text for extracted links)
    #[serde(default)]
    pub display_name: String,

    /// Portal-wide unique identifier
    #[serde(default)]
    pub uuid: String,

    /// Containing folder id
    #[serde(default)]
    pub folder_id: Option<i64>,

    /// On-disk filename
    #[serde(default)]
    pub filename: String,

    /// Full content type
    #[serde(rename = "content-type", default)]
    pub content_type: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// Whether the attachment is locked for the current user
    #[serde(default)]
    pub locked: bool,

    /// Coarse mime class
    #[serde(default)]
    pub mime_class: String,

    /// Preview endpoint, if the portal offers one
    #[serde(default)]
    pub preview_url: Option<String>,

    /// Submitting user display name
    #[serde(default)]
    pub user: Option<String>,

    /// Submitting user id
    #[serde(default)]
    pub user_id: Option<i64>,

    /// Submission timestamp, copied from the owning submission
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    /// Grade string, if graded
    #[serde(default)]
    pub grade: Option<String>,

    /// Lateness flag, copied from the owning submission
    #[serde(default)]
    pub late: bool,

    /// Comment thread
    #[serde(default)]
    pub comments: Vec<SubmissionComment>,
}

impl Attachment {
    /// Synthesize an attachment from a description hyperlink.
    ///
    /// Only `url`, `display_name`, and `key` (the owning assignment's id)
    /// are populated; all other fields stay absent.
    pub fn from_description_link(
        assignment_id: i64,
        url: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            key: assignment_id,
            url: url.into(),
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Convert into a [`File`] descriptor so the attachment can be handed to
    /// the download boundary.
    pub fn to_file(&self) -> File {
        File {
            key: self.id.to_string(),
            id: self.id,
            uuid: self.uuid.clone(),
            folder_id: self.folder_id.unwrap_or_default(),
            url: self.url.clone(),
            display_name: self.display_name.clone(),
            locked: self.locked,
            filename: self.filename.clone(),
            mime_class: self.mime_class.clone(),
            content_type: self.content_type.clone(),
            size: self.size,
        }
    }
}

/// Per-date override attached to an assignment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentOverride {
    /// Numeric override id
    pub id: i64,

    /// Owning assignment id
    #[serde(default)]
    pub assignment_id: i64,

    /// Student ids the override applies to
    #[serde(default)]
    pub student_ids: Vec<i64>,

    /// Course section the override applies to
    #[serde(default)]
    pub course_section_id: Option<i64>,

    /// Override title
    #[serde(default)]
    pub title: String,

    /// Overridden due time
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,

    /// Overridden unlock time
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,

    /// Overridden lock time
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
}

/// One effective date window for an assignment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentDate {
    /// Numeric id (absent for the base date)
    #[serde(default)]
    pub id: Option<i64>,

    /// Whether this is the assignment's base date
    #[serde(default)]
    pub base: bool,

    /// Date title
    #[serde(default)]
    pub title: String,

    /// Due time
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,

    /// Unlock time
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,

    /// Lock time
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
}

/// A course assignment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Assignment {
    /// UI-facing row key, assigned client-side (= id)
    #[serde(default)]
    pub key: i64,

    /// Numeric assignment id
    pub id: i64,

    /// Assignment name
    pub name: String,

    /// Rich-text description; rewritten by the extractor before display
    #[serde(default)]
    pub description: Option<String>,

    /// Unlock time (start of the submission window)
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,

    /// Due time
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,

    /// Lock time (end of the submission window)
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,

    /// Maximum points
    #[serde(default)]
    pub points_possible: Option<f64>,

    /// Owning course id
    #[serde(default)]
    pub course_id: i64,

    /// Portal page for the assignment
    #[serde(default)]
    pub html_url: String,

    /// Accepted submission types
    #[serde(default)]
    pub submission_types: Vec<String>,

    /// Allowed upload extensions
    #[serde(default)]
    pub allowed_extensions: Vec<String>,

    /// Whether the assignment is published
    #[serde(default)]
    pub published: bool,

    /// Whether anyone has submitted
    #[serde(default)]
    pub has_submitted_submissions: bool,

    /// The current user's submission, if any
    #[serde(default)]
    pub submission: Option<Submission>,

    /// Per-date overrides
    #[serde(default)]
    pub overrides: Vec<AssignmentOverride>,

    /// All effective date windows
    #[serde(default)]
    pub all_dates: Vec<AssignmentDate>,

    /// Grading backlog count (teacher view)
    #[serde(default)]
    pub needs_grading_count: Option<i64>,
}

/// Playback/download descriptor for one recorded lecture video
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VideoPlayInfo {
    /// UI-facing row key, assigned client-side
    #[serde(default)]
    pub key: i64,

    /// Numeric video id
    pub id: i64,

    /// Video display name
    #[serde(default)]
    pub name: String,

    /// Position within the lecture list
    #[serde(default)]
    pub index: i64,

    /// Play time in milliseconds
    #[serde(rename = "videPlayTime", default)]
    pub play_time: i64,

    /// HD stream URL
    #[serde(rename = "rtmpUrlHdv", default)]
    pub rtmp_url_hdv: String,
}

/// Progress report emitted by the backend transfer boundary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressPayload {
    /// Identifier of the resource being transferred
    pub uuid: String,

    /// Bytes transferred so far
    pub processed: u64,

    /// Total bytes expected (0 if unknown)
    pub total: u64,
}

/// Lifecycle state of a tracked transfer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    /// Transfer in flight
    #[default]
    Downloading,
    /// Transfer finished successfully (terminal)
    Succeed,
    /// Transfer failed (terminal)
    Fail,
}

impl DownloadState {
    /// Whether the state is terminal: no further progress or state change is
    /// possible once a task reaches it
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Succeed | DownloadState::Fail)
    }
}

/// The resource a download task is transferring
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum TaskTarget {
    /// A course or submission file
    File(File),
    /// A recorded lecture video
    Video(VideoPlayInfo),
}

impl TaskTarget {
    /// Display name of the targeted resource
    pub fn name(&self) -> &str {
        match self {
            TaskTarget::File(file) => &file.display_name,
            TaskTarget::Video(video) => &video.name,
        }
    }
}

/// Tracked state of one asynchronous transfer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Caller-assigned key, unique per concurrently active transfer
    pub key: String,

    /// The resource being transferred
    #[serde(flatten)]
    pub target: TaskTarget,

    /// Bytes transferred so far; non-decreasing while downloading, frozen
    /// once terminal
    pub processed: u64,

    /// Total bytes expected (0 if unknown)
    pub total: u64,

    /// Current lifecycle state
    pub state: DownloadState,
}

impl DownloadTask {
    /// Progress as a percentage (0.0 to 100.0); 0.0 while the total is
    /// unknown
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

/// Event arriving from the backend transfer boundary for one task key.
///
/// The tracker is a pure reducer folding this stream into task state.
#[derive(Clone, Debug)]
pub enum TransferEvent {
    /// Progress update; `processed` must be non-decreasing per key
    Progress {
        /// Task key
        key: String,
        /// Bytes transferred so far
        processed: u64,
        /// Total bytes expected (0 if unknown)
        total: u64,
    },
    /// The transfer finished successfully
    Succeeded {
        /// Task key
        key: String,
    },
    /// The transfer failed
    Failed {
        /// Task key
        key: String,
        /// Failure reason
        error: String,
    },
}

impl TransferEvent {
    /// Task key the event refers to
    pub fn key(&self) -> &str {
        match self {
            TransferEvent::Progress { key, .. }
            | TransferEvent::Succeeded { key }
            | TransferEvent::Failed { key, .. } => key,
        }
    }
}

/// Event emitted on the session's broadcast channel
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A transfer was registered and issued to the backend
    DownloadStarted {
        /// Task key
        key: String,
        /// Display name of the target resource
        name: String,
    },

    /// Progress update for an in-flight transfer
    DownloadProgress {
        /// Task key
        key: String,
        /// Bytes transferred so far
        processed: u64,
        /// Total bytes expected (0 if unknown)
        total: u64,
    },

    /// A transfer completed successfully
    DownloadSucceeded {
        /// Task key
        key: String,
    },

    /// A transfer failed; no automatic retry
    DownloadFailed {
        /// Task key
        key: String,
        /// Failure reason
        error: String,
    },

    /// A transfer was cancelled by the consumer
    DownloadCancelled {
        /// Task key
        key: String,
    },

    /// An assignment batch finished aggregating
    AssignmentsLoaded {
        /// Course the batch belongs to
        course_id: i64,
        /// Number of assignments in the batch after filtering
        count: usize,
    },

    /// A fetch response arrived after a newer request superseded it and was
    /// dropped
    StaleResponseDiscarded {
        /// Course the stale response was for
        course_id: i64,
    },
}

//! # portal-dl
//!
//! Backend library for course portal desktop clients: resource resolution
//! and transfer tracking for files, folders, assignments, and lecture
//! videos.
//!
//! ## Design Philosophy
//!
//! portal-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Backend-agnostic** - The portal API lives behind a trait, so the
//!   library is testable without a network
//! - **Display-ready** - Assignment descriptions come back rewritten with
//!   download links already extracted
//!
//! ## Quick Start
//!
//! ```no_run
//! use portal_dl::{PortalBackend, PortalSession};
//! use std::sync::Arc;
//!
//! async fn run(backend: Arc<dyn PortalBackend>) -> portal_dl::Result<()> {
//!     let session = PortalSession::new(backend, "config.json").await?;
//!
//!     // Subscribe to events
//!     let mut events = session.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     for course in session.list_courses().await? {
//!         if let Some(batch) = session.course_assignments(course.id, true).await? {
//!             println!("{}: {} open assignments", course.name, batch.assignments.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Course assignment aggregation
pub mod aggregator;
/// Portal backend boundary
pub mod backend;
/// Persisted application configuration
pub mod config;
/// Error types
pub mod error;
/// Description link extraction
pub mod extractor;
/// Session facade and transfer drivers
pub mod session;
/// Download task state machine
pub mod tracker;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use aggregator::{AssignmentAggregator, AssignmentBatch, LinkMap};
pub use backend::PortalBackend;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use extractor::{ExtractedLinks, extract_links};
pub use session::PortalSession;
pub use tracker::TaskTracker;
pub use types::{
    Assignment, Attachment, Course, DownloadState, DownloadTask, Entry, EntryKind, Event, File,
    Folder, ProgressPayload, Submission, TaskTarget, TransferEvent, VideoPlayInfo, WorkflowState,
};

//! Session-level tests, driving the facade against a scripted backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::PortalSession;
use super::test_helpers::{MockBackend, TransferScript};
use crate::config::AppConfig;
use crate::types::{
    Assignment, Course, DownloadState, Event, File, VideoPlayInfo, WorkflowState,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

fn config_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("config.json")
}

async fn open_session(backend: MockBackend, dir: &tempfile::TempDir) -> Arc<PortalSession> {
    PortalSession::new(Arc::new(backend), config_path(dir))
        .await
        .expect("session should open with a fresh config path")
}

async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

/// Receive events until one satisfies `pred`, returning everything seen.
async fn events_until(
    rx: &mut broadcast::Receiver<Event>,
    pred: impl Fn(&Event) -> bool,
) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = pred(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn sample_file(uuid: &str) -> File {
    File {
        uuid: uuid.to_string(),
        display_name: format!("{uuid}.pdf"),
        size: 100,
        ..File::default()
    }
}

#[tokio::test]
async fn missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(MockBackend::default(), &dir).await;

    let config = session.config().await;
    assert_eq!(config, AppConfig::default());
}

#[tokio::test]
async fn update_config_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(MockBackend::default(), &dir).await;

    let mut config = session.config().await;
    config.token = "tok-123".to_string();
    session.update_config(config).await.unwrap();

    let reloaded = AppConfig::load(&config_path(&dir)).await.unwrap();
    assert_eq!(reloaded.token, "tok-123");
}

#[tokio::test]
async fn list_courses_returns_backend_courses() {
    let backend = MockBackend {
        courses: vec![
            Course {
                id: 1,
                name: "Operating Systems".to_string(),
                ..Course::default()
            },
            Course {
                id: 2,
                name: "Compilers".to_string(),
                ..Course::default()
            },
        ],
        ..MockBackend::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;

    let courses = session.list_courses().await.unwrap();
    let ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn course_assignments_emits_loaded_event() {
    let backend = MockBackend {
        assignments: vec![
            Assignment {
                id: 1,
                ..Assignment::default()
            },
            Assignment {
                id: 2,
                submission: Some(crate::types::Submission {
                    workflow_state: WorkflowState::Unsubmitted,
                    ..crate::types::Submission::default()
                }),
                ..Assignment::default()
            },
        ],
        ..MockBackend::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    let batch = session.course_assignments(42, false).await.unwrap().unwrap();
    assert_eq!(batch.assignments.len(), 2);

    match next_event(&mut rx).await {
        Event::AssignmentsLoaded { course_id, count } => {
            assert_eq!(course_id, 42);
            assert_eq!(count, 2);
        }
        other => panic!("expected AssignmentsLoaded, got {other:?}"),
    }
}

#[tokio::test]
async fn file_download_runs_to_success() {
    let backend = MockBackend::with_progress(vec![(30, 100), (100, 100)]);
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    let task = session.start_file_download(&sample_file("f1")).await;
    assert_eq!(task.state, DownloadState::Downloading);
    assert_eq!(task.key, "f1");

    let seen = events_until(&mut rx, |e| {
        matches!(e, Event::DownloadSucceeded { key } if key == "f1")
    })
    .await;

    assert!(matches!(seen.first(), Some(Event::DownloadStarted { key, .. }) if key == "f1"));

    // Progress reports must reach subscribers in non-decreasing order.
    let offsets: Vec<u64> = seen
        .iter()
        .filter_map(|e| match e {
            Event::DownloadProgress { processed, .. } => Some(*processed),
            _ => None,
        })
        .collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    let task = session.task("f1").await.unwrap();
    assert_eq!(task.state, DownloadState::Succeed);
    assert_eq!(task.processed, 100);
    assert_eq!(task.total, 100);
}

#[tokio::test]
async fn video_download_is_keyed_by_video_id() {
    let backend = MockBackend::with_progress(vec![(10, 10)]);
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    let video = VideoPlayInfo {
        id: 77,
        name: "lecture 1".to_string(),
        ..VideoPlayInfo::default()
    };
    let task = session.start_video_download(&video).await;
    assert_eq!(task.key, "77");

    events_until(&mut rx, |e| {
        matches!(e, Event::DownloadSucceeded { key } if key == "77")
    })
    .await;
    assert_eq!(session.task("77").await.unwrap().state, DownloadState::Succeed);
}

#[tokio::test]
async fn failed_transfer_marks_the_task_failed() {
    let backend = MockBackend::failing("connection reset");
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    session.start_file_download(&sample_file("f1")).await;

    let seen = events_until(&mut rx, |e| matches!(e, Event::DownloadFailed { .. })).await;
    match seen.last().unwrap() {
        Event::DownloadFailed { key, error } => {
            assert_eq!(key, "f1");
            assert!(error.contains("connection reset"));
            assert!(
                error.contains("task f1"),
                "failure reports name the task they belong to, got {error:?}"
            );
        }
        other => panic!("expected DownloadFailed, got {other:?}"),
    }
    assert_eq!(session.task("f1").await.unwrap().state, DownloadState::Fail);
}

#[tokio::test]
async fn cancellation_stops_an_active_transfer() {
    let backend = Arc::new(MockBackend::held());
    let dir = tempfile::tempdir().unwrap();
    let session = PortalSession::new(
        Arc::clone(&backend) as Arc<dyn crate::backend::PortalBackend>,
        config_path(&dir),
    )
    .await
    .unwrap();
    let mut rx = session.subscribe();

    session.start_file_download(&sample_file("f1")).await;
    assert!(session.cancel_download("f1").await);

    events_until(&mut rx, |e| {
        matches!(e, Event::DownloadCancelled { key } if key == "f1")
    })
    .await;
    assert_eq!(session.task("f1").await.unwrap().state, DownloadState::Fail);

    // Nothing left to cancel once the driver is gone.
    assert!(!session.cancel_download("f1").await);
}

#[tokio::test]
async fn reissuing_a_download_replaces_the_previous_transfer() {
    let backend = Arc::new(MockBackend::held());
    let dir = tempfile::tempdir().unwrap();
    let session = PortalSession::new(
        Arc::clone(&backend) as Arc<dyn crate::backend::PortalBackend>,
        config_path(&dir),
    )
    .await
    .unwrap();
    let mut rx = session.subscribe();

    let file = sample_file("f1");
    session.start_file_download(&file).await;
    let replacement = session.start_file_download(&file).await;
    assert_eq!(replacement.state, DownloadState::Downloading);

    backend.release();
    let seen = events_until(&mut rx, |e| {
        matches!(e, Event::DownloadSucceeded { key } if key == "f1")
    })
    .await;

    // The superseded driver must not produce a terminal event of its own.
    let terminal_count = seen
        .iter()
        .filter(|e| {
            matches!(
                e,
                Event::DownloadSucceeded { .. }
                    | Event::DownloadFailed { .. }
                    | Event::DownloadCancelled { .. }
            )
        })
        .count();
    assert_eq!(terminal_count, 1);
    assert_eq!(session.task("f1").await.unwrap().state, DownloadState::Succeed);
}

#[tokio::test]
async fn replacement_task_accepts_progress_below_the_old_offset() {
    // First transfer gets deep into the file and parks; the replacement
    // starts over from a smaller offset.
    let backend = MockBackend::scripted(vec![
        TransferScript {
            progress: vec![(90, 100)],
            hold: true,
        },
        TransferScript {
            progress: vec![(10, 100), (100, 100)],
            hold: false,
        },
    ]);
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    let file = sample_file("f1");
    session.start_file_download(&file).await;
    events_until(&mut rx, |e| {
        matches!(e, Event::DownloadProgress { processed: 90, .. })
    })
    .await;

    session.start_file_download(&file).await;
    let seen = events_until(&mut rx, |e| {
        matches!(e, Event::DownloadSucceeded { key } if key == "f1")
    })
    .await;

    // The old transfer's offset must not leak into the fresh task: its
    // first, smaller report goes through instead of being dropped as a
    // regression.
    let offsets: Vec<u64> = seen
        .iter()
        .filter_map(|e| match e {
            Event::DownloadProgress { processed, .. } => Some(*processed),
            _ => None,
        })
        .collect();
    assert!(
        offsets.contains(&10),
        "fresh task must accept progress below the replaced transfer's offset, saw {offsets:?}"
    );

    let task = session.task("f1").await.unwrap();
    assert_eq!(task.state, DownloadState::Succeed);
    assert_eq!(task.processed, 100);
}

#[tokio::test]
async fn independent_keys_progress_independently() {
    let backend = MockBackend::with_progress(vec![(50, 50)]);
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(backend, &dir).await;
    let mut rx = session.subscribe();

    session.start_file_download(&sample_file("f1")).await;
    session.start_file_download(&sample_file("f2")).await;

    let mut remaining = vec!["f1".to_string(), "f2".to_string()];
    while !remaining.is_empty() {
        if let Event::DownloadSucceeded { key } = next_event(&mut rx).await {
            remaining.retain(|k| k != &key);
        }
    }

    let tasks = session.tasks().await;
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t.state == DownloadState::Succeed));
}

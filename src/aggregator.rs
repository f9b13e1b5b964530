//! Course assignment aggregation
//!
//! Turns a raw backend assignment list into a display-ready batch: stable UI
//! keys assigned, submission attachments tagged with their submission
//! context, description links extracted and descriptions rewritten. The
//! aggregator also guards against stale responses when the user switches
//! courses faster than fetches complete: only the most recently issued
//! request is allowed to produce a batch.

use crate::backend::PortalBackend;
use crate::error::Result;
use crate::extractor::extract_links;
use crate::types::{Assignment, Attachment, WorkflowState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Extracted attachments grouped by owning assignment id.
pub type LinkMap = HashMap<i64, Vec<Attachment>>;

/// A display-ready assignment record set for one course.
#[derive(Clone, Debug, Default)]
pub struct AssignmentBatch {
    /// Course the batch was fetched for
    pub course_id: i64,

    /// Assignments in backend order, keyed and with rewritten descriptions
    pub assignments: Vec<Assignment>,

    /// Extracted attachments per retained assignment. Every retained
    /// assignment has an entry, possibly empty.
    pub links: LinkMap,
}

/// Fetches and assembles assignment batches, discarding superseded fetches.
///
/// Each call to [`course_assignments`](Self::course_assignments) takes a
/// ticket; when the backend responds, the call checks that no newer ticket
/// has been issued in the meantime. A superseded call returns `Ok(None)` and
/// its response is dropped, so a slow fetch for a previously selected course
/// can never overwrite the batch for the current one.
#[derive(Debug, Default)]
pub struct AssignmentAggregator {
    latest_request: AtomicU64,
}

impl AssignmentAggregator {
    /// Create an aggregator with no outstanding requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the assignments of `course_id` and assemble them into a batch.
    ///
    /// With `only_unfinished` set, only assignments whose submission
    /// workflow state is unsubmitted are retained; assignments without a
    /// submission record are excluded under the filter. Filtering happens
    /// client-side after a full fetch, so toggling it never re-contacts the
    /// backend semantics-wise and re-running it is idempotent.
    ///
    /// Returns `Ok(None)` when a newer request was issued while this one was
    /// in flight. A backend failure aborts the whole batch; a malformed
    /// individual description does not, it degrades to no links for that
    /// assignment alone.
    pub async fn course_assignments(
        &self,
        backend: &dyn PortalBackend,
        course_id: i64,
        only_unfinished: bool,
    ) -> Result<Option<AssignmentBatch>> {
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(course_id, ticket, only_unfinished, "Fetching course assignments");

        let assignments = backend.list_course_assignments(course_id).await?;

        if self.latest_request.load(Ordering::SeqCst) != ticket {
            debug!(course_id, ticket, "Discarding stale assignment response");
            return Ok(None);
        }

        let batch = assemble(course_id, only_unfinished, assignments);
        info!(
            course_id,
            assignments = batch.assignments.len(),
            linked_files = batch.links.values().map(Vec::len).sum::<usize>(),
            "Assembled assignment batch"
        );
        Ok(Some(batch))
    }
}

/// Pure assembly step: filter, key, extract, tag.
fn assemble(
    course_id: i64,
    only_unfinished: bool,
    mut assignments: Vec<Assignment>,
) -> AssignmentBatch {
    if only_unfinished {
        assignments.retain(|assignment| {
            assignment
                .submission
                .as_ref()
                .is_some_and(|s| s.workflow_state == WorkflowState::Unsubmitted)
        });
    }

    let mut links = LinkMap::new();
    for assignment in &mut assignments {
        assignment.key = assignment.id;

        // Every retained assignment owns a link-map entry, even an empty
        // one, so consumers can index by assignment id unconditionally.
        let extracted = extract_links(assignment.id, assignment.description.as_deref());
        links
            .entry(assignment.id)
            .or_default()
            .extend(extracted.attachments);
        if assignment.description.is_some() {
            assignment.description = Some(extracted.description);
        }

        if let Some(submission) = assignment.submission.as_mut() {
            let submitted_at = submission.submitted_at;
            let late = submission.late;
            for attachment in &mut submission.attachments {
                attachment.key = attachment.id;
                attachment.submitted_at = submitted_at;
                attachment.late = late;
            }
        }
    }

    AssignmentBatch {
        course_id,
        assignments,
        links,
    }
}

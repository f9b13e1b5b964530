//! Description link extraction
//!
//! Assignment descriptions arrive as server-supplied rich text. Instructors
//! routinely link course files from them instead of attaching them, so the
//! description is the only place those resources are addressable. This module
//! scans the markup for anchors pointing at the portal's file-download
//! endpoint, synthesizes an [`Attachment`] per match, and rewrites every
//! anchor to navigate externally so the embedding webview never follows links
//! in-app.
//!
//! The rewriter is streaming and tolerant: malformed markup never fails the
//! caller, and untouched content is preserved byte for byte.

use crate::types::Attachment;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use regex::Regex;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;
use url::Url;

/// URL path of the portal's file-download endpoint; both ids are numeric.
const DOWNLOAD_PATH_PATTERN: &str = r"^/courses/\d+/files/\d+/download$";

/// Result of one extraction run over a single assignment description
#[derive(Clone, Debug, Default)]
pub struct ExtractedLinks {
    /// Attachments synthesized from matching anchors, in document order
    pub attachments: Vec<Attachment>,

    /// The description with every anchor retargeted for external navigation
    pub description: String,
}

/// Extract downloadable links from an assignment description and rewrite it
/// for display.
///
/// Every anchor, matching or not, gets `target="_blank"`. An anchor whose
/// href resolves to the portal's file-download endpoint additionally yields a
/// synthesized attachment keyed by `assignment_id`, with the anchor's visible
/// text as display name. Duplicate anchors to the same file each yield their
/// own attachment.
///
/// This is a pure function of its inputs: re-invoking it on a re-filter
/// produces the same output. An absent or empty description yields an empty
/// extraction; a description the rewriter cannot process degrades to "no
/// links extracted" with the original text passed through.
pub fn extract_links(assignment_id: i64, description: Option<&str>) -> ExtractedLinks {
    let raw = description.unwrap_or_default();
    if raw.is_empty() {
        return ExtractedLinks::default();
    }

    match rewrite_description(assignment_id, raw) {
        Ok(extracted) => extracted,
        Err(e) => {
            tracing::debug!(
                assignment_id,
                error = %e,
                "Description rewrite failed, passing original text through"
            );
            ExtractedLinks {
                attachments: Vec::new(),
                description: raw.to_string(),
            }
        }
    }
}

/// An anchor currently being scanned: its matched href and the visible text
/// accumulated so far. Anchors cannot nest, so one slot is enough.
#[derive(Default)]
struct ScanState {
    pending: Option<PendingLink>,
    attachments: Vec<Attachment>,
}

struct PendingLink {
    url: String,
    text: String,
}

impl ScanState {
    /// Close out the anchor being scanned, if any, turning it into an
    /// attachment.
    fn finish_pending(&mut self, assignment_id: i64) {
        if let Some(link) = self.pending.take() {
            self.attachments
                .push(Attachment::from_description_link(assignment_id, link.url, link.text));
        }
    }
}

fn rewrite_description(
    assignment_id: i64,
    raw: &str,
) -> Result<ExtractedLinks, lol_html::errors::RewritingError> {
    let state = Rc::new(RefCell::new(ScanState::default()));
    let element_state = Rc::clone(&state);
    let text_state = Rc::clone(&state);

    let description = rewrite_str(
        raw,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("a", move |el| {
                    let mut state = element_state.borrow_mut();
                    // Handlers fire in document order, so the previous anchor
                    // is fully scanned by the time the next one starts.
                    state.finish_pending(assignment_id);

                    let href = el.get_attribute("href");
                    el.set_attribute("target", "_blank")?;

                    state.pending = href
                        .filter(|href| is_download_link(href))
                        .map(|url| PendingLink {
                            url,
                            text: String::new(),
                        });
                    Ok(())
                }),
                text!("a", move |chunk| {
                    if let Some(pending) = text_state.borrow_mut().pending.as_mut() {
                        pending.text.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    let mut state = state.borrow_mut();
    state.finish_pending(assignment_id);

    Ok(ExtractedLinks {
        attachments: std::mem::take(&mut state.attachments),
        description,
    })
}

/// Whether an href points at the portal's file-download endpoint.
///
/// Relative or unparseable hrefs never match; they are still retargeted.
fn is_download_link(href: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    download_path_regex().is_some_and(|re| re.is_match(url.path()))
}

fn download_path_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(DOWNLOAD_PATH_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(error = %e, "Invalid download path pattern");
                None
            }
        })
        .as_ref()
}

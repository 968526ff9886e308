// Annotation lifecycle: every state transition is a full re-serialization
// spliced over the old span, never a field mutation.
//
// Each operation is a pure function `(document_text, target, …) → outcome`.
// No span state survives between calls; position is reacquired by parsing
// the current text first. A target that has vanished (stale anchor, raced
// cancellation, concurrent edit) is a `Splice::NoOp`, never an error — the
// document may always have changed under an in-flight external call.

use chrono::Utc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::codec;
use crate::locator;
use crate::types::{
    Annotation, AnnotationKind, Decision, DecisionEvent, PendingKey, Priority, Span,
};

/// Outcome of a lifecycle operation: a replacement document text, or
/// nothing to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splice {
    Applied(String),
    NoOp,
}

impl Splice {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    pub fn applied(&self) -> Option<&str> {
        match self {
            Self::Applied(text) => Some(text),
            Self::NoOp => None,
        }
    }
}

/// Invariant violations the caller must correct; distinct from the benign
/// `Splice::NoOp` staleness outcomes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("selection already contains annotation markup")]
    NestedAnnotation,
    #[error("anchor text is empty")]
    EmptyAnchor,
    #[error("selection {selection} out of range (max {max})")]
    SelectionOutOfRange { selection: usize, max: usize },
}

/// Parameters for wrapping a selection in a Todo/Note/Fix annotation.
#[derive(Debug, Clone, Default)]
pub struct WrapFields {
    pub author: Option<String>,
    pub priority: Option<Priority>,
    pub comment: Option<String>,
}

/// Outcome of `accept_proposal`/`reject_proposal`: the splice plus the
/// decision event for the external discussion log.
#[derive(Debug, Clone, PartialEq)]
pub enum Decided {
    Applied { new_text: String, event: DecisionEvent },
    NoOp,
}

/// Outcome of `begin_ai_request`: the splice plus the content-based key
/// the transport hands back on completion.
#[derive(Debug, Clone, PartialEq)]
pub enum AiRequest {
    Started { new_text: String, key: PendingKey },
    NoOp,
}

// ── Todo / Note / Fix ───────────────────────────────────────────────

/// Wrap the first occurrence of `anchor` in an annotation of `kind`.
///
/// Refuses to wrap text that already contains `[!` markup (nesting is
/// disallowed); no-ops if the anchor is not present.
pub fn wrap(
    document: &str,
    kind: AnnotationKind,
    anchor: &str,
    fields: WrapFields,
) -> Result<Splice, LifecycleError> {
    let mut annotation = new_wrapping(kind, anchor)?;
    annotation.author = fields.author;
    annotation.priority = fields.priority;
    annotation.comment = fields.comment;
    Ok(splice_first(document, anchor, &codec::serialize(&annotation)))
}

/// Re-serialize `old` with a new priority and/or comment.
///
/// No-op when `old` is no longer found in the document (the anchor text
/// may have been edited since it was read). `None` leaves a field
/// unchanged; an empty comment clears it. The rewrite always lands in the
/// canonical grammar, upgrading legacy records on first edit.
pub fn edit(
    document: &str,
    old: &Annotation,
    new_priority: Option<Priority>,
    new_comment: Option<String>,
) -> Splice {
    let Some(current) = reacquire(document, old) else {
        return stale(old);
    };
    let mut updated = current.clone();
    updated.format = crate::types::SyntaxFormat::Current;
    if let Some(priority) = new_priority {
        updated.priority = Some(priority);
    }
    if let Some(comment) = new_comment {
        updated.comment = (!comment.is_empty()).then_some(comment);
    }
    Splice::Applied(replace_span(document, current.span, &codec::serialize(&updated)))
}

/// Remove the annotation, restoring its anchored original text.
///
/// Exact-position replacement first; if the record is gone (anchor
/// shifted), falls back to any annotation matching on kind + text.
pub fn delete(document: &str, target: &Annotation) -> Splice {
    let found = reacquire(document, target).or_else(|| {
        codec::parse(document)
            .into_iter()
            .find(|a| a.kind == target.kind && a.text == target.text)
    });
    match found {
        Some(current) => Splice::Applied(replace_span(document, current.span, &current.text)),
        None => stale(target),
    }
}

// ── AI-assisted rewrites ────────────────────────────────────────────

/// Insert a `priority = pending` note wrapping the first occurrence of
/// `anchor`, and return the content-based key the AI transport echoes back.
pub fn begin_ai_request(
    document: &str,
    doc_id: Uuid,
    anchor: &str,
) -> Result<AiRequest, LifecycleError> {
    let mut annotation = new_wrapping(AnnotationKind::Note, anchor)?;
    annotation.priority = Some(Priority::Pending);
    match splice_first(document, anchor, &codec::serialize(&annotation)) {
        Splice::Applied(new_text) => Ok(AiRequest::Started {
            new_text,
            key: PendingKey { doc_id, anchor: anchor.to_string() },
        }),
        Splice::NoOp => Ok(AiRequest::NoOp),
    }
}

/// Apply a completed AI response to the still-pending annotation.
///
/// The pending marker is located by its literal serialized form; if it is
/// gone (cancelled, confirmed, or the anchor changed), the response is
/// silently discarded — at-most-once application by construction. An empty
/// candidate list is treated as a failed request: the span collapses back
/// to the original text.
pub fn resolve_ai_request(document: &str, key: &PendingKey, candidates: &[String]) -> Splice {
    let mut pending = Annotation::new(AnnotationKind::Note, key.anchor.clone());
    pending.priority = Some(Priority::Pending);
    let literal = codec::serialize(&pending);

    let Some(found) = locator::find_by_literal(document, &literal) else {
        warn!(doc_id = %key.doc_id, "pending AI annotation no longer present; dropping response");
        return Splice::NoOp;
    };
    if candidates.is_empty() {
        return Splice::Applied(replace_span(document, found.span, &key.anchor));
    }

    let mut resolved = found.clone();
    resolved.priority = Some(Priority::Resolved);
    resolved.alternatives = candidates.to_vec();
    resolved.selection = 0;
    Splice::Applied(replace_span(document, found.span, &codec::serialize(&resolved)))
}

/// Rewrite the selection of the resolved AI annotation anchored at
/// `anchor`. `0` re-activates the original text; `n` activates
/// `alternatives[n - 1]`.
pub fn cycle_ai_selection(
    document: &str,
    anchor: &str,
    new_selection: usize,
) -> Result<Splice, LifecycleError> {
    let Some(found) = find_resolved(document, anchor) else {
        return Ok(Splice::NoOp);
    };
    if new_selection > found.alternatives.len() {
        return Err(LifecycleError::SelectionOutOfRange {
            selection: new_selection,
            max: found.alternatives.len(),
        });
    }
    let mut updated = found.clone();
    updated.selection = new_selection;
    Ok(Splice::Applied(replace_span(document, found.span, &codec::serialize(&updated))))
}

/// Replace the span with the currently active text (original or chosen
/// alternative), removing the annotation.
pub fn confirm_ai(document: &str, anchor: &str) -> Splice {
    match find_resolved(document, anchor) {
        Some(found) => Splice::Applied(replace_span(document, found.span, found.active_text())),
        None => Splice::NoOp,
    }
}

/// Replace the span with the original text, discarding any resolution.
/// Also the cleanup path for failed requests.
pub fn cancel_ai(document: &str, anchor: &str) -> Splice {
    let found = codec::parse(document)
        .into_iter()
        .find(|a| (a.is_pending() || a.is_resolved()) && a.text == anchor);
    match found {
        Some(found) => Splice::Applied(replace_span(document, found.span, &found.text)),
        None => Splice::NoOp,
    }
}

// ── Proposals ───────────────────────────────────────────────────────

/// Wrap the first occurrence of `anchor` in a proposal carrying
/// `proposed` as its replacement text, original active (`selection = 0`).
pub fn propose(
    document: &str,
    anchor: &str,
    proposed: &str,
    author: Option<String>,
) -> Result<Splice, LifecycleError> {
    if proposed.contains("[!") {
        return Err(LifecycleError::NestedAnnotation);
    }
    let mut annotation = new_wrapping(AnnotationKind::Proposal, anchor)?;
    annotation.author = author;
    annotation.proposed = Some(proposed.to_string());
    Ok(splice_first(document, anchor, &codec::serialize(&annotation)))
}

/// Toggle which side of the proposal is active: 0 = original, 1 = proposed.
pub fn cycle_proposal_selection(
    document: &str,
    anchor: &str,
    new_selection: usize,
) -> Result<Splice, LifecycleError> {
    if new_selection > 1 {
        return Err(LifecycleError::SelectionOutOfRange { selection: new_selection, max: 1 });
    }
    let Some(found) = find_proposal(document, anchor) else {
        return Ok(Splice::NoOp);
    };
    let mut updated = found.clone();
    updated.selection = new_selection;
    Ok(Splice::Applied(replace_span(document, found.span, &codec::serialize(&updated))))
}

/// Accept the proposal: the span collapses to the proposed text and a
/// decision event is emitted for the discussion log. The decision is never
/// re-encoded into the document.
pub fn accept_proposal(document: &str, anchor: &str, decided_by: &str) -> Decided {
    decide_proposal(document, anchor, decided_by, Decision::Accepted)
}

/// Reject the proposal: the span collapses back to the original text.
pub fn reject_proposal(document: &str, anchor: &str, decided_by: &str) -> Decided {
    decide_proposal(document, anchor, decided_by, Decision::Rejected)
}

fn decide_proposal(document: &str, anchor: &str, decided_by: &str, decision: Decision) -> Decided {
    let Some(found) = find_proposal(document, anchor) else {
        warn!(anchor, "proposal no longer present; decision dropped");
        return Decided::NoOp;
    };
    let replacement = match decision {
        Decision::Accepted => found.proposed.clone().unwrap_or_else(|| found.text.clone()),
        Decision::Rejected => found.text.clone(),
    };
    Decided::Applied {
        new_text: replace_span(document, found.span, &replacement),
        event: DecisionEvent {
            decision,
            decided_by: decided_by.to_string(),
            decided_at: Utc::now(),
        },
    }
}

// ── Shared plumbing ─────────────────────────────────────────────────

fn new_wrapping(kind: AnnotationKind, anchor: &str) -> Result<Annotation, LifecycleError> {
    if anchor.trim().is_empty() {
        return Err(LifecycleError::EmptyAnchor);
    }
    if anchor.contains("[!") {
        return Err(LifecycleError::NestedAnnotation);
    }
    Ok(Annotation::new(kind, anchor))
}

/// Replace the first occurrence of `anchor` with `replacement`, but only
/// when the occurrence is not already inside an existing annotation span.
fn splice_first(document: &str, anchor: &str, replacement: &str) -> Splice {
    let spans: Vec<Span> = codec::parse(document).iter().map(|a| a.span).collect();
    let mut from = 0usize;
    while let Some(found) = document[from..].find(anchor) {
        let start = from + found;
        if !spans.iter().any(|s| s.contains(start)) {
            return Splice::Applied(replace_span(
                document,
                Span::new(start, start + anchor.len()),
                replacement,
            ));
        }
        // Step over one whole character; the anchor may start multi-byte.
        from = start + document[start..].chars().next().map_or(1, char::len_utf8);
    }
    Splice::NoOp
}

/// The engine's sole mutation primitive: replace an exact substring.
fn replace_span(document: &str, span: Span, replacement: &str) -> String {
    let mut out = String::with_capacity(document.len() - span.len() + replacement.len());
    out.push_str(&document[..span.start]);
    out.push_str(replacement);
    out.push_str(&document[span.end..]);
    out
}

/// Find the same record (ignoring its stale span) in the current text.
fn reacquire(document: &str, target: &Annotation) -> Option<Annotation> {
    codec::parse(document).into_iter().find(|a| a.same_record(target))
}

fn find_resolved(document: &str, anchor: &str) -> Option<Annotation> {
    codec::parse(document).into_iter().find(|a| a.is_resolved() && a.text == anchor)
}

fn find_proposal(document: &str, anchor: &str) -> Option<Annotation> {
    codec::parse(document)
        .into_iter()
        .find(|a| a.kind == AnnotationKind::Proposal && a.text == anchor)
}

fn stale(target: &Annotation) -> Splice {
    warn!(text = %target.text, "annotation no longer present; nothing to splice");
    Splice::NoOp
}

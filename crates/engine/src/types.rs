// Core domain types shared across the redline crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of annotation kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Todo,
    Note,
    Fix,
    Proposal,
}

impl AnnotationKind {
    /// Uppercase surface tag as it appears in the document text.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::Note => "NOTE",
            Self::Fix => "FIX",
            Self::Proposal => "PROPOSAL",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "TODO" => Some(Self::Todo),
            "NOTE" => Some(Self::Note),
            "FIX" => Some(Self::Fix),
            "PROPOSAL" => Some(Self::Proposal),
            _ => None,
        }
    }
}

/// `[start, end)` byte range of one annotation's full bracketed markup
/// within the document text it was parsed from.
///
/// Ephemeral by contract: a span is only valid until the next edit and
/// must never be held across one. Every operation reacquires spans by
/// re-parsing the current text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Which surface grammar an annotation was read from.
///
/// `serialize` always emits `Current`; `Legacy` exists only so parse
/// results carry an explicit format discriminant instead of losing the
/// distinction (read-compatibility without write-ambiguity).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxFormat {
    Current,
    Legacy,
}

/// Priority of a Todo/Note/Fix annotation.
///
/// `Pending` and `Resolved` are reserved workflow tags for AI-assisted
/// annotations and are mutually exclusive with numeric/label priorities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// An AI request wrapping this annotation is in flight.
    Pending,
    /// The AI request completed; `alternatives` holds the candidates.
    Resolved,
    Number(f64),
    Label(String),
}

/// Outcome of a proposal decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
}

/// One inline annotation, re-derived from the document text on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// Byte range of the full `[!...]` markup in the text it was parsed from.
    pub span: Span,
    pub format: SyntaxFormat,
    /// The anchored original text the annotation wraps. Non-empty after trim.
    pub text: String,
    pub author: Option<String>,
    pub priority: Option<Priority>,
    pub comment: Option<String>,
    /// AI candidate rewrites, order-significant. Only meaningful when
    /// `priority` is `Resolved`.
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Active-text index: 0 = original text; for AI annotations `n` picks
    /// `alternatives[n - 1]`; for proposals 1 picks `proposed`.
    #[serde(default)]
    pub selection: usize,
    /// Proposal replacement text.
    pub proposed: Option<String>,
    pub decision: Option<Decision>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl Annotation {
    /// A minimal record of the given kind wrapping `text`; callers fill in
    /// the optional fields they need.
    pub fn new(kind: AnnotationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            span: Span::default(),
            format: SyntaxFormat::Current,
            text: text.into(),
            author: None,
            priority: None,
            comment: None,
            alternatives: Vec::new(),
            selection: 0,
            proposed: None,
            decision: None,
            decided_by: None,
            decided_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.priority, Some(Priority::Pending))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.priority, Some(Priority::Resolved))
    }

    /// The text currently active for display and eventual confirmation:
    /// the original text, the chosen alternative, or the proposed text.
    pub fn active_text(&self) -> &str {
        if self.selection == 0 {
            return &self.text;
        }
        if self.kind == AnnotationKind::Proposal {
            return self.proposed.as_deref().unwrap_or(&self.text);
        }
        self.alternatives.get(self.selection - 1).map(String::as_str).unwrap_or(&self.text)
    }

    /// Field-wise equality ignoring the ephemeral span.
    pub fn same_record(&self, other: &Annotation) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.span = Span::default();
        b.span = Span::default();
        a == b
    }
}

/// Correlation key for an in-flight AI request.
///
/// Content-based: the literal anchored text plus the owning document id.
/// No stronger identity exists, so two pending requests wrapping identical
/// text in the same document are indistinguishable; resolution applies to
/// the first textual match. Known limitation, kept deliberately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingKey {
    pub doc_id: Uuid,
    pub anchor: String,
}

/// Side-channel record emitted when a proposal is accepted or rejected.
///
/// Reported to the caller for the external discussion log; never
/// re-encoded into the document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionEvent {
    pub decision: Decision,
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_round_trip() {
        for kind in
            [AnnotationKind::Todo, AnnotationKind::Note, AnnotationKind::Fix, AnnotationKind::Proposal]
        {
            assert_eq!(AnnotationKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(AnnotationKind::from_tag("WARN"), None);
    }

    #[test]
    fn span_contains_is_start_inclusive_end_exclusive() {
        let span = Span::new(3, 7);
        assert!(!span.contains(2));
        assert!(span.contains(3));
        assert!(span.contains(6));
        assert!(!span.contains(7));
    }

    #[test]
    fn active_text_follows_selection() {
        let mut a = Annotation::new(AnnotationKind::Note, "original");
        a.priority = Some(Priority::Resolved);
        a.alternatives = vec!["first".into(), "second".into()];
        assert_eq!(a.active_text(), "original");
        a.selection = 2;
        assert_eq!(a.active_text(), "second");

        let mut p = Annotation::new(AnnotationKind::Proposal, "old");
        p.proposed = Some("new".into());
        assert_eq!(p.active_text(), "old");
        p.selection = 1;
        assert_eq!(p.active_text(), "new");
    }

    #[test]
    fn same_record_ignores_span() {
        let mut a = Annotation::new(AnnotationKind::Todo, "x");
        let mut b = a.clone();
        a.span = Span::new(10, 20);
        b.span = Span::new(90, 100);
        assert!(a.same_record(&b));
        b.comment = Some("changed".into());
        assert!(!a.same_record(&b));
    }
}

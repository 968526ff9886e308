// Visibility projection: which parts of an annotation's span are shown.
//
// Raw-markup mode styles the whole span. Reading mode hides the markup
// scaffolding and exposes only the currently active text, located by a
// single forward scan over the span (key name, then escape-aware quoted
// string) — cheap enough to run per keystroke without a structural parse.
// Multi-line active text cannot be shown inline (single-line replacement
// restriction in some layouts), so it degrades to hiding the whole span
// and handing the caller the text to render out-of-line.

use std::ops::Range;

use serde::Serialize;

use crate::codec::payload;
use crate::types::{Annotation, AnnotationKind, Span, SyntaxFormat};

/// Style key the UI maps to a decoration, derived from kind and
/// resolution state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarkupStyle {
    Todo,
    Note,
    Fix,
    Proposal,
    /// AI or proposal annotation with a non-original selection active.
    Resolved,
}

/// How one annotation's span should be rendered.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Projection {
    /// Raw-markup mode: the entire span is one styled region.
    Markup { span: Span, style: MarkupStyle },
    /// Reading mode: hide the scaffolding, keep the active text inline.
    Inline { hidden_before: Span, visible: Span, hidden_after: Span },
    /// Reading mode, active text not inline-safe: hide the whole span and
    /// render `active_text` as a separate out-of-line block.
    Block { hidden: Span, active_text: String },
}

/// Project one annotation for rendering. `show_markup` is threaded in by
/// the caller; render mode is never global state.
pub fn project(document: &str, annotation: &Annotation, show_markup: bool) -> Projection {
    if show_markup {
        return Projection::Markup { span: annotation.span, style: style_for(annotation) };
    }

    let active = annotation.active_text();
    if active.contains('\n') {
        return Projection::Block { hidden: annotation.span, active_text: active.to_string() };
    }

    let span_text = &document[annotation.span.start..annotation.span.end];
    match active_range(span_text, annotation) {
        // Only usable when the raw slice equals the active text; an
        // escaped form differs and must render out-of-line instead.
        Some(range) if &span_text[range.clone()] == active => Projection::Inline {
            hidden_before: Span::new(annotation.span.start, annotation.span.start + range.start),
            visible: Span::new(
                annotation.span.start + range.start,
                annotation.span.start + range.end,
            ),
            hidden_after: Span::new(annotation.span.start + range.end, annotation.span.end),
        },
        _ => Projection::Block { hidden: annotation.span, active_text: active.to_string() },
    }
}

fn style_for(annotation: &Annotation) -> MarkupStyle {
    if annotation.selection > 0 {
        return MarkupStyle::Resolved;
    }
    match annotation.kind {
        AnnotationKind::Todo => MarkupStyle::Todo,
        AnnotationKind::Note => MarkupStyle::Note,
        AnnotationKind::Fix => MarkupStyle::Fix,
        AnnotationKind::Proposal => MarkupStyle::Proposal,
    }
}

/// Byte range of the active text within `span_text`, found by one forward
/// scan. `None` falls back to block rendering.
fn active_range(span_text: &str, annotation: &Annotation) -> Option<Range<usize>> {
    if annotation.format == SyntaxFormat::Current || annotation.selection > 0 {
        let (key, skip) = match (annotation.kind, annotation.selection) {
            (_, 0) => ("text", 0),
            (AnnotationKind::Proposal, _) => ("proposed", 0),
            (_, n) => ("alts", n - 1),
        };
        return scan_for_key(span_text, key, skip);
    }

    // Legacy original text is unquoted; it sits verbatim after the header.
    let header_end = legacy_header_end(span_text)?;
    let start = header_end + span_text[header_end..].find(&annotation.text)?;
    Some(start..start + annotation.text.len())
}

/// Find `:key`, then the inner range of the following quoted string (or of
/// the `skip`-th string inside the following vector). Quoted strings along
/// the way are skipped wholesale so a key name inside a value never
/// matches.
fn scan_for_key(span_text: &str, key: &str, skip: usize) -> Option<Range<usize>> {
    let bytes = span_text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = payload::quoted_inner(span_text, i)?.end + 1,
            b':' => {
                let start = i + 1;
                let mut end = start;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'-' | b'_'))
                {
                    end += 1;
                }
                if &span_text[start..end] == key {
                    return value_string_range(span_text, end, skip);
                }
                i = end.max(i + 1);
            }
            _ => i += 1,
        }
    }
    None
}

/// From just past a key name, locate the target quoted string: the value
/// itself, or the `skip`-th element of a vector value.
fn value_string_range(span_text: &str, mut i: usize, skip: usize) -> Option<Range<usize>> {
    let bytes = span_text.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut remaining = skip;
    if bytes.get(i) == Some(&b'[') {
        i += 1;
    } else if skip > 0 {
        return None;
    }
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'"') {
            return None;
        }
        let inner = payload::quoted_inner(span_text, i)?;
        if remaining == 0 {
            return Some(inner);
        }
        remaining -= 1;
        i = inner.end + 1;
    }
}

/// Offset just past `[!KIND(@AUTHOR)?:` in a legacy span.
fn legacy_header_end(span_text: &str) -> Option<usize> {
    let bytes = span_text.as_bytes();
    let mut i = 2;
    while i < bytes.len() && bytes[i].is_ascii_uppercase() {
        i += 1;
    }
    if bytes.get(i) == Some(&b'@') {
        while i < bytes.len() && bytes[i] != b':' {
            i += 1;
        }
    }
    (bytes.get(i) == Some(&b':')).then_some(i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::types::Priority;

    fn only(document: &str) -> Annotation {
        let mut annotations = codec::parse(document);
        assert_eq!(annotations.len(), 1);
        annotations.remove(0)
    }

    fn visible_text<'a>(document: &'a str, projection: &Projection) -> &'a str {
        match projection {
            Projection::Inline { visible, .. } => &document[visible.start..visible.end],
            _ => panic!("expected inline projection, got {projection:?}"),
        }
    }

    #[test]
    fn markup_mode_styles_the_whole_span() {
        let doc = r#"[!FIX{:text "typo"}]"#;
        let a = only(doc);
        assert_eq!(
            project(doc, &a, true),
            Projection::Markup { span: Span::new(0, doc.len()), style: MarkupStyle::Fix }
        );
    }

    #[test]
    fn markup_mode_uses_resolved_style_once_selection_moves() {
        let doc = r#"[!NOTE{:text "a" :priority :resolved :alts ["b"] :sel 1}]"#;
        let a = only(doc);
        match project(doc, &a, true) {
            Projection::Markup { style, .. } => assert_eq!(style, MarkupStyle::Resolved),
            other => panic!("expected markup projection, got {other:?}"),
        }
    }

    #[test]
    fn reading_mode_exposes_only_the_original_text() {
        let doc = r#"[!NOTE{:text "hello"}]"#;
        let a = only(doc);
        let projection = project(doc, &a, false);
        assert_eq!(visible_text(doc, &projection), "hello");
        match projection {
            Projection::Inline { hidden_before, hidden_after, .. } => {
                assert_eq!(&doc[hidden_before.start..hidden_before.end], r#"[!NOTE{:text ""#);
                assert_eq!(&doc[hidden_after.start..hidden_after.end], r#""}]"#);
            }
            other => panic!("expected inline projection, got {other:?}"),
        }
    }

    #[test]
    fn reading_mode_exposes_the_selected_alternative() {
        let doc = r#"[!NOTE{:text "hello" :priority :resolved :alts ["hi" "hey"] :sel 2}]"#;
        let a = only(doc);
        assert_eq!(visible_text(doc, &project(doc, &a, false)), "hey");
    }

    #[test]
    fn reading_mode_exposes_proposed_text_when_toggled() {
        let doc = r#"[!PROPOSAL{:text "original" :proposed "revised" :sel 1}]"#;
        let a = only(doc);
        assert_eq!(visible_text(doc, &project(doc, &a, false)), "revised");
    }

    #[test]
    fn key_names_inside_values_are_not_keys() {
        let doc = r#"[!NOTE{:comment ":text decoy" :text "real"}]"#;
        let a = only(doc);
        assert_eq!(visible_text(doc, &project(doc, &a, false)), "real");
    }

    #[test]
    fn legacy_original_text_projects_inline() {
        let doc = "[!TODO@bo:buy milk:2:urgent]";
        let a = only(doc);
        let projection = project(doc, &a, false);
        assert_eq!(visible_text(doc, &projection), "buy milk");
    }

    #[test]
    fn legacy_resolved_alternative_projects_inline() {
        let doc = r#"[!NOTE:old:AI-DONE:{:sel 2 :alts ["new A" "new B"]}]"#;
        let a = only(doc);
        assert_eq!(visible_text(doc, &project(doc, &a, false)), "new B");
    }

    #[test]
    fn multiline_active_text_degrades_to_block() {
        let mut a = Annotation::new(AnnotationKind::Note, "one\ntwo");
        a.priority = Some(Priority::Number(1.0));
        let doc = codec::serialize(&a);
        let parsed = only(&doc);
        match project(&doc, &parsed, false) {
            Projection::Block { hidden, active_text } => {
                assert_eq!(hidden, Span::new(0, doc.len()));
                assert_eq!(active_text, "one\ntwo");
            }
            other => panic!("expected block projection, got {other:?}"),
        }
    }

    #[test]
    fn escaped_active_text_degrades_to_block() {
        let doc = r#"[!NOTE{:text "say \"hi\""}]"#;
        let a = only(doc);
        match project(doc, &a, false) {
            Projection::Block { active_text, .. } => assert_eq!(active_text, r#"say "hi""#),
            other => panic!("expected block projection, got {other:?}"),
        }
    }
}

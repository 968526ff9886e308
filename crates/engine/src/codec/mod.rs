// Annotation codec: scan document text into annotation records with spans,
// and serialize records back to canonical text.
//
// Two surface grammars are read — the current `[!KIND{:key value}]` payload
// form and the legacy colon-delimited form — but only the current form is
// ever written. A malformed match is skipped and scanning continues; one
// broken annotation never hides the rest of the document.

pub mod legacy;
pub mod payload;

use tracing::debug;

use crate::types::{Annotation, AnnotationKind, Priority, Span, SyntaxFormat};
use payload::Value;

/// Parse one document's text into annotations ordered by ascending span
/// start. Non-overlapping by construction: nesting is disallowed and each
/// successful match resumes the scan past its closing bracket.
pub fn parse(document: &str) -> Vec<Annotation> {
    let bytes = document.as_bytes();
    let mut annotations = Vec::new();
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        if bytes[i] != b'[' || bytes[i + 1] != b'!' {
            i += 1;
            continue;
        }
        match match_at(document, i) {
            Some((annotation, end)) => {
                annotations.push(annotation);
                i = end;
            }
            None => {
                debug!(offset = i, "skipping malformed annotation markup");
                i += 2;
            }
        }
    }
    annotations
}

/// Try to read one annotation whose `[!` opens at `start`. `None` skips
/// this match only.
fn match_at(document: &str, start: usize) -> Option<(Annotation, usize)> {
    let bytes = document.as_bytes();
    let mut i = start + 2;

    let kind_start = i;
    while i < bytes.len() && bytes[i].is_ascii_uppercase() {
        i += 1;
    }
    let kind = AnnotationKind::from_tag(&document[kind_start..i])?;

    let mut author = None;
    if bytes.get(i) == Some(&b'@') {
        i += 1;
        let author_start = i;
        while i < bytes.len() && !matches!(bytes[i], b'{' | b':' | b']' | b'\n') {
            i += 1;
        }
        let name = document[author_start..i].trim();
        if !name.is_empty() {
            author = Some(name.to_string());
        }
    }

    match bytes.get(i)? {
        b'{' => {
            let (pairs, after) = payload::read_map_at(document, i).ok()?;
            if bytes.get(after) != Some(&b']') {
                return None;
            }
            let mut annotation = from_pairs(kind, author, &pairs)?;
            annotation.span = Span::new(start, after + 1);
            Some((annotation, after + 1))
        }
        b':' => {
            let (fields, after) = legacy::split_fields(document, i + 1)?;
            let mut annotation = legacy::interpret(kind, author, &fields)?;
            annotation.span = Span::new(start, after);
            Some((annotation, after))
        }
        _ => None,
    }
}

/// Build a record from current-format payload pairs. `None` skips the
/// match: missing/empty `:text`, a wrongly-typed field, or a selection
/// outside the bounds of what it selects.
fn from_pairs(
    kind: AnnotationKind,
    header_author: Option<String>,
    pairs: &[(String, Value)],
) -> Option<Annotation> {
    let text = payload::get(pairs, "text")?.as_str()?.to_string();
    if text.trim().is_empty() {
        return None;
    }

    let mut annotation = Annotation::new(kind, text);
    // The `@AUTHOR` header wins over a payload `:author` key.
    annotation.author = header_author
        .or_else(|| payload::get(pairs, "author").and_then(|v| v.as_str()).map(str::to_string));

    if let Some(value) = payload::get(pairs, "priority") {
        annotation.priority = Some(match value {
            Value::Keyword(tag) if tag == "pending" => Priority::Pending,
            Value::Keyword(tag) if tag == "resolved" => Priority::Resolved,
            Value::Num(n) => Priority::Number(*n),
            Value::Str(label) => Priority::Label(label.clone()),
            _ => return None,
        });
    }
    if let Some(value) = payload::get(pairs, "comment") {
        annotation.comment = Some(value.as_str()?.to_string());
    }
    if let Some(value) = payload::get(pairs, "alts") {
        let Value::Vec(items) = value else { return None };
        annotation.alternatives =
            items.iter().map(|v| v.as_str().map(str::to_string)).collect::<Option<Vec<_>>>()?;
    }
    if let Some(value) = payload::get(pairs, "sel") {
        annotation.selection = value.as_index()?;
    }
    if let Some(value) = payload::get(pairs, "proposed") {
        annotation.proposed = Some(value.as_str()?.to_string());
    }
    if let Some(value) = payload::get(pairs, "decision") {
        annotation.decision = Some(match value.as_keyword()? {
            "accepted" => crate::types::Decision::Accepted,
            "rejected" => crate::types::Decision::Rejected,
            _ => return None,
        });
    }
    if let Some(value) = payload::get(pairs, "decided-by") {
        annotation.decided_by = Some(value.as_str()?.to_string());
    }
    if let Some(value) = payload::get(pairs, "timestamp") {
        let parsed = chrono::DateTime::parse_from_rfc3339(value.as_str()?).ok()?;
        annotation.decided_at = Some(parsed.with_timezone(&chrono::Utc));
    }

    // Selection bounds: 0..=len(alts) for AI annotations, 0..=1 for
    // proposals. Out-of-bounds markup is foreign text; skip it.
    let max = if kind == AnnotationKind::Proposal { 1 } else { annotation.alternatives.len() };
    if annotation.selection > max {
        return None;
    }
    Some(annotation)
}

/// Serialize a record to the canonical current-format grammar.
///
/// `parse(serialize(a))` reproduces `a` for every record this engine
/// produces (modulo the ephemeral span, which serialization does not own).
pub fn serialize(annotation: &Annotation) -> String {
    let mut out = String::with_capacity(annotation.text.len() + 32);
    out.push_str("[!");
    out.push_str(annotation.kind.tag());
    if let Some(author) = &annotation.author {
        out.push('@');
        out.push_str(author);
    }
    out.push_str("{:text ");
    payload::write_str(&mut out, &annotation.text);

    if let Some(priority) = &annotation.priority {
        out.push_str(" :priority ");
        match priority {
            Priority::Pending => out.push_str(":pending"),
            Priority::Resolved => out.push_str(":resolved"),
            Priority::Number(n) => payload::write_num(&mut out, *n),
            Priority::Label(label) => payload::write_str(&mut out, label),
        }
    }
    if let Some(comment) = &annotation.comment {
        out.push_str(" :comment ");
        payload::write_str(&mut out, comment);
    }
    if !annotation.alternatives.is_empty() {
        out.push_str(" :alts [");
        for (idx, alt) in annotation.alternatives.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            payload::write_str(&mut out, alt);
        }
        out.push(']');
    }
    if let Some(proposed) = &annotation.proposed {
        out.push_str(" :proposed ");
        payload::write_str(&mut out, proposed);
    }
    if !annotation.alternatives.is_empty() || annotation.proposed.is_some() {
        out.push_str(&format!(" :sel {}", annotation.selection));
    }
    if let Some(decision) = annotation.decision {
        out.push_str(match decision {
            crate::types::Decision::Accepted => " :decision :accepted",
            crate::types::Decision::Rejected => " :decision :rejected",
        });
    }
    if let Some(decided_by) = &annotation.decided_by {
        out.push_str(" :decided-by ");
        payload::write_str(&mut out, decided_by);
    }
    if let Some(decided_at) = &annotation.decided_at {
        out.push_str(" :timestamp ");
        payload::write_str(&mut out, &decided_at.to_rfc3339());
    }
    out.push_str("}]");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Decision;

    fn parse_one(text: &str) -> Annotation {
        let annotations = parse(text);
        assert_eq!(annotations.len(), 1, "expected exactly one annotation in {text:?}");
        annotations.into_iter().next().unwrap()
    }

    #[test]
    fn parses_minimal_current_format() {
        let doc = r#"before [!TODO{:text "fix this"}] after"#;
        let a = parse_one(doc);
        assert_eq!(a.kind, AnnotationKind::Todo);
        assert_eq!(a.text, "fix this");
        assert_eq!(a.format, SyntaxFormat::Current);
        assert_eq!(&doc[a.span.start..a.span.end], r#"[!TODO{:text "fix this"}]"#);
    }

    #[test]
    fn header_author_wins_over_payload_author() {
        let a = parse_one(r#"[!NOTE@alice{:text "x" :author "bob"}]"#);
        assert_eq!(a.author.as_deref(), Some("alice"));

        let b = parse_one(r#"[!NOTE{:text "x" :author "bob"}]"#);
        assert_eq!(b.author.as_deref(), Some("bob"));
    }

    #[test]
    fn malformed_payload_is_skipped_but_scan_continues() {
        let doc = r#"[!NOTE{:text "unterminated}] and [!TODO{:text "fix this"}]"#;
        let annotations = parse(doc);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, AnnotationKind::Todo);
        assert_eq!(annotations[0].text, "fix this");
    }

    #[test]
    fn unknown_kind_and_aspect_refs_are_not_annotations() {
        assert!(parse(r#"[!WARN{:text "x"}] [@aspect-7] [!{:text "y"}]"#).is_empty());
    }

    #[test]
    fn parses_legacy_grammar() {
        let a = parse_one("[!TODO:buy milk:2:urgent]");
        assert_eq!(a.kind, AnnotationKind::Todo);
        assert_eq!(a.text, "buy milk");
        assert_eq!(a.priority, Some(Priority::Number(2.0)));
        assert_eq!(a.comment.as_deref(), Some("urgent"));
        assert_eq!(a.format, SyntaxFormat::Legacy);
    }

    #[test]
    fn parses_legacy_author_and_ai_done_payload() {
        let a = parse_one(r#"[!NOTE@ana:old line:AI-DONE:{:sel 1 :alts ["new line"]}]"#);
        assert_eq!(a.author.as_deref(), Some("ana"));
        assert!(a.is_resolved());
        assert_eq!(a.selection, 1);
        assert_eq!(a.alternatives, vec!["new line"]);
        assert_eq!(a.active_text(), "new line");
    }

    #[test]
    fn multiple_annotations_come_back_in_document_order() {
        let doc = r#"a [!FIX{:text "one"}] b [!NOTE:two:1:] c [!TODO{:text "three"}]"#;
        let texts: Vec<_> = parse(doc).into_iter().map(|a| a.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn selection_out_of_bounds_is_skipped() {
        assert!(parse(r#"[!NOTE{:text "x" :priority :resolved :alts ["a"] :sel 2}]"#).is_empty());
        assert!(parse(r#"[!PROPOSAL{:text "x" :proposed "y" :sel 2}]"#).is_empty());
    }

    #[test]
    fn serializes_expected_canonical_forms() {
        let mut note = Annotation::new(AnnotationKind::Note, "old line");
        note.priority = Some(Priority::Pending);
        assert_eq!(serialize(&note), r#"[!NOTE{:text "old line" :priority :pending}]"#);

        note.priority = Some(Priority::Resolved);
        note.alternatives = vec!["new line A".into(), "new line B".into()];
        assert_eq!(
            serialize(&note),
            r#"[!NOTE{:text "old line" :priority :resolved :alts ["new line A" "new line B"] :sel 0}]"#
        );

        let mut proposal = Annotation::new(AnnotationKind::Proposal, "original");
        proposal.proposed = Some("revised".into());
        assert_eq!(
            serialize(&proposal),
            r#"[!PROPOSAL{:text "original" :proposed "revised" :sel 0}]"#
        );
    }

    #[test]
    fn serialized_strings_escape_quotes_and_backslashes() {
        let a = Annotation::new(AnnotationKind::Todo, r#"say "hi" \ now"#);
        let serialized = serialize(&a);
        assert_eq!(serialized, r#"[!TODO{:text "say \"hi\" \\ now"}]"#);
        assert_eq!(parse_one(&serialized).text, r#"say "hi" \ now"#);
    }

    #[test]
    fn round_trips_every_producible_field_set() {
        let mut full = Annotation::new(AnnotationKind::Fix, "anchor");
        full.author = Some("ana".into());
        full.priority = Some(Priority::Number(2.0));
        full.comment = Some("tighten wording".into());

        let mut resolved = Annotation::new(AnnotationKind::Note, "old");
        resolved.priority = Some(Priority::Resolved);
        resolved.alternatives = vec!["hi".into(), "hey".into()];
        resolved.selection = 2;

        let mut proposal = Annotation::new(AnnotationKind::Proposal, "old");
        proposal.proposed = Some("new".into());
        proposal.selection = 1;
        proposal.decision = Some(Decision::Accepted);
        proposal.decided_by = Some("rex".into());
        proposal.decided_at =
            Some(chrono::DateTime::parse_from_rfc3339("2026-08-25T10:00:00Z").unwrap().into());

        for original in [full, resolved, proposal] {
            let mut reparsed = parse_one(&serialize(&original));
            reparsed.span = Span::default();
            assert_eq!(reparsed, original);
        }
    }
}

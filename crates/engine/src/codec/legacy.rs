// Legacy colon-delimited grammar (read-only compatibility).
//
// `[!KIND(@AUTHOR)?:TEXT:PRIORITY:COMMENT]` with priority tokens `AI`
// (pending) and `AI-DONE` (resolved). For `AI-DONE` the comment field is a
// nested `{:sel N :alts [...]}` mini-payload decoded with the same tolerant
// reader as the current grammar. Proposals get a distinct segmentation:
// their text may itself contain `:`, so the trailing `proposed:sel` pair is
// peeled off from the right instead of splitting left-to-right.

use crate::codec::payload::{self, Value};
use crate::types::{Annotation, AnnotationKind, Priority, SyntaxFormat};

/// Split the legacy body starting just past the `[!KIND(@AUTHOR)?:` header
/// into top-level fields, returning them plus the offset past the closing
/// `]`.
///
/// A `{...}` run (the AI-DONE mini-payload) is opaque: separators and `]`
/// inside it, including inside its quoted strings, do not count. A newline
/// outside braces aborts the match; legacy annotations are single-line.
pub fn split_fields(doc: &str, start: usize) -> Option<(Vec<String>, usize)> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in doc[start..].char_indices() {
        if in_string {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => {
                in_string = true;
                current.push(ch);
            }
            '{' => {
                depth += 1;
                current.push(ch);
            }
            '}' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            ':' if depth == 0 => fields.push(std::mem::take(&mut current)),
            ']' if depth == 0 => {
                fields.push(current);
                return Some((fields, start + idx + 1));
            }
            '\n' => return None,
            _ => current.push(ch),
        }
    }
    None
}

/// Interpret split fields as one annotation. `None` means the match is
/// skipped (fault isolation), never that the whole scan fails.
pub fn interpret(
    kind: AnnotationKind,
    author: Option<String>,
    fields: &[String],
) -> Option<Annotation> {
    if kind == AnnotationKind::Proposal {
        if let Some(parsed) = interpret_proposal(author.clone(), fields) {
            return Some(parsed);
        }
        // Fall back to the generic three-field reading.
    }
    interpret_generic(kind, author, fields)
}

/// Proposal-aware segmentation: the last field must be a 0/1 selection and
/// the one before it is the proposed text; everything earlier (which may
/// contain `:`) re-joins into the anchored text.
fn interpret_proposal(author: Option<String>, fields: &[String]) -> Option<Annotation> {
    if fields.len() < 3 {
        return None;
    }
    let selection = match fields[fields.len() - 1].trim() {
        "0" => 0,
        "1" => 1,
        _ => return None,
    };
    let proposed = fields[fields.len() - 2].clone();
    let text = fields[..fields.len() - 2].join(":");
    if text.trim().is_empty() {
        return None;
    }

    let mut annotation = Annotation::new(AnnotationKind::Proposal, text);
    annotation.format = SyntaxFormat::Legacy;
    annotation.author = author;
    annotation.proposed = Some(proposed);
    annotation.selection = selection;
    Some(annotation)
}

fn interpret_generic(
    kind: AnnotationKind,
    author: Option<String>,
    fields: &[String],
) -> Option<Annotation> {
    let text = fields.first()?.clone();
    if text.trim().is_empty() {
        return None;
    }

    let mut annotation = Annotation::new(kind, text);
    annotation.format = SyntaxFormat::Legacy;
    annotation.author = author;
    annotation.priority = fields.get(1).and_then(|raw| parse_priority(raw));

    // Anything past the third separator was a `:` inside the comment.
    let comment = if fields.len() > 2 { fields[2..].join(":") } else { String::new() };

    if annotation.is_resolved() {
        let (selection, alternatives) = decode_resolution(comment.trim())?;
        annotation.selection = selection;
        annotation.alternatives = alternatives;
        if annotation.selection > annotation.alternatives.len() {
            return None;
        }
    } else if !comment.trim().is_empty() {
        annotation.comment = Some(comment);
    }
    Some(annotation)
}

fn parse_priority(raw: &str) -> Option<Priority> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw {
        "AI" => Some(Priority::Pending),
        "AI-DONE" => Some(Priority::Resolved),
        _ => match raw.parse::<f64>() {
            Ok(n) => Some(Priority::Number(n)),
            Err(_) => Some(Priority::Label(raw.to_string())),
        },
    }
}

/// Decode the `{:sel N :alts [...]}` mini-payload held in the comment
/// field of a legacy `AI-DONE` annotation.
fn decode_resolution(comment: &str) -> Option<(usize, Vec<String>)> {
    let (pairs, end) = payload::read_map_at(comment, 0).ok()?;
    if !comment[end..].trim().is_empty() {
        return None;
    }
    let selection = match payload::get(&pairs, "sel") {
        Some(value) => value.as_index()?,
        None => 0,
    };
    let alternatives = match payload::get(&pairs, "alts") {
        Some(Value::Vec(items)) => {
            items.iter().map(|v| v.as_str().map(str::to_string)).collect::<Option<Vec<_>>>()?
        }
        Some(_) => return None,
        None => Vec::new(),
    };
    Some((selection, alternatives))
}

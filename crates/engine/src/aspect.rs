// Aspect reference parsing (`[@ASPECT-ID]` syntax).
//
// A same-text-layer cross-reference, not an annotation: it carries no
// payload and no lifecycle. Parsed independently so the annotation scanner
// and this one can never confuse `[@...]` with `[!...]`.

use serde::Serialize;

use crate::types::Span;

/// A parsed aspect reference.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AspectRef {
    /// The identifier between `[@` and `]`.
    pub id: String,
    /// Byte range of the full `[@...]` marker.
    pub span: Span,
}

/// Parse all aspect references in `text`.
pub fn parse_aspect_refs(text: &str) -> Vec<AspectRef> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0usize;

    while i + 1 < bytes.len() {
        if bytes[i] != b'[' || bytes[i + 1] != b'@' {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i + 2;
        while j < bytes.len() && !matches!(bytes[j], b']' | b'[' | b'\n') {
            j += 1;
        }
        if bytes.get(j) != Some(&b']') {
            i += 2;
            continue;
        }
        let id = text[start + 2..j].trim();
        if !id.is_empty() {
            refs.push(AspectRef { id: id.to_string(), span: Span::new(start, j + 1) });
        }
        i = j + 1;
    }
    refs
}

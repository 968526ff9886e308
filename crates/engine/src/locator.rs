// Position-based annotation lookup.
//
// Both entry points re-parse the current text; no positional state is ever
// carried over from a previous read. The proposal-aware legacy
// segmentation (a proposal's text may contain the legacy `:` separator)
// lives in the codec, so a single parse pass is position-correct for every
// kind.

use crate::codec;
use crate::types::{Annotation, Span};

/// The annotation whose span contains `offset`, if any.
pub fn find_at(document: &str, offset: usize) -> Option<Annotation> {
    codec::parse(document).into_iter().find(|a| a.span.contains(offset))
}

/// Locate an annotation when the caller only holds its literal span text —
/// e.g. the markup captured before an asynchronous AI call returned.
///
/// `literal` must parse standalone as exactly one complete annotation; the
/// returned record's span points at the first occurrence of `literal` in
/// `document`. `None` if the literal is malformed or no longer present.
pub fn find_by_literal(document: &str, literal: &str) -> Option<Annotation> {
    let parsed = codec::parse(literal);
    if parsed.len() != 1 {
        return None;
    }
    let mut annotation = parsed.into_iter().next()?;
    if annotation.span != Span::new(0, literal.len()) {
        return None;
    }

    let start = document.find(literal)?;
    annotation.span = Span::new(start, start + literal.len());
    Some(annotation)
}

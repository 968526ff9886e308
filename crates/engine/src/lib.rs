// redline-engine: annotation protocol & lifecycle engine for inline
// review markup embedded in plain-text documents.
//
// The document text is the only source of truth. Every operation here is
// a pure function over that text: parse it fresh, locate a target, and
// either return a spliced replacement or a well-defined no-op. Nothing is
// cached across edits and no annotation identity outlives a single read.

pub mod aspect;
pub mod codec;
pub mod lifecycle;
pub mod locator;
pub mod types;
pub mod visibility;

// `redline select` — set which candidate text is active.
//
// Dispatches on the annotation kind: proposals toggle 0/1, AI annotations
// cycle 0..=len(alternatives). Out-of-range selections are rejected, not
// clamped.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use redline_engine::lifecycle;
use redline_engine::types::AnnotationKind;

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct SelectArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchored original text of the annotation.
    pub anchor: String,

    /// Selection index: 0 = original text.
    pub selection: usize,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectResult {
    pub file: String,
    pub selection: usize,
    pub changed: bool,
}

pub fn run(args: SelectArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;

    let splice = match super::find_by_anchor(&document, &args.anchor) {
        Some(target) if target.kind == AnnotationKind::Proposal => {
            lifecycle::cycle_proposal_selection(&document, &args.anchor, args.selection)
                .context("invalid proposal selection")?
        }
        Some(_) => lifecycle::cycle_ai_selection(&document, &args.anchor, args.selection)
            .context("invalid selection")?,
        None => lifecycle::Splice::NoOp,
    };

    let changed = store::apply(&args.file, &splice)?;
    let result =
        SelectResult { file: args.file.display().to_string(), selection: args.selection, changed };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &SelectResult) -> String {
    if result.changed {
        format!("{}: selection set to {}", result.file, result.selection)
    } else {
        format!("{}: annotation not found, nothing changed", result.file)
    }
}

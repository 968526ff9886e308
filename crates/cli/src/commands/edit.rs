// `redline edit` — change an annotation's priority or comment.
//
// The target is named by its anchored original text; the annotation is
// reacquired from the current file contents, so a stale anchor is a
// reported no-op rather than an error.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use redline_engine::lifecycle;

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchored original text of the annotation to edit.
    pub anchor: String,

    /// New priority: a number or a free-form label.
    #[arg(long)]
    priority: Option<String>,

    /// New comment (empty string clears it).
    #[arg(long)]
    comment: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct EditResult {
    pub file: String,
    pub changed: bool,
}

pub fn run(args: EditArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let priority = args.priority.as_deref().map(super::parse_priority_flag).transpose()?;

    let document = store::load(&args.file)?;
    let splice = match super::find_by_anchor(&document, &args.anchor) {
        Some(target) => lifecycle::edit(&document, &target, priority, args.comment),
        None => lifecycle::Splice::NoOp,
    };

    let changed = store::apply(&args.file, &splice)?;
    let result = EditResult { file: args.file.display().to_string(), changed };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &EditResult) -> String {
    if result.changed {
        format!("{}: updated", result.file)
    } else {
        format!("{}: annotation not found, nothing changed", result.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_engine::codec;
    use redline_engine::types::Priority;

    #[test]
    fn edits_priority_and_upgrades_legacy_markup() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "[!TODO:buy milk:2:urgent]").unwrap();

        run(EditArgs {
            file: path.clone(),
            anchor: "buy milk".into(),
            priority: Some("1".into()),
            comment: None,
            json: true,
        })
        .expect("edit should succeed");

        let document = std::fs::read_to_string(&path).unwrap();
        let annotation = codec::parse(&document).remove(0);
        assert_eq!(annotation.priority, Some(Priority::Number(1.0)));
        assert_eq!(annotation.format, redline_engine::types::SyntaxFormat::Current);
    }

    #[test]
    fn stale_anchor_is_a_reported_noop() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "no annotations here").unwrap();

        run(EditArgs {
            file: path.clone(),
            anchor: "gone".into(),
            priority: None,
            comment: Some("x".into()),
            json: true,
        })
        .expect("edit should not error on a missing target");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "no annotations here");
    }
}

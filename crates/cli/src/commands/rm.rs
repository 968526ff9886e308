// `redline rm` — remove an annotation, restoring its original text.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use redline_engine::lifecycle;

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchored original text of the annotation to remove.
    pub anchor: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct RmResult {
    pub file: String,
    pub changed: bool,
}

pub fn run(args: RmArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let splice = match super::find_by_anchor(&document, &args.anchor) {
        Some(target) => lifecycle::delete(&document, &target),
        None => lifecycle::Splice::NoOp,
    };

    let changed = store::apply(&args.file, &splice)?;
    let result = RmResult { file: args.file.display().to_string(), changed };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &RmResult) -> String {
    if result.changed {
        format!("{}: annotation removed", result.file)
    } else {
        format!("{}: annotation not found, nothing changed", result.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_markup_and_keeps_the_text() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, r#"keep [!NOTE@ana{:text "this line"}] tail"#).unwrap();

        run(RmArgs { file: path.clone(), anchor: "this line".into(), json: true })
            .expect("rm should succeed");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep this line tail");
    }
}

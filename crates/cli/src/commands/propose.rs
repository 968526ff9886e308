// `redline propose` — wrap text in a proposal carrying replacement text.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use redline_engine::lifecycle;

use crate::config::GlobalConfig;
use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct ProposeArgs {
    /// Document path.
    pub file: PathBuf,

    /// The exact text to propose replacing.
    pub anchor: String,

    /// The proposed replacement text.
    pub proposed: String,

    /// Author identity (defaults to the configured display name).
    #[arg(long)]
    author: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct ProposeResult {
    pub file: String,
    pub changed: bool,
}

pub fn run(args: ProposeArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let config = GlobalConfig::load();

    let document = store::load(&args.file)?;
    let splice =
        lifecycle::propose(&document, &args.anchor, &args.proposed, config.author(args.author))
            .context("cannot propose for this selection")?;

    let changed = store::apply(&args.file, &splice)?;
    let result = ProposeResult { file: args.file.display().to_string(), changed };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &ProposeResult) -> String {
    if result.changed {
        format!("{}: proposal recorded", result.file)
    } else {
        format!("{}: anchor not found, nothing changed", result.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redline_engine::codec;
    use redline_engine::types::AnnotationKind;

    #[test]
    fn records_a_proposal_with_original_active() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "keep the original wording here").unwrap();

        run(ProposeArgs {
            file: path.clone(),
            anchor: "original wording".into(),
            proposed: "revised wording".into(),
            author: Some("ana".into()),
            json: true,
        })
        .expect("propose should succeed");

        let document = std::fs::read_to_string(&path).unwrap();
        let annotation = codec::parse(&document).remove(0);
        assert_eq!(annotation.kind, AnnotationKind::Proposal);
        assert_eq!(annotation.proposed.as_deref(), Some("revised wording"));
        assert_eq!(annotation.selection, 0);
    }
}

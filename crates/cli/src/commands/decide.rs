// `redline decide` — accept or reject a proposal.
//
// The emitted decision event is printed rather than persisted: the CLI
// stands in for the external discussion log. The decision is never
// written back into the document text.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::Serialize;

use redline_engine::lifecycle::{self, Decided};
use redline_engine::types::DecisionEvent;

use crate::config::GlobalConfig;
use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verdict {
    Accept,
    Reject,
}

#[derive(Debug, Args)]
pub struct DecideArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchored original text of the proposal.
    pub anchor: String,

    /// The decision to record.
    #[arg(value_enum)]
    pub verdict: Verdict,

    /// Identity recorded as `decided_by` (defaults to the configured
    /// display name).
    #[arg(long)]
    author: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct DecideResult {
    pub file: String,
    pub changed: bool,
    pub event: Option<DecisionEvent>,
}

pub fn run(args: DecideArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let config = GlobalConfig::load();
    let Some(decided_by) = config.author(args.author) else {
        anyhow::bail!("no identity for the decision; pass --author or set display_name");
    };

    let document = store::load(&args.file)?;
    let decided = match args.verdict {
        Verdict::Accept => lifecycle::accept_proposal(&document, &args.anchor, &decided_by),
        Verdict::Reject => lifecycle::reject_proposal(&document, &args.anchor, &decided_by),
    };

    let result = match decided {
        Decided::Applied { new_text, event } => {
            store::apply(&args.file, &lifecycle::Splice::Applied(new_text))?;
            DecideResult { file: args.file.display().to_string(), changed: true, event: Some(event) }
        }
        Decided::NoOp => {
            DecideResult { file: args.file.display().to_string(), changed: false, event: None }
        }
    };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &DecideResult) -> String {
    match &result.event {
        Some(event) => format!(
            "{}: {:?} by {} at {}",
            result.file,
            event.decision,
            event.decided_by,
            event.decided_at.to_rfc3339()
        ),
        None => format!("{}: proposal not found, nothing changed", result.file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepting_applies_the_proposed_text() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, r#"keep [!PROPOSAL{:text "old" :proposed "new" :sel 0}] here"#)
            .unwrap();

        run(DecideArgs {
            file: path.clone(),
            anchor: "old".into(),
            verdict: Verdict::Accept,
            author: Some("rex".into()),
            json: true,
        })
        .expect("decide should succeed");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep new here");
    }

    #[test]
    fn rejecting_restores_the_original_text() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, r#"keep [!PROPOSAL{:text "old" :proposed "new" :sel 1}] here"#)
            .unwrap();

        run(DecideArgs {
            file: path.clone(),
            anchor: "old".into(),
            verdict: Verdict::Reject,
            author: Some("rex".into()),
            json: true,
        })
        .expect("decide should succeed");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep old here");
    }
}

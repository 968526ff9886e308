// `redline ls` — list annotations with spans and metadata.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use redline_engine::codec;
use redline_engine::types::{Annotation, Priority};

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct LsArgs {
    /// Document path.
    pub file: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct LsResult {
    pub file: String,
    pub annotations: Vec<Annotation>,
}

pub fn run(args: LsArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let result = LsResult {
        file: args.file.display().to_string(),
        annotations: codec::parse(&document),
    };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &LsResult) -> String {
    let mut lines = Vec::new();
    lines.push(format!("{} — {} annotation(s)", result.file, result.annotations.len()));

    if result.annotations.is_empty() {
        return lines.join("\n");
    }

    // Header line.
    lines.push(format!(
        "  {:<10} {:<10} {:>6} {:>6} {:>4}  {}",
        "KIND", "AUTHOR", "START", "END", "SEL", "TEXT"
    ));

    for a in &result.annotations {
        let author = a.author.as_deref().unwrap_or("-");
        let state = match &a.priority {
            Some(Priority::Pending) => " [pending]",
            Some(Priority::Resolved) => " [resolved]",
            _ => "",
        };
        lines.push(format!(
            "  {:<10} {:<10} {:>6} {:>6} {:>4}  {}{}",
            a.kind.tag(),
            author,
            a.span.start,
            a.span.end,
            a.selection,
            a.text,
            state
        ));
    }
    lines.join("\n")
}

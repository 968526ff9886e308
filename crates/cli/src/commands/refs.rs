// `redline refs` — list aspect references in a document.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use redline_engine::aspect::{self, AspectRef};

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct RefsArgs {
    /// Document path.
    pub file: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct RefsResult {
    pub file: String,
    pub refs: Vec<AspectRef>,
}

pub fn run(args: RefsArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let result = RefsResult {
        file: args.file.display().to_string(),
        refs: aspect::parse_aspect_refs(&document),
    };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &RefsResult) -> String {
    if result.refs.is_empty() {
        return format!("{}: no aspect references", result.file);
    }
    let mut out = format!("{}: {} reference(s)\n", result.file, result.refs.len());
    for r in &result.refs {
        out.push_str(&format!("  {}..{}  {}\n", r.span.start, r.span.end, r.id));
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_refs_with_offsets() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "see [@auth-flow] and [@ux.copy]").unwrap();

        run(RefsArgs { file: path, json: true }).expect("refs should succeed");
    }
}

// `redline ai` — drive the AI-assisted rewrite lifecycle by hand.
//
// The real AI transport is external to the engine; these subcommands play
// both sides so the whole pending → resolved → confirmed/cancelled flow
// can be scripted and tested. `resolve` reconstructs the content-based
// pending key from the document path and anchor, exactly what a transport
// callback would hold.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use redline_engine::lifecycle::{self, AiRequest};
use redline_engine::types::PendingKey;

use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Subcommand)]
pub enum AiCommand {
    /// Mark text pending and print the request key
    Begin(BeginArgs),
    /// Apply candidate rewrites to a pending annotation
    Resolve(ResolveArgs),
    /// Replace the span with the active text and drop the annotation
    Confirm(TargetArgs),
    /// Restore the original text and drop the annotation
    Cancel(TargetArgs),
}

#[derive(Debug, Args)]
pub struct BeginArgs {
    /// Document path.
    pub file: PathBuf,

    /// The exact text to request a rewrite for.
    pub anchor: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchor text the pending request was created with.
    pub anchor: String,

    /// Candidate rewrites, in order. Empty cancels the request.
    pub candidates: Vec<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Document path.
    pub file: PathBuf,

    /// Anchor text of the AI annotation.
    pub anchor: String,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct AiResult {
    pub file: String,
    pub changed: bool,
    pub key: Option<PendingKey>,
}

pub fn run(cmd: AiCommand) -> anyhow::Result<()> {
    match cmd {
        AiCommand::Begin(args) => begin(args),
        AiCommand::Resolve(args) => resolve(args),
        AiCommand::Confirm(args) => confirm(args),
        AiCommand::Cancel(args) => cancel(args),
    }
}

fn begin(args: BeginArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let request = lifecycle::begin_ai_request(&document, store::doc_id(&args.file), &args.anchor)?;

    let result = match request {
        AiRequest::Started { new_text, key } => {
            store::apply(&args.file, &lifecycle::Splice::Applied(new_text))?;
            AiResult { file: args.file.display().to_string(), changed: true, key: Some(key) }
        }
        AiRequest::NoOp => {
            AiResult { file: args.file.display().to_string(), changed: false, key: None }
        }
    };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let key = PendingKey { doc_id: store::doc_id(&args.file), anchor: args.anchor.clone() };

    let splice = lifecycle::resolve_ai_request(&document, &key, &args.candidates);
    let changed = store::apply(&args.file, &splice)?;
    let result = AiResult { file: args.file.display().to_string(), changed, key: Some(key) };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn confirm(args: TargetArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let splice = lifecycle::confirm_ai(&document, &args.anchor);
    let changed = store::apply(&args.file, &splice)?;
    let result = AiResult { file: args.file.display().to_string(), changed, key: None };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn cancel(args: TargetArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let document = store::load(&args.file)?;
    let splice = lifecycle::cancel_ai(&document, &args.anchor);
    let changed = store::apply(&args.file, &splice)?;
    let result = AiResult { file: args.file.display().to_string(), changed, key: None };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &AiResult) -> String {
    if result.changed {
        format!("{}: applied", result.file)
    } else {
        format!("{}: target not found, nothing changed", result.file)
    }
}

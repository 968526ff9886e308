// `redline wrap` — wrap text in a todo/note/fix annotation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::Serialize;

use redline_engine::lifecycle::{self, WrapFields};
use redline_engine::types::AnnotationKind;

use crate::config::GlobalConfig;
use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WrapKind {
    Todo,
    Note,
    Fix,
}

impl From<WrapKind> for AnnotationKind {
    fn from(kind: WrapKind) -> Self {
        match kind {
            WrapKind::Todo => Self::Todo,
            WrapKind::Note => Self::Note,
            WrapKind::Fix => Self::Fix,
        }
    }
}

#[derive(Debug, Args)]
pub struct WrapArgs {
    /// Document path.
    pub file: PathBuf,

    /// The exact text to wrap (first occurrence outside existing markup).
    pub anchor: String,

    /// Annotation kind.
    #[arg(long, value_enum, default_value = "todo")]
    kind: WrapKind,

    /// Author identity (defaults to the configured display name).
    #[arg(long)]
    author: Option<String>,

    /// Priority: a number or a free-form label.
    #[arg(long)]
    priority: Option<String>,

    /// Free-text comment.
    #[arg(long)]
    comment: Option<String>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct WrapResult {
    pub file: String,
    pub changed: bool,
}

pub fn run(args: WrapArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let config = GlobalConfig::load();

    let priority = args.priority.as_deref().map(super::parse_priority_flag).transpose()?;
    let document = store::load(&args.file)?;
    let splice = lifecycle::wrap(
        &document,
        args.kind.into(),
        &args.anchor,
        WrapFields { author: config.author(args.author), priority, comment: args.comment },
    )
    .context("cannot wrap this selection")?;

    let changed = store::apply(&args.file, &splice)?;
    let result = WrapResult { file: args.file.display().to_string(), changed };
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn format_human(result: &WrapResult) -> String {
    if result.changed {
        format!("{}: wrapped", result.file)
    } else {
        format!("{}: anchor not found, nothing changed", result.file)
    }
}

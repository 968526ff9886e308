// CLI subcommand dispatch.

use clap::Subcommand;

use redline_engine::codec;
use redline_engine::types::{Annotation, Priority};

pub mod ai;
pub mod config;
pub mod decide;
pub mod edit;
pub mod ls;
pub mod propose;
pub mod refs;
pub mod rm;
pub mod select;
pub mod show;
pub mod wrap;

#[derive(Subcommand)]
pub enum Command {
    /// List annotations in a document
    Ls(ls::LsArgs),
    /// Render a document through the visibility projector
    Show(show::ShowArgs),
    /// Wrap text in a todo/note/fix annotation
    Wrap(wrap::WrapArgs),
    /// Change an annotation's priority or comment
    Edit(edit::EditArgs),
    /// Remove an annotation, restoring its original text
    Rm(rm::RmArgs),
    /// Wrap text in a proposal with replacement text
    Propose(propose::ProposeArgs),
    /// Set which candidate text is active
    Select(select::SelectArgs),
    /// Accept or reject a proposal
    Decide(decide::DecideArgs),
    /// Drive the AI-assisted rewrite lifecycle
    #[command(subcommand)]
    Ai(ai::AiCommand),
    /// List aspect references
    Refs(refs::RefsArgs),
    /// Inspect or change the global configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Ls(args) => ls::run(args),
        Command::Show(args) => show::run(args),
        Command::Wrap(args) => wrap::run(args),
        Command::Edit(args) => edit::run(args),
        Command::Rm(args) => rm::run(args),
        Command::Propose(args) => propose::run(args),
        Command::Select(args) => select::run(args),
        Command::Decide(args) => decide::run(args),
        Command::Ai(cmd) => ai::run(cmd),
        Command::Refs(args) => refs::run(args),
        Command::Config(cmd) => config::run(cmd),
    }
}

/// First annotation anchored to `anchor`, reacquired from the current text.
pub(crate) fn find_by_anchor(document: &str, anchor: &str) -> Option<Annotation> {
    codec::parse(document).into_iter().find(|a| a.text == anchor)
}

/// Parse a `--priority` flag. The `pending`/`resolved` workflow tags are
/// reserved for the AI lifecycle and cannot be set by hand.
pub(crate) fn parse_priority_flag(raw: &str) -> anyhow::Result<Priority> {
    match raw {
        "pending" | "resolved" => {
            anyhow::bail!("priority `{raw}` is a reserved workflow tag; use `redline ai` instead")
        }
        _ => Ok(match raw.parse::<f64>() {
            Ok(n) => Priority::Number(n),
            Err(_) => Priority::Label(raw.to_string()),
        }),
    }
}

// `redline show` — render a document through the visibility projector.
//
// Reading mode (the default, unless the config says otherwise) hides all
// markup scaffolding and shows only each annotation's active text.
// `--markup` shows the raw text and lists the styled spans instead.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use redline_engine::codec;
use redline_engine::visibility::{self, Projection};

use crate::config::GlobalConfig;
use crate::output::{self, OutputFormat};
use crate::store;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document path.
    pub file: PathBuf,

    /// Show raw markup with styled spans instead of reading mode.
    #[arg(long)]
    markup: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
pub struct ShowResult {
    pub file: String,
    pub show_markup: bool,
    /// The text a reader sees (reading mode) or the raw text (markup mode).
    pub rendered: String,
    pub projections: Vec<Projection>,
}

pub fn run(args: ShowArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let config = GlobalConfig::load();
    let show_markup = args.markup || config.show_markup;

    let document = store::load(&args.file)?;
    let result = render(&args.file.display().to_string(), &document, show_markup);
    output::print_output(format, &result, format_human)?;
    Ok(())
}

fn render(file: &str, document: &str, show_markup: bool) -> ShowResult {
    let annotations = codec::parse(document);
    let projections: Vec<Projection> =
        annotations.iter().map(|a| visibility::project(document, a, show_markup)).collect();

    let rendered = if show_markup {
        document.to_string()
    } else {
        let mut out = String::with_capacity(document.len());
        let mut cursor = 0usize;
        for (annotation, projection) in annotations.iter().zip(&projections) {
            out.push_str(&document[cursor..annotation.span.start]);
            match projection {
                Projection::Inline { visible, .. } => {
                    out.push_str(&document[visible.start..visible.end]);
                }
                Projection::Block { active_text, .. } => {
                    // Multi-line or escaped active text renders out-of-line.
                    out.push('\n');
                    out.push_str(active_text);
                    out.push('\n');
                }
                Projection::Markup { .. } => out.push_str(annotation.active_text()),
            }
            cursor = annotation.span.end;
        }
        out.push_str(&document[cursor..]);
        out
    };

    ShowResult { file: file.to_string(), show_markup, rendered, projections }
}

fn format_human(result: &ShowResult) -> String {
    if !result.show_markup {
        return result.rendered.clone();
    }
    let mut lines = vec![result.rendered.clone()];
    if !result.projections.is_empty() {
        lines.push(format!("-- {} styled span(s):", result.projections.len()));
        for projection in &result.projections {
            if let Projection::Markup { span, style } = projection {
                lines.push(format!("  {:>6}..{:<6} {:?}", span.start, span.end, style));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_mode_shows_only_active_text() {
        let doc = r#"a [!NOTE{:text "hello" :priority :resolved :alts ["hi" "hey"] :sel 2}] b"#;
        let result = render("d", doc, false);
        assert_eq!(result.rendered, "a hey b");
    }

    #[test]
    fn markup_mode_keeps_raw_text_and_lists_spans() {
        let doc = r#"a [!FIX{:text "typo"}] b"#;
        let result = render("d", doc, true);
        assert_eq!(result.rendered, doc);
        assert_eq!(result.projections.len(), 1);
        assert!(format_human(&result).contains("styled span(s)"));
    }

    #[test]
    fn multiline_active_text_renders_as_block() {
        let mut a = redline_engine::types::Annotation::new(
            redline_engine::types::AnnotationKind::Note,
            "one\ntwo",
        );
        a.comment = Some("x".into());
        let doc = format!("pre {} post", codec::serialize(&a));
        let result = render("d", &doc, false);
        assert_eq!(result.rendered, "pre \none\ntwo\n post");
    }
}

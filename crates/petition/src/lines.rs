use std::path::PathBuf;

use petition_core::assemble::{page_lines, Assembly, LineState};
use petition_core::extract::TABLE_PAGE;
use petition_core::{PageSource, TextMode};
use serde::Serialize;

use crate::config::Config;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct LinesOptions {
    /// Petition PDF file
    path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// How one table-page line was handled.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct LineReport {
    pub index: usize,
    pub class: &'static str,
    pub state: LineState,
    pub text: String,
}

pub async fn run(options: LinesOptions, config: Config) -> Result<()> {
    let extractor = config.extractor()?;
    let layout = config.layout;

    let text = tokio::task::spawn_blocking({
        let path = options.path.clone();
        move || -> Result<Option<String>> {
            let document = petition_pdf::Document::open(&path)
                .wrap_err_with(|| format!("cannot open {}", path.display()))?
                .with_layout(layout);
            if document.page_count() <= TABLE_PAGE {
                return Ok(None);
            }
            Ok(Some(document.page_text(TABLE_PAGE, TextMode::Layout)?))
        }
    })
    .await??;

    let Some(text) = text else {
        if options.json {
            println!("[]");
        } else {
            println!("The document has no table page.");
        }
        return Ok(());
    };

    let assembly = extractor.assemble_text(&text);
    let reports = line_reports(&page_lines(&text), &assembly);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["#", "Class", "State", "Text"]);
    for report in &reports {
        table.add_row(prettytable::row![
            report.index,
            report.class,
            describe_state(&report.state),
            report.text.trim_end()
        ]);
    }
    table.printstd();

    let summary = assembly.summary();
    println!(
        "\n{} record(s): {} primary, {} partial; fragments: {} consumed, {} unused; {} empty",
        assembly.records.len(),
        summary.primary,
        summary.partial,
        summary.consumed,
        summary.unused,
        summary.empty
    );

    Ok(())
}

fn line_reports(lines: &[&str], assembly: &Assembly) -> Vec<LineReport> {
    lines
        .iter()
        .zip(assembly.classes.iter().zip(&assembly.states))
        .enumerate()
        .map(|(index, (text, (class, state)))| LineReport {
            index,
            class: class.label(),
            state: *state,
            text: text.to_string(),
        })
        .collect()
}

fn describe_state(state: &LineState) -> String {
    match state {
        LineState::FragmentConsumed { by } => format!("{} by {}", state.label(), by),
        other => other.label().to_string(),
    }
}

use std::path::PathBuf;

use futures::future::join_all;
use petition_core::{DisciplinePair, Extractor, ParseResult, StudentHeader};
use petition_pdf::LayoutOptions;
use serde::Serialize;

use crate::config::Config;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ParseOptions {
    /// Petition PDF files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

/// One successfully extracted document.
#[derive(Debug, Serialize)]
pub struct DocumentOutput {
    pub path: String,
    #[serde(flatten)]
    pub result: ParseResult,
}

pub async fn run(options: ParseOptions, config: Config) -> Result<()> {
    let extractor = config.extractor()?;
    let total = options.paths.len();

    let (documents, failed) = parse_all(options.paths, extractor, config.layout).await;

    match options.format {
        OutputFormat::Json => println!("{}", format_json(&documents)?),
        OutputFormat::Table => {
            for document in &documents {
                println!("{}\n", document.path);
                header_table(&document.result.header).printstd();
                println!();
                if document.result.disciplines.is_empty() {
                    println!("No disciplines extracted.\n");
                } else {
                    records_table(&document.result.disciplines).printstd();
                    println!();
                }
            }
        }
    }

    if failed > 0 {
        return Err(Error::Unreadable { failed, total }.into());
    }
    Ok(())
}

/// Extract every document on the blocking pool, keeping input order.
///
/// Failures are reported on stderr and counted.
pub async fn parse_all(
    paths: Vec<PathBuf>,
    extractor: Extractor,
    layout: LayoutOptions,
) -> (Vec<DocumentOutput>, usize) {
    let tasks = paths.into_iter().map(|path| {
        let extractor = extractor.clone();
        async move {
            let outcome = tokio::task::spawn_blocking({
                let path = path.clone();
                move || petition_pdf::parse_petition_file(&path, &extractor, &layout)
            })
            .await;
            (path, outcome)
        }
    });

    let mut documents = Vec::new();
    let mut failed = 0;

    for (path, outcome) in join_all(tasks).await {
        match outcome {
            Ok(Ok(result)) => {
                log::debug!(
                    "{}: {} discipline(s)",
                    path.display(),
                    result.disciplines.len()
                );
                documents.push(DocumentOutput {
                    path: path.display().to_string(),
                    result,
                });
            }
            Ok(Err(err)) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), err);
            }
            Err(err) => {
                failed += 1;
                eprintln!("{}: extraction task failed: {}", path.display(), err);
            }
        }
    }

    (documents, failed)
}

fn format_json(documents: &[DocumentOutput]) -> Result<String> {
    serde_json::to_string_pretty(documents).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn header_table(header: &StudentHeader) -> prettytable::Table {
    let missing = "(not provided)".to_string();
    let mut table = new_table();
    table.add_row(prettytable::row!["Name", header.name.as_ref().unwrap_or(&missing)]);
    table.add_row(prettytable::row!["DRE", header.dre.as_ref().unwrap_or(&missing)]);
    table.add_row(prettytable::row!["Email", header.email.as_ref().unwrap_or(&missing)]);
    table.add_row(prettytable::row!["Date", header.date.as_ref().unwrap_or(&missing)]);
    table.add_row(prettytable::row![
        "Origin institution",
        header.origin_institution.as_ref().unwrap_or(&missing)
    ]);
    table
}

fn records_table(records: &[DisciplinePair]) -> prettytable::Table {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Line",
        "Destination",
        "Destination name",
        "Origin",
        "Origin name",
        "Year"
    ]);
    for record in records {
        table.add_row(prettytable::row![
            record.line,
            &record.destination.code,
            &record.destination.name,
            &record.origin.code,
            &record.origin.name,
            record.year.as_deref().unwrap_or("")
        ]);
    }
    table
}

use std::path::PathBuf;

use petition_core::report::{render, GridLayout};

use crate::config::Config;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct ReportOptions {
    /// Petition PDF file
    path: PathBuf,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width of both course-name columns, in characters
    #[arg(long)]
    width: Option<usize>,

    /// Body lines per printed page
    #[arg(long)]
    page_lines: Option<usize>,
}

impl ReportOptions {
    /// The configured grid with command-line overrides applied.
    fn grid(&self, base: &GridLayout) -> GridLayout {
        let mut grid = base.clone();
        if let Some(width) = self.width {
            grid.destination_name = width;
            grid.origin_name = width;
        }
        if let Some(page_lines) = self.page_lines {
            grid.page_lines = page_lines;
        }
        grid
    }
}

pub async fn run(options: ReportOptions, config: Config) -> Result<()> {
    let extractor = config.extractor()?;
    let layout = config.layout;
    let grid = options.grid(&config.report);

    let result = tokio::task::spawn_blocking({
        let path = options.path.clone();
        move || petition_pdf::parse_petition_file(&path, &extractor, &layout)
    })
    .await?
    .map_err(|e| eyre!("{}: {}", options.path.display(), e))?;

    let text = render(&result.header, &result.disciplines, &grid);

    match &options.output {
        Some(output) => {
            std::fs::write(output, &text)
                .wrap_err_with(|| format!("cannot write {}", output.display()))?;
            log::info!("report written to {}", output.display());
        }
        None => println!("{text}"),
    }

    Ok(())
}

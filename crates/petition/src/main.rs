use crate::prelude::*;
use clap::Parser;

mod config;
mod error;
mod lines;
mod parse;
mod prelude;
mod report;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Reconstruct course-equivalence tables from transfer-credit petition PDFs"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// TOML file overriding code prefixes, cover labels and layout settings
    #[clap(long, env = "PETITION_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PETITION_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the student header and discipline records
    Parse(crate::parse::ParseOptions),

    /// Show how every table-page line was classified
    Lines(crate::lines::LinesOptions),

    /// Render a printable plain-text report
    Report(crate::report::ReportOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    let config = config::Config::load(app.global.config.as_deref())?;

    match app.command {
        SubCommands::Parse(options) => crate::parse::run(options, config).await,
        SubCommands::Lines(options) => crate::lines::run(options, config).await,
        SubCommands::Report(options) => crate::report::run(options, config).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}

//! Command-line interface for the shelter map exporter.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use shelter_data::{Fetcher, HttpFetcher, HttpFetcherConfig};

mod convert;
mod download;
mod error;

pub use error::CliError;

use convert::{ConvertArgs, run_convert};
use download::{DownloadArgs, run_download};

const ARG_DATA_DIR: &str = "data-dir";
const ARG_FORMAT: &str = "format";
const ARG_MAX_PER_FILE: &str = "max-per-file";
const ARG_USER_AGENT: &str = "user-agent";

const DEFAULT_DATA_DIR: &str = "data";

/// Run the shelter-map CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when arguments or configuration are invalid, or when
/// downloading or exporting a city fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let builder = HttpFetcherBuilder;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Download(args) => run_download(args, &builder, &mut stdout),
        Command::Convert(args) => run_convert(args, &builder, &mut stdout).map(|_| ()),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "shelter-map",
    about = "Download municipal shelter data and export it as map files",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch each city's raw shelter dataset into the data directory.
    Download(DownloadArgs),
    /// Build each city's map from downloaded data and export it.
    Convert(ConvertArgs),
}

/// Builds the fetcher used for one command invocation.
trait FetcherBuilder {
    fn build(&self, user_agent: &str) -> Result<Box<dyn Fetcher>, CliError>;
}

struct HttpFetcherBuilder;

impl FetcherBuilder for HttpFetcherBuilder {
    fn build(&self, user_agent: &str) -> Result<Box<dyn Fetcher>, CliError> {
        let config = HttpFetcherConfig::default().with_user_agent(user_agent);
        let fetcher = HttpFetcher::with_config(config).map_err(CliError::BuildFetcher)?;
        Ok(Box::new(fetcher))
    }
}

#[cfg(test)]
mod tests;

//! Download command: fetch every city's raw dataset.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use shelter_data::{City, Fetcher, all_cities, fair_user_agent};

use crate::{ARG_DATA_DIR, ARG_USER_AGENT, CliError, DEFAULT_DATA_DIR, FetcherBuilder};

/// CLI arguments for the `download` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Download the raw shelter datasets published by each \
                 supported municipality. Files are written verbatim into \
                 the data directory, which is created when missing.",
    about = "Download raw shelter datasets"
)]
#[ortho_config(prefix = "SHELTER")]
pub(crate) struct DownloadArgs {
    /// Directory receiving the raw downloads.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// User-Agent header sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl DownloadArgs {
    pub(crate) fn into_config(self) -> Result<DownloadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(DownloadConfig::from(merged))
    }
}

/// Resolved `download` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownloadConfig {
    pub(crate) data_dir: Utf8PathBuf,
    pub(crate) user_agent: String,
}

impl From<DownloadArgs> for DownloadConfig {
    fn from(args: DownloadArgs) -> Self {
        Self {
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            user_agent: args.user_agent.unwrap_or_else(fair_user_agent),
        }
    }
}

pub(super) fn run_download(
    args: DownloadArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let fetcher = builder.build(&config.user_agent)?;
    download_cities(&config, &all_cities(), fetcher.as_ref(), writer)
}

pub(super) fn download_cities(
    config: &DownloadConfig,
    cities: &[Box<dyn City>],
    fetcher: &dyn Fetcher,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    for city in cities {
        log::info!("Downloading {} data into {}", city.name(), config.data_dir);
        city.download(fetcher, &config.data_dir)
            .map_err(|source| CliError::City {
                city: city.name(),
                source,
            })?;
    }
    writeln!(writer, "Done").map_err(CliError::WriteOutput)
}

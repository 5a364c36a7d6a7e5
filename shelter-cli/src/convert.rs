//! Convert command: build each city's map and export it.

use std::io::Write;
use std::num::NonZeroUsize;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use shelter_core::export::DEFAULT_MAX_PER_FILE;
use shelter_core::{CombinedDigest, ExportFormat, ExportOptions, MapDigest, export_map};
use shelter_data::{City, Fetcher, all_cities, fair_user_agent};

use crate::{
    ARG_DATA_DIR, ARG_FORMAT, ARG_MAX_PER_FILE, ARG_USER_AGENT, CliError, DEFAULT_DATA_DIR,
    FetcherBuilder,
};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Build a shelter map for each supported city from the raw \
                 files in the data directory and export it as CSV, KML or \
                 KMZ. Large maps are split across numbered files. Icons \
                 referenced by the raw data may be downloaded.",
    about = "Export shelter maps from downloaded data"
)]
#[ortho_config(prefix = "SHELTER")]
pub(crate) struct ConvertArgs {
    /// Directory holding the raw downloads; exports are written here too.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// Output format: csv, kml or kmz.
    #[arg(long = ARG_FORMAT, value_name = "format")]
    #[serde(default)]
    pub(crate) format: Option<String>,
    /// Maximum number of places per output file.
    #[arg(long = ARG_MAX_PER_FILE, value_name = "count")]
    #[serde(default)]
    pub(crate) max_per_file: Option<usize>,
    /// User-Agent header sent when downloading icons.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    pub(crate) data_dir: Utf8PathBuf,
    pub(crate) format: ExportFormat,
    pub(crate) max_per_file: NonZeroUsize,
    pub(crate) user_agent: String,
}

impl ConvertConfig {
    pub(crate) fn validate_data_dir(&self) -> Result<(), CliError> {
        match shelter_fs::dir_exists(&self.data_dir) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::MissingDataDir {
                field: ARG_DATA_DIR,
                path: self.data_dir.clone(),
            }),
            Err(source) => Err(CliError::InspectDataDir {
                field: ARG_DATA_DIR,
                path: self.data_dir.clone(),
                source,
            }),
        }
    }

    fn export_options(&self, city: &dyn City) -> ExportOptions {
        ExportOptions::new(city.series_name(), self.data_dir.clone(), city.base_name())
            .with_format(self.format)
            .with_max_per_file(self.max_per_file)
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let format = match args.format.as_deref() {
            Some(requested) => requested.parse::<ExportFormat>()?,
            None => ExportFormat::default(),
        };
        let max_per_file = match args.max_per_file {
            Some(count) => NonZeroUsize::new(count).ok_or(CliError::InvalidChunkSize {
                field: ARG_MAX_PER_FILE,
            })?,
            None => DEFAULT_MAX_PER_FILE,
        };
        Ok(Self {
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            format,
            max_per_file,
            user_agent: args.user_agent.unwrap_or_else(fair_user_agent),
        })
    }
}

pub(super) fn run_convert(
    args: ConvertArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<MapDigest, CliError> {
    run_convert_with(args, &all_cities(), builder, writer)
}

pub(super) fn run_convert_with(
    args: ConvertArgs,
    cities: &[Box<dyn City>],
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<MapDigest, CliError> {
    let config = resolve_convert_config(args)?;
    let fetcher = builder.build(&config.user_agent)?;
    export_cities(&config, cities, fetcher.as_ref(), writer)
}

fn resolve_convert_config(args: ConvertArgs) -> Result<ConvertConfig, CliError> {
    let config = args.into_config()?;
    config.validate_data_dir()?;
    Ok(config)
}

/// Export every city in order and report the files and digests written.
///
/// Returns the combined digest over the per-city digests.
pub(super) fn export_cities(
    config: &ConvertConfig,
    cities: &[Box<dyn City>],
    fetcher: &dyn Fetcher,
    writer: &mut dyn Write,
) -> Result<MapDigest, CliError> {
    let mut combined = CombinedDigest::new();
    for city in cities {
        let name = city.name();
        let map = city
            .generate_map(fetcher, &config.data_dir)
            .map_err(|source| CliError::City { city: name, source })?;
        log::info!(
            "{name}: {} places, {} icons",
            map.places().len(),
            map.icons().len()
        );
        let report = export_map(&map, &config.export_options(city.as_ref()))
            .map_err(|source| CliError::Export { city: name, source })?;

        for file in &report.files {
            writeln!(writer, "Output to: {}", file.path).map_err(CliError::WriteOutput)?;
        }
        let last_name = report
            .last_file()
            .and_then(Utf8Path::file_name)
            .unwrap_or_default();
        writeln!(writer, "Hash: {last_name}:{}", report.digest).map_err(CliError::WriteOutput)?;
        combined.update(&report.digest);
    }

    let digest = combined.finalize();
    writeln!(writer, "Combined hash: {digest}").map_err(CliError::WriteOutput)?;
    Ok(digest)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ConvertConfig, CliError> {
    let merged = ConvertArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ConvertConfig::try_from(merged)
}

//! Error types emitted by the shelter-map CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use shelter_core::{ExportError, UnsupportedFormat};
use shelter_data::{CityError, FetchError};
use thiserror::Error;

/// Errors emitted by the shelter-map CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The requested output format is not one of csv, kml or kmz.
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    /// The chunk size must allow at least one place per file.
    #[error("{field} must be at least 1")]
    InvalidChunkSize { field: &'static str },
    /// The data directory does not exist or is not a directory.
    #[error("{field} path {path:?} is not a directory")]
    MissingDataDir {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// The data directory could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectDataDir {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Constructing the HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    BuildFetcher(#[source] FetchError),
    /// Downloading or ingesting a city's data failed.
    #[error("{city}: {source}")]
    City {
        city: &'static str,
        #[source]
        source: CityError,
    },
    /// Exporting a city's map failed.
    #[error("{city}: {source}")]
    Export {
        city: &'static str,
        #[source]
        source: ExportError,
    },
    /// Writing the run summary failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

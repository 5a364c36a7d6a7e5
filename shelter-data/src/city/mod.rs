//! Municipal source adapters.
//!
//! Each [`City`] knows how to download its raw dataset into a data directory
//! and how to turn those files into a normalized [`Map`].

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use shelter_core::{Map, format_float};
use thiserror::Error;

use crate::fetch::{FetchError, Fetcher};

mod jerusalem;
mod tel_aviv;

pub use jerusalem::Jerusalem;
pub use tel_aviv::TelAviv;

/// Errors raised while downloading or ingesting a city's data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CityError {
    /// A download failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A downloaded icon had no `Content-Type` header.
    #[error("response from {url} has no content type")]
    MissingContentType { url: String },
    /// A URL could not be built.
    #[error("invalid URL {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// A raw file could not be read.
    #[error("failed to read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A raw file could not be written.
    #[error("failed to write {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A raw file was not valid JSON of the expected shape.
    #[error("failed to parse {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The data parsed but did not match what the adapter understands.
    #[error("unexpected data in {path}: {message}")]
    Schema { path: Utf8PathBuf, message: String },
    /// A coordinate could not be read as a number.
    #[error("invalid coordinate {value:?} in {path}")]
    Coordinate { path: Utf8PathBuf, value: String },
}

/// A municipality publishing shelter locations.
pub trait City {
    /// Display name, e.g. `Tel Aviv`.
    fn name(&self) -> &'static str;

    /// Identifier used in file names, e.g. `tel_aviv`.
    fn slug(&self) -> &'static str;

    /// Download the raw dataset into `data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CityError`] if a request fails or a file cannot be written.
    fn download(&self, fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<(), CityError>;

    /// Build the normalized map from the files in `data_dir`.
    ///
    /// `fetcher` is used for auxiliary downloads such as icon images.
    ///
    /// # Errors
    ///
    /// Returns [`CityError`] if the raw files are missing or malformed.
    fn generate_map(&self, fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<Map, CityError>;

    /// Title of the exported documents.
    fn series_name(&self) -> String {
        format!("{} Shelters", self.name())
    }

    /// Base name of the exported files.
    fn base_name(&self) -> String {
        format!("{}_shelters", self.slug())
    }
}

/// Every supported city, in processing order.
#[must_use]
pub fn all_cities() -> Vec<Box<dyn City>> {
    vec![Box::new(Jerusalem), Box::new(TelAviv)]
}

/// Render a JSON value the way the municipal portals display it.
///
/// Strings are used verbatim, integers have no fraction, floats use their
/// shortest form, and booleans and null read `True`, `False` and `None`.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number
            .as_i64()
            .map(|int| int.to_string())
            .or_else(|| number.as_u64().map(|int| int.to_string()))
            .or_else(|| number.as_f64().map(format_float))
            .unwrap_or_else(|| number.to_string()),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Whether a JSON value counts as present: not null, zero, empty or false.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Parse a coordinate held as a JSON number or numeric string.
pub(crate) fn parse_coordinate(value: &Value, path: &Utf8Path) -> Result<f64, CityError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| CityError::Coordinate {
        path: path.to_path_buf(),
        value: display_value(value),
    })
}

#[cfg(test)]
mod behaviour;

//! Facade crate for the shelter map exporter.
//!
//! This crate re-exports the normalized map model and export engine, and
//! exposes the municipal source adapters behind the `cities` feature.

#![forbid(unsafe_code)]

pub use shelter_core::{
    CombinedDigest, ExportError, ExportFormat, ExportOptions, ExportReport, Icon, IconId,
    IconMode, Map, MapDigest, MapView, Place, UnsupportedFormat, export_map, map_digest,
};

#[cfg(feature = "cities")]
pub use shelter_data::{City, CityError, DataUrlCache, Fetcher, HttpFetcher, all_cities};

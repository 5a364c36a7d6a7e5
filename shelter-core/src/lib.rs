//! Export engine for normalized shelter maps.
//!
//! A [`Map`] holds an ordered set of [`Icon`]s and an ordered set of
//! [`Place`]s that refer to those icons by [`IconId`]. The engine turns a map
//! into CSV, KML or KMZ files, splitting large maps into numbered chunks, and
//! reports a SHA-256 [`MapDigest`] of the full map for change detection.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use shelter_core::{Icon, Map, Place, csv_export::to_csv};
//!
//! let mut map = Map::new();
//! let icon = map.add_icon(Icon::new("A", "http://x/a.png"));
//! map.push_place(Place::new(
//!     "P1",
//!     vec![("k".into(), "v".into())],
//!     icon,
//!     Coord { x: 35.0, y: 31.0 },
//! ));
//!
//! let csv = to_csv(map.view()).expect("encode");
//! assert!(csv.ends_with(b"P1,31.0,35.0,k: v\r\n"));
//! ```

#![forbid(unsafe_code)]

pub mod csv_export;
pub mod data_url;
pub mod digest;
pub mod export;
pub mod kml;
pub mod kmz;
mod model;
mod number;

pub use digest::{CombinedDigest, MapDigest, map_digest};
pub use export::{
    ExportError, ExportFormat, ExportOptions, ExportReport, ExportedFile, UnsupportedFormat,
    export_map,
};
pub use kml::IconMode;
pub use model::{Icon, IconId, Map, MapView, Place};
pub use number::format_float;

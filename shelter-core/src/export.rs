//! Multi-file export orchestration.
//!
//! A [`Map`] is split into contiguous runs of at most `max_per_file` places.
//! Each run is rendered with the full icon set in the requested
//! [`ExportFormat`] and written under the output directory. The digest
//! reported for the export covers the whole map, so changing the chunk size
//! never changes it.

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::csv_export::{CsvExportError, to_csv};
use crate::digest::{MapDigest, map_digest};
use crate::kml::{IconMode, KmlError, to_kml};
use crate::kmz::{KmzError, package_kmz};
use crate::model::{Map, MapView};

/// Default upper bound on places per output file.
pub const DEFAULT_MAX_PER_FILE: NonZeroUsize = match NonZeroUsize::new(2000) {
    Some(value) => value,
    None => NonZeroUsize::MIN,
};

/// Output format of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// Comma-separated values; no icon information.
    Csv,
    /// Single KML document with icons embedded.
    #[default]
    Kml,
    /// Zip archive holding `doc.kml` and extracted icon images.
    Kmz,
}

impl ExportFormat {
    /// Every supported format.
    pub const ALL: [Self; 3] = [Self::Csv, Self::Kml, Self::Kmz];

    /// File extension, which doubles as the format's name.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Kml => "kml",
            Self::Kmz => "kmz",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A format name outside `csv`, `kml` and `kmz`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported export format {requested:?}; expected one of csv, kml, kmz")]
pub struct UnsupportedFormat {
    pub requested: String,
}

impl FromStr for ExportFormat {
    type Err = UnsupportedFormat;

    /// Parse a format name, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use shelter_core::ExportFormat;
    ///
    /// assert_eq!("KMZ".parse::<ExportFormat>(), Ok(ExportFormat::Kmz));
    /// assert!("gpx".parse::<ExportFormat>().is_err());
    /// ```
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnsupportedFormat {
                requested: value.to_owned(),
            })
    }
}

/// Parameters of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Human-readable document title; numbered per file when split.
    pub series_name: String,
    pub out_dir: Utf8PathBuf,
    /// File name without extension or chunk suffix.
    pub base_name: String,
    pub format: ExportFormat,
    pub max_per_file: NonZeroUsize,
}

impl ExportOptions {
    /// Options for a KML export with the default chunk size.
    pub fn new(
        series_name: impl Into<String>,
        out_dir: impl Into<Utf8PathBuf>,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            series_name: series_name.into(),
            out_dir: out_dir.into(),
            base_name: base_name.into(),
            format: ExportFormat::default(),
            max_per_file: DEFAULT_MAX_PER_FILE,
        }
    }

    #[must_use]
    pub const fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn with_max_per_file(mut self, max_per_file: NonZeroUsize) -> Self {
        self.max_per_file = max_per_file;
        self
    }
}

/// One output file of a planned export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// 1-based file number.
    pub index: usize,
    /// Places assigned to this file.
    pub range: Range<usize>,
    /// Whether names and titles carry the file number.
    pub numbered: bool,
}

impl ChunkPlan {
    /// File name for this chunk, e.g. `shelters.2.kml`.
    #[must_use]
    pub fn file_name(&self, base_name: &str, format: ExportFormat) -> String {
        if self.numbered {
            format!("{base_name}.{}.{format}", self.index)
        } else {
            format!("{base_name}.{format}")
        }
    }

    /// Document title for this chunk, e.g. `Tel Aviv (2)`.
    #[must_use]
    pub fn title(&self, series_name: &str) -> String {
        if self.numbered {
            format!("{series_name} ({})", self.index)
        } else {
            series_name.to_owned()
        }
    }
}

/// Split `total` places into contiguous runs of at most `max_per_file`.
///
/// At least one chunk is always planned, so an empty map still produces a
/// file carrying its icons.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
/// use shelter_core::export::plan_chunks;
///
/// let max = NonZeroUsize::new(2).expect("non-zero");
/// let ranges: Vec<_> = plan_chunks(5, max).into_iter().map(|c| c.range).collect();
/// assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
/// ```
#[must_use]
pub fn plan_chunks(total: usize, max_per_file: NonZeroUsize) -> Vec<ChunkPlan> {
    let max = max_per_file.get();
    let count = total.div_ceil(max).max(1);
    (0..count)
        .map(|position| {
            let start = position.saturating_mul(max);
            let end = start.saturating_add(max).min(total);
            ChunkPlan {
                index: position + 1,
                range: start.min(end)..end,
                numbered: count > 1,
            }
        })
        .collect()
}

/// A written output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: Utf8PathBuf,
    /// Number of places the file holds.
    pub places: usize,
}

/// Outcome of [`export_map`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Files in write order.
    pub files: Vec<ExportedFile>,
    /// Digest of the full, unsplit map.
    pub digest: MapDigest,
}

impl ExportReport {
    /// The last file written.
    #[must_use]
    pub fn last_file(&self) -> Option<&Utf8Path> {
        self.files.last().map(|file| file.path.as_path())
    }
}

/// Errors raised while exporting a map.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Encoding a CSV chunk failed.
    #[error(transparent)]
    Csv(#[from] CsvExportError),
    /// Building a KML document failed, e.g. an undecodable icon.
    #[error(transparent)]
    Kml(#[from] KmlError),
    /// Packaging a KMZ archive failed.
    #[error(transparent)]
    Kmz(#[from] KmzError),
    /// Creating the output directory or writing a file failed.
    #[error("failed to write {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Encode `view` as a complete file in `format`, titled `title`.
///
/// # Errors
///
/// Propagates the encoder's failure; see [`ExportError`].
pub fn render(view: MapView<'_>, title: &str, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => Ok(to_csv(view)?),
        ExportFormat::Kml => Ok(to_kml(view, title, IconMode::Embedded)?.contents),
        ExportFormat::Kmz => {
            let document = to_kml(view, title, IconMode::Referenced)?;
            Ok(package_kmz(&document.contents, &document.attachments)?)
        }
    }
}

/// Export `map` according to `options`, writing one or more files.
///
/// # Errors
///
/// Returns [`ExportError`] if encoding fails or a file cannot be written.
/// Files written before the failure are left in place.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use shelter_core::{ExportOptions, Map, export_map};
///
/// let dir = tempfile::tempdir().expect("tempdir");
/// let out = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
/// let report = export_map(&Map::new(), &ExportOptions::new("Empty", out, "empty"))
///     .expect("export");
/// assert_eq!(report.files.len(), 1);
/// ```
pub fn export_map(map: &Map, options: &ExportOptions) -> Result<ExportReport, ExportError> {
    let view = map.view();
    let plans = plan_chunks(view.places().len(), options.max_per_file);
    let mut files = Vec::with_capacity(plans.len());

    for plan in plans {
        let chunk = view
            .chunk(plan.range.clone())
            .unwrap_or_else(|| MapView::new(view.icons(), &[]));
        let contents = render(chunk, &plan.title(&options.series_name), options.format)?;
        let path = options
            .out_dir
            .join(plan.file_name(&options.base_name, options.format));
        shelter_fs::write_file(&path, &contents).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!("Wrote {path} ({} places)", chunk.places().len());
        files.push(ExportedFile {
            path,
            places: chunk.places().len(),
        });
    }

    Ok(ExportReport {
        files,
        digest: map_digest(view),
    })
}

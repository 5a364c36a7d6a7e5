//! KMZ packaging: a deflate-compressed zip holding `doc.kml` and its images.

use std::io::{Cursor, Write};

use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::kml::Attachment;

/// Archive entry holding the KML document.
pub const KML_ENTRY_NAME: &str = "doc.kml";

/// Errors raised while assembling a KMZ archive.
#[derive(Debug, Error)]
pub enum KmzError {
    /// Opening a new archive entry failed.
    #[error("failed to start archive entry {name:?}")]
    StartEntry {
        name: String,
        #[source]
        source: ZipError,
    },
    /// Writing an entry's contents failed.
    #[error("failed to write archive entry {name:?}")]
    WriteEntry {
        name: String,
        #[source]
        source: std::io::Error,
    },
    /// Writing the central directory failed.
    #[error("failed to finalise KMZ archive")]
    Finish(#[source] ZipError),
}

/// Package `kml` and its attachments into an in-memory KMZ archive.
///
/// `doc.kml` is written first, followed by each attachment at its relative
/// path. Entries carry a fixed timestamp so identical inputs produce
/// identical archives.
///
/// # Errors
///
/// Returns [`KmzError`] if the zip writer fails.
///
/// # Examples
/// ```
/// use shelter_core::kmz::package_kmz;
///
/// let archive = package_kmz(b"<kml/>", &[]).expect("package");
/// assert!(archive.starts_with(b"PK"));
/// ```
pub fn package_kmz(kml: &[u8], attachments: &[Attachment]) -> Result<Vec<u8>, KmzError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));

    write_entry(&mut archive, KML_ENTRY_NAME, kml, options)?;
    for attachment in attachments {
        write_entry(&mut archive, &attachment.path, &attachment.contents, options)?;
    }

    let cursor = archive.finish().map_err(KmzError::Finish)?;
    Ok(cursor.into_inner())
}

fn write_entry(
    archive: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    contents: &[u8],
    options: SimpleFileOptions,
) -> Result<(), KmzError> {
    archive
        .start_file(name, options)
        .map_err(|source| KmzError::StartEntry {
            name: name.to_owned(),
            source,
        })?;
    archive
        .write_all(contents)
        .map_err(|source| KmzError::WriteEntry {
            name: name.to_owned(),
            source,
        })
}

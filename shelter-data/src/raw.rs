//! On-disk store for raw downloads.
//!
//! Downloads are saved verbatim under the data directory. Their modification
//! time doubles as the dataset's update date shown in place descriptions.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::CityError;

/// Write `contents` to `data_dir/file_name`, creating the directory.
///
/// # Errors
///
/// Returns [`CityError::Write`] with the target path on failure.
pub fn save(data_dir: &Utf8Path, file_name: &str, contents: &[u8]) -> Result<Utf8PathBuf, CityError> {
    let path = data_dir.join(file_name);
    shelter_fs::write_file(&path, contents).map_err(|source| CityError::Write {
        path: path.clone(),
        source,
    })?;
    log::debug!("Saved {} bytes to {path}", contents.len());
    Ok(path)
}

/// Read and deserialise a JSON document.
///
/// # Errors
///
/// Returns [`CityError::Read`] if the file cannot be read, or
/// [`CityError::Parse`] if it is not valid JSON of the expected shape.
pub fn load_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, CityError> {
    log::debug!("Reading: {path}");
    let bytes = shelter_fs::read_file(path).map_err(|source| CityError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| CityError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The file's modification date in UTC, formatted `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`CityError::Read`] if the file metadata cannot be read.
pub fn update_date(path: &Utf8Path) -> Result<String, CityError> {
    let modified = shelter_fs::modified_time(path).map_err(|source| CityError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let date = DateTime::<Utc>::from(modified).date_naive();
    Ok(date.format("%Y-%m-%d").to_string())
}

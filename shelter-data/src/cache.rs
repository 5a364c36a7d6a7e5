//! Memoised conversion of remote icon URLs into `data:` URLs.

use std::collections::HashMap;

use shelter_core::data_url;
use url::Url;

use crate::CityError;
use crate::fetch::{Fetcher, HttpRequest};

/// Per-run cache of downloaded icons, keyed by source URL.
///
/// Each URL is fetched at most once; later lookups reuse the encoded result.
/// The cache is owned by a single ingestion run and dropped with it.
#[derive(Debug, Default)]
pub struct DataUrlCache {
    entries: HashMap<String, String>,
}

impl DataUrlCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `url` as `data:{content-type};base64,{payload}`.
    ///
    /// # Errors
    ///
    /// Returns [`CityError::Fetch`] if the download fails, or
    /// [`CityError::MissingContentType`] if the server omits the header.
    pub fn resolve(&mut self, fetcher: &dyn Fetcher, url: &Url) -> Result<String, CityError> {
        if let Some(cached) = self.entries.get(url.as_str()) {
            return Ok(cached.clone());
        }

        let response = fetcher.fetch(&HttpRequest::get(url.clone()))?;
        let content_type =
            response
                .content_type
                .ok_or_else(|| CityError::MissingContentType {
                    url: url.to_string(),
                })?;
        let encoded = data_url::encode(&content_type, &response.body);
        self.entries.insert(url.to_string(), encoded.clone());
        Ok(encoded)
    }

    /// Number of distinct URLs resolved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

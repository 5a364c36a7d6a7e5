//! Source adapters turning municipal shelter datasets into normalized maps.
//!
//! Responsibilities:
//! - Download raw datasets into a data directory.
//! - Parse each city's JSON into a [`shelter_core::Map`].
//! - Embed remote icon images as data URLs.
//!
//! Boundaries:
//! - Export formats and hashing live in `shelter-core`.
//! - Network access goes through [`Fetcher`] so adapters can be tested
//!   without it.

mod cache;
mod city;
mod fetch;
pub mod raw;

#[doc(hidden)]
pub mod test_support;

pub use cache::DataUrlCache;
pub use city::{City, CityError, Jerusalem, TelAviv, all_cities};
pub use fetch::{
    FetchError, Fetcher, HttpFetcher, HttpFetcherConfig, HttpRequest, HttpResponse,
    fair_user_agent,
};

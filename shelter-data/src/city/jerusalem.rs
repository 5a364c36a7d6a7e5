//! Jerusalem: shelters from the municipal interactive map API.
//!
//! The API returns one group per shelter category, each with a relative
//! icon path and its member locations. Icons are downloaded once and
//! embedded as data URLs.

use std::collections::HashSet;

use camino::Utf8Path;
use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use shelter_core::{Icon, Map, Place};
use url::Url;

use super::{City, CityError, display_value, parse_coordinate};
use crate::cache::DataUrlCache;
use crate::fetch::{Fetcher, HttpRequest};
use crate::raw;

const BASE_URL: &str = "https://www.jerusalem.muni.il/umbraco/api/map/GetMapById";
const REQUEST_BODY: &str = r#"{"Culture":"he-IL","Id":5502}"#;
const JSON_NAME: &str = "jerusalem_shelters.json";

const ADDRESS_LABEL: &str = "כתובת";
const UPDATED_LABEL: &str = "תאריך עדכון";

/// The Jerusalem municipality.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jerusalem;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Group {
    name: String,
    icon: String,
    #[serde(default)]
    map_filters_children: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Item {
    #[serde(default)]
    name: Value,
    #[serde(default)]
    address: Value,
    #[serde(default)]
    longitude: Value,
    #[serde(default)]
    latitude: Value,
}

fn base_url() -> Result<Url, CityError> {
    Url::parse(BASE_URL).map_err(|source| CityError::InvalidUrl {
        url: BASE_URL.to_owned(),
        source,
    })
}

/// Coordinate text as published; the API sometimes appends commas to it.
fn coordinate_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim_end_matches(',').to_owned(),
        other => display_value(other),
    }
}

impl City for Jerusalem {
    fn name(&self) -> &'static str {
        "Jerusalem"
    }

    fn slug(&self) -> &'static str {
        "jerusalem"
    }

    fn download(&self, fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<(), CityError> {
        let request = HttpRequest::post(base_url()?, REQUEST_BODY)
            .with_header("content-type", "application/json; charset=UTF-8");
        log::info!("Downloading: {BASE_URL} {REQUEST_BODY}");
        let response = fetcher.fetch(&request)?;
        raw::save(data_dir, JSON_NAME, &response.body)?;
        Ok(())
    }

    fn generate_map(&self, fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<Map, CityError> {
        let json_path = data_dir.join(JSON_NAME);
        let groups: Vec<Group> = raw::load_json(&json_path)?;
        let update_date = raw::update_date(&json_path)?;
        log::debug!("Loaded. Update date: {update_date}");

        let base = base_url()?;
        let mut cache = DataUrlCache::new();
        let mut map = Map::new();
        let mut seen = HashSet::new();
        let mut entries = 0_usize;

        for group in &groups {
            let icon_url = base.join(&group.icon).map_err(|source| CityError::InvalidUrl {
                url: group.icon.clone(),
                source,
            })?;
            let icon = map.add_icon(Icon::new(&group.name, cache.resolve(fetcher, &icon_url)?));

            for item in &group.map_filters_children {
                entries += 1;
                let lon = coordinate_text(&item.longitude);
                let lat = coordinate_text(&item.latitude);
                if lon.is_empty() || lat.is_empty() {
                    continue;
                }

                let address = display_value(&item.address);
                if !seen.insert((lat.clone(), lon.clone(), address.clone())) {
                    continue;
                }

                let location = Coord {
                    x: parse_coordinate(&Value::String(lon), &json_path)?,
                    y: parse_coordinate(&Value::String(lat), &json_path)?,
                };
                map.push_place(Place::new(
                    format!("{} ({})", display_value(&item.name), group.name),
                    vec![
                        (ADDRESS_LABEL.to_owned(), address),
                        (UPDATED_LABEL.to_owned(), update_date.clone()),
                    ],
                    icon,
                    location,
                ));
            }
        }

        log::debug!(
            "Number of entries: {entries}, unique places: {}, icons: {}",
            map.places().len(),
            map.icons().len()
        );
        Ok(map)
    }
}

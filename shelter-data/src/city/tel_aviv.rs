//! Tel Aviv-Yafo: public shelters from the municipal ArcGIS map server.
//!
//! Two files are downloaded: the feature query result and the layer
//! metadata. Icons come from the layer's unique-value renderer, keyed by
//! shelter type (`t_sug`), and are already embedded as PNG data.

use std::collections::HashMap;

use camino::Utf8Path;
use geo::Coord;
use serde::Deserialize;
use serde_json::{Map as JsonObject, Value};
use shelter_core::{Icon, IconId, Map, Place};
use url::Url;

use super::{City, CityError, display_value, is_truthy, parse_coordinate};
use crate::fetch::{Fetcher, HttpRequest};
use crate::raw;

const BASE_URL: &str = "https://gisn.tel-aviv.gov.il/arcgis/rest/services/IView2/MapServer";
const LAYER: &str = "592";
const RECORD_LIMIT: u32 = 5_000;
const SHELTERS_JSON: &str = "tel_aviv_shelters.json";
const SHELTERS_META_JSON: &str = "tel_aviv_shelters_meta.json";

/// Attribute holding the shelter type; drives both name and icon.
const TYPE_FIELD: &str = "t_sug";
const ADDRESS_FIELD: &str = "Full_Address";
const UNKNOWN_NAME: &str = "Unknown Location";

/// How a description field is labelled and rendered.
enum FieldLabel {
    /// Use the layer's field alias and the raw value.
    Alias,
    /// Use a fixed label, and append `suffix` to the value.
    Fixed { label: &'static str, suffix: &'static str },
}

/// Description fields in rendering order.
static DESCRIPTION_FIELDS: [(&str, FieldLabel); 8] = [
    (TYPE_FIELD, FieldLabel::Fixed { label: "סוג", suffix: "" }),
    ("hearot", FieldLabel::Alias),
    ("pail", FieldLabel::Alias),
    ("is_open", FieldLabel::Alias),
    ("maneger_name", FieldLabel::Alias),
    ("shetach_mr", FieldLabel::Fixed { label: "שטח", suffix: " מר" }),
    ("ms_miklat", FieldLabel::Alias),
    ("date_import", FieldLabel::Alias),
];

/// The Tel Aviv-Yafo municipality.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelAviv;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    field_aliases: HashMap<String, String>,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    attributes: JsonObject<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerMeta {
    drawing_info: DrawingInfo,
}

#[derive(Debug, Deserialize)]
struct DrawingInfo {
    renderer: Renderer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Renderer {
    field1: Option<String>,
    default_label: String,
    default_symbol: Symbol,
    #[serde(default)]
    unique_value_infos: Vec<UniqueValueInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Symbol {
    content_type: String,
    image_data: String,
}

impl Symbol {
    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.image_data)
    }
}

#[derive(Debug, Deserialize)]
struct UniqueValueInfo {
    value: Value,
    label: String,
    symbol: Symbol,
}

/// Icons of the renderer plus the type value each one stands for.
///
/// The default symbol is stored under `null`, so records without a known
/// type fall back to it.
struct IconTable {
    map: Map,
    keys: Vec<Value>,
}

impl IconTable {
    fn from_renderer(renderer: &Renderer) -> Self {
        let mut table = Self {
            map: Map::new(),
            keys: Vec::new(),
        };
        table.insert(
            Value::Null,
            Icon::new(&renderer.default_label, renderer.default_symbol.data_url()),
        );
        for info in &renderer.unique_value_infos {
            table.insert(
                info.value.clone(),
                Icon::new(&info.label, info.symbol.data_url()),
            );
        }
        table
    }

    /// Add an icon for `key`; a repeated key replaces the earlier icon in place.
    fn insert(&mut self, key: Value, icon: Icon) {
        match self.keys.iter().position(|existing| *existing == key) {
            Some(index) => {
                self.map.replace_icon(IconId::new(index), icon);
            }
            None => {
                self.map.add_icon(icon);
                self.keys.push(key);
            }
        }
    }

    fn lookup(&self, key: &Value) -> IconId {
        let index = self
            .keys
            .iter()
            .position(|existing| existing == key)
            .unwrap_or(0);
        IconId::new(index)
    }
}

fn query_url() -> Result<Url, CityError> {
    let base = format!("{BASE_URL}/{LAYER}/query");
    let limit = RECORD_LIMIT.to_string();
    Url::parse_with_params(
        &base,
        [
            ("f", "json"),
            ("resultOffset", "0"),
            ("resultRecordCount", limit.as_str()),
            ("where", "1=1"),
            ("orderByFields", ""),
            ("outFields", "*"),
            ("returnGeometry", "False"),
            ("spatialRel", "esriSpatialRelIntersects"),
        ],
    )
    .map_err(|source| CityError::InvalidUrl { url: base, source })
}

fn meta_url() -> Result<Url, CityError> {
    let base = format!("{BASE_URL}/{LAYER}");
    Url::parse_with_params(&base, [("f", "pjson")])
        .map_err(|source| CityError::InvalidUrl { url: base, source })
}

fn attribute<'a>(attrs: &'a JsonObject<String, Value>, field: &str) -> &'a Value {
    attrs.get(field).unwrap_or(&Value::Null)
}

fn place_name(attrs: &JsonObject<String, Value>) -> String {
    let parts: Vec<String> = [TYPE_FIELD, ADDRESS_FIELD]
        .into_iter()
        .map(|field| attribute(attrs, field))
        .filter(|value| is_truthy(value))
        .map(display_value)
        .collect();
    if parts.is_empty() {
        UNKNOWN_NAME.to_owned()
    } else {
        parts.join(" ")
    }
}

fn description(
    attrs: &JsonObject<String, Value>,
    aliases: &HashMap<String, String>,
) -> Vec<(String, String)> {
    DESCRIPTION_FIELDS
        .iter()
        .filter_map(|(field, label)| {
            let value = attribute(attrs, field);
            if value.is_null() {
                return None;
            }
            let rendered = display_value(value);
            Some(match label {
                FieldLabel::Alias => (
                    aliases
                        .get(*field)
                        .cloned()
                        .unwrap_or_else(|| (*field).to_owned()),
                    rendered,
                ),
                FieldLabel::Fixed { label, suffix } => {
                    ((*label).to_owned(), format!("{rendered}{suffix}"))
                }
            })
        })
        .collect()
}

impl City for TelAviv {
    fn name(&self) -> &'static str {
        "Tel Aviv"
    }

    fn slug(&self) -> &'static str {
        "tel_aviv"
    }

    fn download(&self, fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<(), CityError> {
        let query = query_url()?;
        log::info!("Downloading data: {query}");
        let data = fetcher.fetch(&HttpRequest::get(query))?;
        raw::save(data_dir, SHELTERS_JSON, &data.body)?;

        let meta = meta_url()?;
        log::info!("Downloading metadata: {meta}");
        let metadata = fetcher.fetch(&HttpRequest::get(meta))?;
        raw::save(data_dir, SHELTERS_META_JSON, &metadata.body)?;
        Ok(())
    }

    fn generate_map(&self, _fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<Map, CityError> {
        let data_path = data_dir.join(SHELTERS_JSON);
        let meta_path = data_dir.join(SHELTERS_META_JSON);
        let data: QueryResult = raw::load_json(&data_path)?;
        let meta: LayerMeta = raw::load_json(&meta_path)?;
        let update_date = raw::update_date(&data_path)?;
        log::debug!("Loaded. Update date: {update_date}");

        let renderer = &meta.drawing_info.renderer;
        if renderer.field1.as_deref() != Some(TYPE_FIELD) {
            return Err(CityError::Schema {
                path: meta_path,
                message: format!(
                    "renderer keyed by {:?}, expected {TYPE_FIELD:?}",
                    renderer.field1
                ),
            });
        }

        let mut icons = IconTable::from_renderer(renderer);
        for feature in &data.features {
            let attrs = &feature.attributes;
            let (lat, lon) = (attribute(attrs, "lat"), attribute(attrs, "lon"));
            if !is_truthy(lat) || !is_truthy(lon) {
                continue;
            }
            let location = Coord {
                x: parse_coordinate(lon, &data_path)?,
                y: parse_coordinate(lat, &data_path)?,
            };
            icons.map.push_place(Place::new(
                place_name(attrs),
                description(attrs, &data.field_aliases),
                icons.lookup(attribute(attrs, TYPE_FIELD)),
                location,
            ));
        }

        let map = icons.map;
        log::debug!(
            "Number of places: {}, icons: {}",
            map.places().len(),
            map.icons().len()
        );
        Ok(map)
    }
}

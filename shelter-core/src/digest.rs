//! Deterministic content digests for change detection between downloads.
//!
//! A map is serialized to canonical JSON (keys sorted at every level, compact
//! separators, non-ASCII left unescaped, floats in shortest round-trip form)
//! and hashed with SHA-256. Icons appear as `{label, url}` records and places
//! refer to their icon by position, so the digest depends only on content.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::model::{Icon, MapView, Place};
use crate::number::format_float;

/// A 32-byte SHA-256 digest of a map or of a whole export run.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapDigest([u8; 32]);

impl MapDigest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MapDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for MapDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapDigest({self})")
    }
}

/// Running digest over the per-map digests of one export run.
///
/// # Examples
/// ```
/// use shelter_core::{CombinedDigest, Map, map_digest};
///
/// let mut combined = CombinedDigest::new();
/// combined.update(&map_digest(Map::new().view()));
/// let total = combined.finalize();
/// assert_eq!(total.to_hex().len(), 64);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CombinedDigest {
    hasher: Sha256,
}

impl CombinedDigest {
    /// Start an empty combined digest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one map digest, in processing order.
    pub fn update(&mut self, digest: &MapDigest) {
        self.hasher.update(digest.as_bytes());
    }

    /// Consume the running state and return the final digest.
    #[must_use]
    pub fn finalize(self) -> MapDigest {
        MapDigest(self.hasher.finalize().into())
    }
}

/// Hash the canonical serialization of `view`.
///
/// The digest covers exactly the icons and places in the view; callers that
/// export in chunks hash the full map once.
#[must_use]
pub fn map_digest(view: MapView<'_>) -> MapDigest {
    MapDigest(Sha256::digest(canonical_json(view)).into())
}

/// Serialize `view` into the canonical byte string that [`map_digest`] hashes.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use shelter_core::digest::canonical_json;
/// use shelter_core::{Icon, Map, Place};
///
/// let mut map = Map::new();
/// let icon = map.add_icon(Icon::new("A", "u"));
/// map.push_place(Place::new("P", vec![("k".into(), "v".into())], icon, Coord { x: 35.0, y: 31.0 }));
///
/// assert_eq!(
///     String::from_utf8(canonical_json(map.view())).expect("utf-8"),
///     r#"{"icons":[{"label":"A","url":"u"}],"places":[{"desc":[["k","v"]],"icon":0,"lat":31.0,"lon":35.0,"name":"P"}]}"#,
/// );
/// ```
#[must_use]
pub fn canonical_json(view: MapView<'_>) -> Vec<u8> {
    let document = Canonical::object([
        (
            "icons",
            Canonical::List(view.icons().iter().map(icon_record).collect()),
        ),
        (
            "places",
            Canonical::List(view.places().iter().map(place_record).collect()),
        ),
    ]);
    let mut out = String::new();
    document.write_to(&mut out);
    out.into_bytes()
}

fn icon_record(icon: &Icon) -> Canonical<'_> {
    Canonical::object([
        ("label", Canonical::Text(&icon.label)),
        ("url", Canonical::Text(&icon.url)),
    ])
}

fn place_record(place: &Place) -> Canonical<'_> {
    let desc = place
        .description
        .iter()
        .map(|(key, value)| Canonical::List(vec![Canonical::Text(key), Canonical::Text(value)]))
        .collect();
    Canonical::object([
        ("name", Canonical::Text(&place.name)),
        ("desc", Canonical::List(desc)),
        ("icon", Canonical::Integer(place.icon.index())),
        ("lon", Canonical::Float(place.lon())),
        ("lat", Canonical::Float(place.lat())),
    ])
}

/// JSON tree whose objects always serialize with sorted keys.
enum Canonical<'a> {
    Text(&'a str),
    Integer(usize),
    Float(f64),
    List(Vec<Canonical<'a>>),
    Object(BTreeMap<&'static str, Canonical<'a>>),
}

impl<'a> Canonical<'a> {
    fn object<const N: usize>(entries: [(&'static str, Self); N]) -> Self {
        Self::Object(entries.into_iter().collect())
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&Value::from(*text).to_string()),
            Self::Integer(value) => out.push_str(&value.to_string()),
            Self::Float(value) => out.push_str(&json_float(*value)),
            Self::List(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    item.write_to(out);
                }
                out.push(']');
            }
            Self::Object(entries) => {
                out.push('{');
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    out.push_str(&Value::from(*key).to_string());
                    out.push(':');
                    value.write_to(out);
                }
                out.push('}');
            }
        }
    }
}

/// JSON has no literal for non-finite numbers; use the common extension.
fn json_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value.is_sign_negative() { "-Infinity" } else { "Infinity" }.to_owned()
    } else {
        format_float(value)
    }
}

//! Normalized map model shared by every source adapter and exporter.

use std::fmt;
use std::ops::Range;

use geo::Coord;

/// Stable identifier of an [`Icon`] within one [`Map`].
///
/// The identifier is the icon's 0-based position in the map's icon
/// sequence, assigned by [`Map::add_icon`]. Places refer to icons through
/// this key rather than by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IconId(usize);

impl IconId {
    /// Wrap a 0-based icon position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The 0-based position of the icon in its map.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// The 1-based number used in style identifiers and attachment names.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self.0.saturating_add(1)
    }
}

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "icon #{}", self.ordinal())
    }
}

/// A named marker style backed by an image.
///
/// `url` is either a remote image URL or a `data:` URL embedding the image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Icon {
    pub label: String,
    pub url: String,
}

impl Icon {
    /// Construct an icon from a label and image reference.
    ///
    /// # Examples
    /// ```
    /// use shelter_core::Icon;
    ///
    /// let icon = Icon::new("Public shelter", "https://example.org/shelter.png");
    /// assert_eq!(icon.label, "Public shelter");
    /// ```
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// A single shelter or other point of interest.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. The
/// description is an ordered list of label/value pairs; the order is the
/// rendering order in every export format.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub description: Vec<(String, String)>,
    pub icon: IconId,
    pub location: Coord<f64>,
}

impl Place {
    /// Construct a place at `location` styled with `icon`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use shelter_core::{IconId, Place};
    ///
    /// let place = Place::new(
    ///     "Shelter 12",
    ///     vec![("Address".into(), "1 Herzl St".into())],
    ///     IconId::new(0),
    ///     Coord { x: 34.78, y: 32.08 },
    /// );
    /// assert_eq!(place.lon(), 34.78);
    /// assert_eq!(place.lat(), 32.08);
    /// ```
    pub fn new(
        name: impl Into<String>,
        description: Vec<(String, String)>,
        icon: IconId,
        location: Coord<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            icon,
            location,
        }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.location.x
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.location.y
    }
}

/// An ordered set of icons plus an ordered set of places.
///
/// Every place's [`IconId`] is expected to index [`Map::icons`]. The export
/// engine does not check this: a dangling id is written out as a dangling
/// style reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    icons: Vec<Icon>,
    places: Vec<Place>,
}

impl Map {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            icons: Vec::new(),
            places: Vec::new(),
        }
    }

    /// Build a map from already-assembled parts.
    #[must_use]
    pub const fn from_parts(icons: Vec<Icon>, places: Vec<Place>) -> Self {
        Self { icons, places }
    }

    /// Append an icon and return its identifier.
    pub fn add_icon(&mut self, icon: Icon) -> IconId {
        let id = IconId::new(self.icons.len());
        self.icons.push(icon);
        id
    }

    /// Replace the icon stored under `id`, keeping its position.
    ///
    /// Returns `false` when `id` does not belong to this map.
    pub fn replace_icon(&mut self, id: IconId, icon: Icon) -> bool {
        if let Some(slot) = self.icons.get_mut(id.index()) {
            *slot = icon;
            true
        } else {
            false
        }
    }

    /// Append a place.
    pub fn push_place(&mut self, place: Place) {
        self.places.push(place);
    }

    /// Icons in declaration order.
    #[must_use]
    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    /// Places in output order.
    #[must_use]
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Look up an icon by identifier.
    #[must_use]
    pub fn icon(&self, id: IconId) -> Option<&Icon> {
        self.icons.get(id.index())
    }

    /// Borrow the whole map as a [`MapView`].
    #[must_use]
    pub fn view(&self) -> MapView<'_> {
        MapView::new(&self.icons, &self.places)
    }
}

impl<'a> From<&'a Map> for MapView<'a> {
    fn from(map: &'a Map) -> Self {
        map.view()
    }
}

/// A borrowed map: the full icon set plus a run of places.
///
/// Exporters consume views so a chunk of a large map can be rendered
/// without copying it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView<'a> {
    icons: &'a [Icon],
    places: &'a [Place],
}

impl<'a> MapView<'a> {
    /// Pair an icon set with a run of places.
    #[must_use]
    pub const fn new(icons: &'a [Icon], places: &'a [Place]) -> Self {
        Self { icons, places }
    }

    /// Icons in declaration order.
    #[must_use]
    pub const fn icons(&self) -> &'a [Icon] {
        self.icons
    }

    /// Places in output order.
    #[must_use]
    pub const fn places(&self) -> &'a [Place] {
        self.places
    }

    /// Restrict the view to a contiguous range of places, keeping every icon.
    ///
    /// Returns `None` when `range` falls outside the place list.
    #[must_use]
    pub fn chunk(&self, range: Range<usize>) -> Option<Self> {
        self.places
            .get(range)
            .map(|places| Self::new(self.icons, places))
    }
}

//! Flat CSV export for spreadsheet-style map imports.
//!
//! The table has a fixed `Name,Latitude,Longitude,Description` header and one
//! row per place. Icons have no representation in this format.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use thiserror::Error;

use crate::model::MapView;
use crate::number::format_float;

/// Column header written as the first record.
pub const CSV_HEADER: [&str; 4] = ["Name", "Latitude", "Longitude", "Description"];

/// Errors raised while encoding a CSV export.
#[derive(Debug, Error)]
pub enum CsvExportError {
    /// The encoder rejected a record.
    #[error("failed to encode CSV record")]
    Encode(#[from] csv::Error),
    /// Flushing the encoder's buffer failed.
    #[error("failed to flush CSV output")]
    Flush(#[source] std::io::Error),
}

/// Render the description pairs as `key: value` segments joined by ` | `.
///
/// # Examples
/// ```
/// use shelter_core::csv_export::plain_description;
///
/// let pairs = vec![("Type".into(), "Public".into()), ("Area".into(), "40".into())];
/// assert_eq!(plain_description(&pairs), "Type: Public | Area: 40");
/// ```
#[must_use]
pub fn plain_description(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Encode the places of `view` as a UTF-8 CSV document.
///
/// Fields are quoted only when they hold a comma, a quote, or a line break;
/// records end with CRLF.
///
/// # Errors
///
/// Returns [`CsvExportError`] if the encoder fails.
pub fn to_csv(view: MapView<'_>) -> Result<Vec<u8>, CsvExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for place in view.places() {
        let latitude = format_float(place.lat());
        let longitude = format_float(place.lon());
        let description = plain_description(&place.description);
        writer.write_record([
            place.name.as_str(),
            latitude.as_str(),
            longitude.as_str(),
            description.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| CsvExportError::Flush(err.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Icon, Map, Place};
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn single_place_map() -> Map {
        let mut map = Map::new();
        let icon = map.add_icon(Icon::new("A", "http://x/a.png"));
        map.push_place(Place::new(
            "P1",
            vec![("k".into(), "v".into())],
            icon,
            Coord { x: 35.0, y: 31.0 },
        ));
        map
    }

    fn render(map: &Map) -> String {
        String::from_utf8(to_csv(map.view()).expect("csv export")).expect("utf-8 csv")
    }

    #[rstest]
    fn writes_header_and_row(single_place_map: Map) {
        assert_eq!(
            render(&single_place_map),
            "Name,Latitude,Longitude,Description\r\nP1,31.0,35.0,k: v\r\n"
        );
    }

    #[rstest]
    fn empty_map_writes_only_header() {
        assert_eq!(render(&Map::new()), "Name,Latitude,Longitude,Description\r\n");
    }

    #[rstest]
    fn quotes_fields_with_separators() {
        let mut map = Map::new();
        let icon = map.add_icon(Icon::new("A", "u"));
        map.push_place(Place::new(
            "Shelter, \"north\"",
            vec![
                ("כתובת".into(), "הרצל 1, תל אביב".into()),
                ("note".into(), "line\nbreak".into()),
            ],
            icon,
            Coord { x: 34.5, y: 32.25 },
        ));

        let expected = "Name,Latitude,Longitude,Description\r\n\
                        \"Shelter, \"\"north\"\"\",32.25,34.5,\"כתובת: הרצל 1, תל אביב | note: line\nbreak\"\r\n";
        assert_eq!(render(&map), expected);
    }

    #[rstest]
    fn description_keeps_pair_order() {
        let pairs = vec![
            ("b".into(), "2".into()),
            ("a".into(), "1".into()),
            ("c".into(), String::new()),
        ];
        assert_eq!(plain_description(&pairs), "b: 2 | a: 1 | c: ");
    }
}

//! Test doubles standing in for municipal adapters and the HTTP client.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use shelter_core::{Icon, Map, Place};
use shelter_data::test_support::StubFetcher;
use shelter_data::{City, CityError, raw};
use std::cell::RefCell;
use tempfile::TempDir;

/// A city whose raw dataset is a JSON list of `[name, lon, lat]` triples.
#[derive(Debug, Clone)]
pub(super) struct FakeCity {
    pub(super) name: &'static str,
    pub(super) slug: &'static str,
    pub(super) places: u32,
}

impl FakeCity {
    pub(super) const fn new(name: &'static str, slug: &'static str, places: u32) -> Self {
        Self { name, slug, places }
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.slug)
    }

    fn rows(&self) -> Vec<(String, f64, f64)> {
        (1..=self.places)
            .map(|n| (format!("{} {n}", self.name), 34.0 + f64::from(n), 32.5))
            .collect()
    }

    /// Write this city's raw file into `data_dir`.
    pub(super) fn seed(&self, data_dir: &Utf8Path) {
        self.download(&StubFetcher::new(), data_dir)
            .expect("seed raw file");
    }

    /// The map this city should produce once seeded.
    pub(super) fn expected_map(&self) -> Map {
        build_map(self.name, self.rows())
    }
}

fn build_map(city: &str, rows: Vec<(String, f64, f64)>) -> Map {
    let mut map = Map::new();
    let icon = map.add_icon(Icon::new("shelter", "http://example.org/shelter.png"));
    for (name, lon, lat) in rows {
        map.push_place(Place::new(
            name,
            vec![("city".to_owned(), city.to_owned())],
            icon,
            Coord { x: lon, y: lat },
        ));
    }
    map
}

impl City for FakeCity {
    fn name(&self) -> &'static str {
        self.name
    }

    fn slug(&self) -> &'static str {
        self.slug
    }

    fn download(&self, _fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<(), CityError> {
        let payload = serde_json::to_vec(&self.rows()).map_err(|source| CityError::Parse {
            path: data_dir.join(self.file_name()),
            source,
        })?;
        raw::save(data_dir, &self.file_name(), &payload)?;
        Ok(())
    }

    fn generate_map(&self, _fetcher: &dyn Fetcher, data_dir: &Utf8Path) -> Result<Map, CityError> {
        let rows: Vec<(String, f64, f64)> = raw::load_json(&data_dir.join(self.file_name()))?;
        Ok(build_map(self.name, rows))
    }
}

/// Hands out fresh [`StubFetcher`]s and records the requested user agents.
#[derive(Debug, Default)]
pub(super) struct StubFetcherBuilder {
    pub(super) user_agents: RefCell<Vec<String>>,
}

impl FetcherBuilder for StubFetcherBuilder {
    fn build(&self, user_agent: &str) -> Result<Box<dyn Fetcher>, CliError> {
        self.user_agents.borrow_mut().push(user_agent.to_owned());
        Ok(Box::new(StubFetcher::new()))
    }
}

pub(super) fn temp_workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn boxed(cities: &[FakeCity]) -> Vec<Box<dyn City>> {
    cities
        .iter()
        .cloned()
        .map(|city| Box::new(city) as Box<dyn City>)
        .collect()
}

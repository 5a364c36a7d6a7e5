//! Behavioural coverage for the municipal adapters.

use super::{City, CityError, Jerusalem, TelAviv};
use crate::raw;
use crate::test_support::StubFetcher;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use shelter_core::{IconId, Map};
use std::cell::RefCell;
use tempfile::TempDir;

const SHELTER_ICON: &str = "https://www.jerusalem.muni.il/media/icons/shelter.png";

type MapResultCell = RefCell<Option<Result<Map, CityError>>>;

#[fixture]
fn working_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temporary directory: {err}"),
    }
}

#[derive(Debug, Default)]
struct AdapterContext {
    fetcher: RefCell<StubFetcher>,
    result: MapResultCell,
}

#[fixture]
fn adapter_context() -> AdapterContext {
    AdapterContext::default()
}

fn data_dir(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir")
}

fn save_json(dir: &TempDir, file_name: &str, value: &Value) {
    raw::save(&data_dir(dir), file_name, value.to_string().as_bytes()).expect("save raw file");
}

fn tel_aviv_metadata(field1: &str) -> Value {
    json!({
        "drawingInfo": {
            "renderer": {
                "field1": field1,
                "defaultLabel": "אחר",
                "defaultSymbol": {"contentType": "image/png", "imageData": "AAAA"},
                "uniqueValueInfos": [{
                    "value": "מקלט ציבורי",
                    "label": "מקלט ציבורי",
                    "symbol": {"contentType": "image/png", "imageData": "BBBB"}
                }]
            }
        }
    })
}

fn save_tel_aviv_shelters(dir: &TempDir) {
    save_json(
        dir,
        "tel_aviv_shelters.json",
        &json!({
            "features": [
                {"attributes": {"t_sug": "מקלט ציבורי", "Full_Address": "הרצל 12", "lat": 32.06, "lon": 34.77}},
                {"attributes": {"t_sug": "מרחב מוגן", "Full_Address": "יפו 3", "lat": 32.05, "lon": 34.76}},
                {"attributes": {"t_sug": "מקלט ציבורי", "Full_Address": "ללא מיקום", "lat": null, "lon": 34.7}}
            ]
        }),
    );
}

fn taken_map(ctx: &AdapterContext) -> Map {
    match ctx.result.borrow_mut().take() {
        Some(Ok(map)) => map,
        Some(Err(err)) => panic!("expected a map, got error: {err}"),
        None => panic!("map was not generated"),
    }
}

#[given("Tel Aviv data with a shelter of an unlisted type")]
fn tel_aviv_with_unlisted_type(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] _ctx: &AdapterContext,
) {
    save_tel_aviv_shelters(dir);
    save_json(dir, "tel_aviv_shelters_meta.json", &tel_aviv_metadata("t_sug"));
}

#[given("Tel Aviv metadata whose renderer is keyed by another field")]
fn tel_aviv_with_foreign_renderer(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] _ctx: &AdapterContext,
) {
    save_tel_aviv_shelters(dir);
    save_json(dir, "tel_aviv_shelters_meta.json", &tel_aviv_metadata("shem"));
}

#[given("Jerusalem data listing the same shelter twice")]
fn jerusalem_with_repeat(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] ctx: &AdapterContext,
) {
    let shelter = json!({
        "Name": "מקלט 1",
        "Address": "יפו 1, ירושלים",
        "Longitude": "35.21",
        "Latitude": "31.78,"
    });
    save_json(
        dir,
        "jerusalem_shelters.json",
        &json!([{
            "Name": "מקלטים",
            "Icon": "/media/icons/shelter.png",
            "MapFiltersChildren": [shelter.clone(), shelter, {
                "Name": "מקלט 2",
                "Address": "יפו 2, ירושלים",
                "Longitude": "35.22",
                "Latitude": "31.79"
            }]
        }]),
    );
    let stub = ctx
        .fetcher
        .take()
        .with_body(SHELTER_ICON, "image/png", b"png".to_vec());
    ctx.fetcher.replace(stub);
}

#[when("I generate the Tel Aviv map")]
fn generate_tel_aviv(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] ctx: &AdapterContext,
) {
    let outcome = TelAviv.generate_map(&*ctx.fetcher.borrow(), &data_dir(dir));
    ctx.result.replace(Some(outcome));
}

#[when("I generate the Jerusalem map")]
fn generate_jerusalem(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] ctx: &AdapterContext,
) {
    let outcome = Jerusalem.generate_map(&*ctx.fetcher.borrow(), &data_dir(dir));
    ctx.result.replace(Some(outcome));
}

#[then("every located shelter is on the map")]
fn located_shelters_present(#[from(adapter_context)] ctx: &AdapterContext) {
    let map = taken_map(ctx);
    let names: Vec<_> = map.places().iter().map(|place| place.name.clone()).collect();
    assert_eq!(names, vec!["מקלט ציבורי הרצל 12", "מרחב מוגן יפו 3"]);
    ctx.result.replace(Some(Ok(map)));
}

#[then("the unlisted shelter uses the default icon")]
fn unlisted_uses_default(#[from(adapter_context)] ctx: &AdapterContext) {
    let map = taken_map(ctx);
    let unlisted = map.places().get(1).expect("unlisted shelter");
    assert_eq!(unlisted.icon, IconId::new(0));
    let icon = map.icon(unlisted.icon).expect("default icon");
    assert_eq!(icon.label, "אחר");
    assert_eq!(icon.url, "data:image/png;base64,AAAA");
}

#[then("the repeated shelter appears once")]
fn repeated_shelter_once(#[from(adapter_context)] ctx: &AdapterContext) {
    let map = taken_map(ctx);
    let names: Vec<_> = map.places().iter().map(|place| place.name.clone()).collect();
    assert_eq!(names, vec!["מקלט 1 (מקלטים)", "מקלט 2 (מקלטים)"]);
}

#[then("the group icon was downloaded once")]
fn icon_downloaded_once(#[from(adapter_context)] ctx: &AdapterContext) {
    let requests = ctx.fetcher.borrow().requests();
    let urls: Vec<_> = requests.iter().map(|request| request.url.as_str()).collect();
    assert_eq!(urls, vec![SHELTER_ICON]);
}

#[then("the metadata file is reported as unexpected")]
fn metadata_rejected(
    #[from(working_dir)] dir: &TempDir,
    #[from(adapter_context)] ctx: &AdapterContext,
) {
    let borrowed = ctx.result.borrow();
    match borrowed.as_ref().expect("result recorded") {
        Err(CityError::Schema { path, .. }) => {
            assert_eq!(*path, data_dir(dir).join("tel_aviv_shelters_meta.json"));
        }
        other => panic!("expected a schema error, found {other:?}"),
    }
}

macro_rules! register_scenario {
    ($name:ident, $index:expr) => {
        #[scenario(path = "tests/features/city_adapters.feature", index = $index)]
        fn $name(#[from(adapter_context)] context: AdapterContext, working_dir: TempDir) {
            let _ = (context, working_dir);
        }
    };
}

register_scenario!(tel_aviv_unlisted_type_uses_default_icon, 0);
register_scenario!(jerusalem_repeated_shelter_appears_once, 1);
register_scenario!(tel_aviv_foreign_renderer_is_rejected, 2);

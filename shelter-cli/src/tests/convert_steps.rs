//! Behaviour-driven step definitions driving the convert CLI scenarios.

use super::convert::run_convert_with;
use super::helpers::{FakeCity, StubFetcherBuilder, boxed};
use super::*;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use shelter_core::MapDigest;
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct ConvertWorld {
    _tmp: TempDir,
    data_dir: Utf8PathBuf,
    cities: Vec<FakeCity>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<MapDigest, CliError>>>,
}

impl ConvertWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self {
            _tmp: tmp,
            data_dir,
            cities: vec![
                FakeCity::new("Haifa", "haifa", 3),
                FakeCity::new("Eilat", "eilat", 1),
            ],
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec![
            "shelter-map".to_owned(),
            "convert".to_owned(),
            format!("--{ARG_DATA_DIR}"),
            self.data_dir.as_str().to_owned(),
        ];
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn stdout_text(&self) -> String {
        String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8")
    }
}

#[fixture]
fn world() -> ConvertWorld {
    ConvertWorld::new()
}

#[given("raw data for two cities exists on disk")]
fn raw_data_exists(#[from(world)] world: &ConvertWorld) {
    for city in &world.cities {
        city.seed(&world.data_dir);
    }
}

#[given("I limit each file to {count} places")]
fn limit_places(#[from(world)] world: &ConvertWorld, count: usize) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_MAX_PER_FILE}"), count.to_string()]);
}

#[given("I request the {format:word} format")]
fn request_format(#[from(world)] world: &ConvertWorld, format: String) {
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_FORMAT}"), format.trim_matches('"').to_owned()]);
}

#[when("I run the convert command")]
fn run_convert_command(#[from(world)] world: &ConvertWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Convert(args) => {
            let builder = StubFetcherBuilder::default();
            let mut buffer = world.stdout.borrow_mut();
            run_convert_with(args, &boxed(&world.cities), &builder, &mut *buffer)
        }
        Command::Download(_) => panic!("expected convert command"),
    });

    world.result.replace(Some(outcome));
}

#[then("the command succeeds and reports a combined hash")]
fn command_succeeds(#[from(world)] world: &ConvertWorld) {
    let borrowed = world.result.borrow();
    let digest = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect("expected success");

    let stdout = world.stdout_text();
    let last = stdout.lines().last().expect("stdout has lines");
    assert_eq!(last, format!("Combined hash: {digest}"));
    assert_eq!(stdout.lines().filter(|line| line.starts_with("Hash: ")).count(), 2);
}

#[then("one KML file exists per city")]
fn one_kml_per_city(#[from(world)] world: &ConvertWorld) {
    for slug in ["haifa", "eilat"] {
        let path = world.data_dir.join(format!("{slug}_shelters.kml"));
        assert!(path.is_file(), "missing {path}");
    }
}

#[then("the larger city is split into numbered files")]
fn larger_city_split(#[from(world)] world: &ConvertWorld) {
    assert!(world.data_dir.join("haifa_shelters.1.kml").is_file());
    assert!(world.data_dir.join("haifa_shelters.2.kml").is_file());
    assert!(!world.data_dir.join("haifa_shelters.kml").exists());
    assert!(world.data_dir.join("eilat_shelters.kml").is_file());
    assert!(
        world
            .stdout_text()
            .contains("Hash: haifa_shelters.2.kml:")
    );
}

#[then("the command fails because the format is unsupported")]
fn command_fails_unsupported_format(#[from(world)] world: &ConvertWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::UnsupportedFormat(inner) => assert_eq!(inner.requested, "geojson"),
        other => panic!("expected UnsupportedFormat, found {other:?}"),
    }
}

#[then("nothing is printed")]
fn nothing_printed(#[from(world)] world: &ConvertWorld) {
    assert!(world.stdout.borrow().is_empty());
}

macro_rules! register_convert_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/convert_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: ConvertWorld) {
            let _ = world;
        }
    };
}

register_convert_scenario!(convert_all_cities, "exporting every city as KML");
register_convert_scenario!(convert_split_files, "splitting large cities across numbered files");
register_convert_scenario!(convert_unsupported_format, "rejecting unsupported formats");

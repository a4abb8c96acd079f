//! Finding readers by name, sensor or filename.

use chrono::{DateTime, TimeZone, Utc};
use swath_reader::{
    FinderQuery, FinderState, HandlerRegistry, ReaderError, ReaderFinder, RequestInfo,
};
use tempfile::TempDir;
use test_utils::fixtures::configs;
use test_utils::{temp_test_dir, touch_files, write_config_dir};

const NOAA19_FILES: [&str; 3] = [
    "hrpt_noaa19_20200101_1000_1010.l1b",
    "hrpt_noaa19_20200101_1010_1020.l1b",
    "hrpt_noaa19_20200101_1100_1110.l1b",
];

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, day, hour, minute, 0).unwrap()
}

fn config_dir() -> TempDir {
    write_config_dir(&[
        ("avhrr_l1b", configs::AVHRR_L1B),
        ("letters", configs::LETTERS),
        ("viirs_sdr", configs::VIIRS_SDR),
    ])
}

fn data_dir(names: &[&str]) -> (TempDir, Vec<String>) {
    let dir = temp_test_dir();
    let files = touch_files(dir.path(), names);
    (dir, files)
}

// ============================================================================
// By reader name
// ============================================================================

#[test]
fn test_named_reader_discovers_files_in_window() {
    let configs = config_dir();
    let (data, _) = data_dir(&NOAA19_FILES);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .base_dir(data.path())
        .request(RequestInfo::new().start_time(at(1, 10, 5)).end_time(at(1, 10, 12)));

    let readers = finder.find(&FinderQuery::new().reader("avhrr_l1b")).unwrap();
    assert_eq!(readers.len(), 1);
    let reader = &readers[0];
    assert_eq!(reader.name(), "avhrr_l1b");
    assert_eq!(reader.file_reader("l1b").unwrap().granule_count(), 2);
    assert_eq!(reader.start_time(), Some(at(1, 10, 0)));
    assert_eq!(reader.end_time(), Some(at(1, 10, 20)));
    assert_eq!(reader.file_readers()[0].platform_name(), Some("noaa19"));
    assert!(reader.sensor_names().contains("avhrr-3"));

    let outcome = &finder.outcomes()[0];
    assert_eq!(outcome.state, FinderState::Ready);
    assert_eq!(outcome.filenames.len(), 2);
    assert!(outcome.error.is_none());
}

#[test]
fn test_named_reader_with_foreign_file_is_unclaimed() {
    let configs = config_dir();
    let (_data, mut files) = data_dir(&NOAA19_FILES[..1]);
    files.push("/somewhere/mystery.bin".to_string());

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let err = finder
        .find(&FinderQuery::new().reader("avhrr_l1b").filenames(files))
        .unwrap_err();
    match err {
        ReaderError::UnclaimedFiles(rest) => assert_eq!(rest, vec!["/somewhere/mystery.bin"]),
        other => panic!("expected unclaimed files, got {other}"),
    }
    assert_eq!(finder.outcomes()[0].state, FinderState::Failed);
}

#[test]
fn test_named_reader_without_matches_finds_nothing() {
    let configs = config_dir();
    let (data, _) = data_dir(&NOAA19_FILES);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .base_dir(data.path())
        .request(RequestInfo::new().start_time(at(5, 0, 0)).end_time(at(5, 1, 0)));

    let err = finder.find(&FinderQuery::new().reader("avhrr_l1b")).unwrap_err();
    assert!(matches!(err, ReaderError::NoFilesFound(_)));
}

#[test]
fn test_discovery_requires_start_time() {
    let configs = config_dir();
    let (data, _) = data_dir(&NOAA19_FILES);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new()).base_dir(data.path());

    let err = finder.find(&FinderQuery::new().reader("avhrr_l1b")).unwrap_err();
    assert!(matches!(err, ReaderError::Config(_)));
}

#[test]
fn test_reader_config_found_by_path() {
    let configs = config_dir();
    let (_data, files) = data_dir(&NOAA19_FILES);
    let config_path = configs.path().join("avhrr_l1b.yaml");

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let readers = finder
        .find(
            &FinderQuery::new()
                .reader(config_path.to_string_lossy())
                .filenames(files),
        )
        .unwrap();
    assert_eq!(readers[0].name(), "avhrr_l1b");
    assert_eq!(readers[0].file_readers()[0].granule_count(), 3);
}

#[test]
fn test_end_time_rolls_past_midnight() {
    let configs = config_dir();
    let (data, _) = data_dir(&["hrpt_metop_20200101_2355_0005.l1b"]);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .base_dir(data.path())
        .request(RequestInfo::new().start_time(at(2, 0, 1)));

    let readers = finder.find(&FinderQuery::new().reader("avhrr_l1b")).unwrap();
    assert_eq!(readers[0].start_time(), Some(at(1, 23, 55)));
    assert_eq!(readers[0].end_time(), Some(at(2, 0, 5)));
}

// ============================================================================
// By sensor
// ============================================================================

#[test]
fn test_sensor_selects_matching_configs() {
    let configs = config_dir();
    let (data, _) = data_dir(&NOAA19_FILES);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .base_dir(data.path())
        .request(RequestInfo::new().start_time(at(1, 10, 0)).end_time(at(1, 12, 0)));

    let readers = finder.find(&FinderQuery::new().sensors(["avhrr-3"])).unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].file_readers()[0].granule_count(), 3);
}

#[test]
fn test_sensor_without_files_is_skipped() {
    let configs = config_dir();
    let (data, _) = data_dir(&NOAA19_FILES);
    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .base_dir(data.path())
        .request(RequestInfo::new().start_time(at(1, 10, 0)).end_time(at(1, 12, 0)));

    let readers = finder
        .find(&FinderQuery::new().sensors(["avhrr-3", "viirs"]))
        .unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].name(), "avhrr_l1b");

    let viirs = finder
        .outcomes()
        .iter()
        .find(|o| o.reader == "viirs_sdr")
        .unwrap();
    assert_eq!(viirs.state, FinderState::Failed);
}

#[test]
fn test_sensor_with_leftover_files_is_unclaimed() {
    let configs = config_dir();
    let (_data, mut files) = data_dir(&NOAA19_FILES);
    files.push("/elsewhere/A1.dat".to_string());

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let err = finder
        .find(&FinderQuery::new().sensors(["avhrr-3"]).filenames(files))
        .unwrap_err();
    assert!(matches!(err, ReaderError::UnclaimedFiles(rest) if rest == vec!["/elsewhere/A1.dat"]));
}

// ============================================================================
// By filename only
// ============================================================================

#[test]
fn test_files_pick_their_readers() {
    let configs = config_dir();
    let (_data, files) = data_dir(&NOAA19_FILES);

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let readers = finder.find(&FinderQuery::new().filenames(files)).unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].name(), "avhrr_l1b");
    assert_eq!(finder.outcomes().len(), 1);
}

#[test]
fn test_files_nobody_claims() {
    let configs = config_dir();
    let (_data, mut files) = data_dir(&NOAA19_FILES[..2]);
    files.push("/x/unknown.nc".to_string());

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let err = finder.find(&FinderQuery::new().filenames(files)).unwrap_err();
    assert!(matches!(err, ReaderError::UnclaimedFiles(rest) if rest == vec!["/x/unknown.nc"]));
}

const MODIS_L1B: &str = r#"
reader:
  name: modis_l1b
  sensors: [modis]
  default_file_reader: filename
file_types:
  - name: l1b
    file_patterns: ["MOD021KM_{start_time:%Y%m%d_%H%M}_{end_time:%H%M}.hdf"]
"#;

#[test]
fn test_reader_filtered_out_does_not_stop_search() {
    let configs = write_config_dir(&[
        ("avhrr_l1b", configs::AVHRR_L1B),
        ("modis_l1b", MODIS_L1B),
    ]);
    let (_data, files) = data_dir(&[NOAA19_FILES[0], "MOD021KM_20200101_1200_1205.hdf"]);

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .request(RequestInfo::new().start_time(at(1, 11, 0)).end_time(at(1, 13, 0)));
    let readers = finder.find(&FinderQuery::new().filenames(files)).unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].name(), "modis_l1b");

    let states: Vec<_> = finder
        .outcomes()
        .iter()
        .map(|o| (o.reader.as_str(), o.state))
        .collect();
    assert_eq!(
        states,
        vec![("avhrr_l1b", FinderState::Failed), ("modis_l1b", FinderState::Ready)]
    );
}

#[test]
fn test_sensor_search_skips_reader_filtered_out() {
    let configs = write_config_dir(&[
        ("avhrr_l1b", configs::AVHRR_L1B),
        ("modis_l1b", MODIS_L1B),
    ]);
    let (_data, files) = data_dir(&[NOAA19_FILES[0], "MOD021KM_20200101_1200_1205.hdf"]);

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new())
        .request(RequestInfo::new().start_time(at(1, 11, 0)).end_time(at(1, 13, 0)));
    let readers = finder
        .find(&FinderQuery::new().sensors(["avhrr-3", "modis"]).filenames(files))
        .unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].name(), "modis_l1b");
}

#[test]
fn test_invalid_configs_are_skipped() {
    let configs = write_config_dir(&[
        ("aaa_broken", "reader: [this is not a reader"),
        ("avhrr_l1b", configs::AVHRR_L1B),
        ("avhrr_copy", configs::AVHRR_L1B),
    ]);
    let (_data, files) = data_dir(&NOAA19_FILES);

    let mut finder = ReaderFinder::new(configs.path(), HandlerRegistry::new());
    let readers = finder.find(&FinderQuery::new().filenames(files)).unwrap();
    assert_eq!(readers.len(), 1);
}

// ============================================================================
// Shipped configurations
// ============================================================================

#[test]
fn test_shipped_reader_configs_are_valid() {
    let dir = test_utils::workspace_root().join("etc").join("readers");
    let paths = swath_reader::reader_config_paths(&dir).unwrap();
    assert!(!paths.is_empty());
    for path in paths {
        swath_reader::load_reader_config(&path).unwrap();
    }
}

//! Finding a reader's files on disk.

use chrono::{DateTime, Utc};
use geo::Polygon;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::granule::GranuleFilter;
use crate::pattern::FilePattern;

/// Request-wide criteria shared by every reader a search produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInfo {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub area: Option<Polygon<f64>>,
    /// Template fields fixed for globbing, e.g. `platform`.
    pub fields: HashMap<String, String>,
}

impl RequestInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn end_time(mut self, end: DateTime<Utc>) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn area(mut self, area: Polygon<f64>) -> Self {
        self.area = Some(area);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Granule filter for a reader: request criteria first, reader defaults
    /// for whatever the request leaves open.
    pub fn granule_filter(&self, config: &ReaderConfig) -> GranuleFilter {
        let defaults = GranuleFilter::from_reader(&config.reader);
        GranuleFilter {
            start_time: self.start_time.or(defaults.start_time),
            end_time: self.end_time.or(defaults.end_time),
            area: self.area.clone().or(defaults.area),
        }
    }
}

/// Glob for the reader's files under `base_dir` and keep those whose
/// filename times fall in the requested window.
///
/// With an end time, a file is kept when its start or end lies inside
/// `[start, end]`. Without one, a file is kept when it covers the start
/// time, or when it has no end time and starts exactly at it. End times
/// earlier than the start are taken to roll past midnight. Returns sorted
/// filenames.
pub fn get_filenames(
    config: &ReaderConfig,
    base_dir: Option<&Path>,
    request: &RequestInfo,
) -> Result<Vec<String>> {
    let start = request
        .start_time
        .or(config.reader.start_time)
        .ok_or_else(|| {
            ReaderError::config(format!(
                "'start_time' is required to search for files of reader '{}'",
                config.name()
            ))
        })?;
    let end = request.end_time.or(config.reader.end_time);

    let fixed: HashMap<String, String> = request
        .fields
        .iter()
        .filter(|(k, _)| !k.ends_with("_time"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut found = BTreeSet::new();
    for template in config.file_patterns() {
        let pattern = FilePattern::new(template)?;
        let mut glob_str = pattern.globify(&fixed);
        if let Some(dir) = base_dir {
            let dir = dir.to_string_lossy();
            glob_str = format!(
                "{}/{}",
                glob::Pattern::escape(dir.trim_end_matches('/')),
                glob_str
            );
        }
        debug!(reader = %config.name(), glob = %glob_str, "Searching for files");

        for entry in glob::glob(&glob_str)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable path");
                    continue;
                }
            };
            let filename = path.to_string_lossy().into_owned();
            let Some(fields) = pattern.parse(&filename) else {
                info!(pattern = %template, filename = %filename, "Can't get any metadata from filename");
                continue;
            };
            let Some(file_start) = fields.start_time() else {
                info!(pattern = %template, filename = %filename, "No start time in filename");
                continue;
            };
            let file_end = fields.end_time();

            let keep = match (end, file_end) {
                (Some(end), _) => {
                    (start <= file_start && file_start <= end)
                        || file_end.map_or(false, |fe| start <= fe && fe <= end)
                }
                (None, Some(file_end)) => file_start <= start && start <= file_end,
                (None, None) => file_start == start,
            };
            if keep {
                found.insert(filename);
            }
        }
    }

    debug!(reader = %config.name(), count = found.len(), "Discovered files");
    Ok(found.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_reader_config;
    use chrono::TimeZone;
    use std::fs::File;

    const CONFIG: &str = r#"
reader:
  name: avhrr
file_types:
  - name: l1b
    file_patterns: ["hrpt_{platform}_{start_time:%Y%m%d_%H%M}_{end_time:%H%M}.l1b"]
"#;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            File::create(dir.join(name)).unwrap();
        }
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_requires_start_time() {
        let config = parse_reader_config(CONFIG).unwrap();
        let err = get_filenames(&config, None, &RequestInfo::new()).unwrap_err();
        assert!(matches!(err, ReaderError::Config(_)));
    }

    #[test]
    fn test_window_and_platform_field() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "hrpt_noaa19_20200101_1000_1010.l1b",
                "hrpt_noaa19_20200101_1010_1020.l1b",
                "hrpt_noaa19_20200101_1100_1110.l1b",
                "hrpt_noaa18_20200101_1005_1015.l1b",
                "unrelated.txt",
            ],
        );
        let config = parse_reader_config(CONFIG).unwrap();
        let request = RequestInfo::new()
            .start_time(at(1, 10, 5))
            .end_time(at(1, 10, 12))
            .field("platform", "noaa19");

        let files = get_filenames(&config, Some(dir.path()), &request).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| Path::new(f).file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["hrpt_noaa19_20200101_1000_1010.l1b", "hrpt_noaa19_20200101_1010_1020.l1b"]
        );
    }

    #[test]
    fn test_single_time_across_midnight() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["hrpt_metop_20200101_2355_0005.l1b"]);
        let config = parse_reader_config(CONFIG).unwrap();

        let request = RequestInfo::new().start_time(at(2, 0, 1));
        let files = get_filenames(&config, Some(dir.path()), &request).unwrap();
        assert_eq!(files.len(), 1);

        let request = RequestInfo::new().start_time(at(2, 0, 6));
        assert!(get_filenames(&config, Some(dir.path()), &request).unwrap().is_empty());
    }
}

//! Locating readers for a request.
//!
//! The finder turns a request (a reader name, a set of sensors or a list of
//! files) into constructed [`ConfigReader`]s. Each reader it tries moves
//! through [`FinderState`]s; the last search's attempts are kept as
//! [`FinderOutcome`]s.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::{find_reader_config, load_reader_config, reader_config_paths, ReaderConfig};
use crate::discovery::{get_filenames, RequestInfo};
use crate::error::{ReaderError, Result};
use crate::handler::HandlerRegistry;
use crate::pattern::{base_name, FilePattern};
use crate::reader::ConfigReader;

/// Progress of one reader through a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinderState {
    Unresolved,
    ConfigLoaded,
    FilesAssigned,
    Ready,
    Failed,
}

impl fmt::Display for FinderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FinderState::Unresolved => "unresolved",
            FinderState::ConfigLoaded => "config_loaded",
            FinderState::FilesAssigned => "files_assigned",
            FinderState::Ready => "ready",
            FinderState::Failed => "failed",
        };
        f.pad(s)
    }
}

/// Record of one reader attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinderOutcome {
    pub reader: String,
    pub state: FinderState,
    pub filenames: Vec<String>,
    pub error: Option<String>,
}

impl FinderOutcome {
    fn new(reader: &str) -> Self {
        Self {
            reader: reader.to_string(),
            state: FinderState::Unresolved,
            filenames: Vec::new(),
            error: None,
        }
    }

    fn advance(&mut self, next: FinderState) {
        debug!(reader = %self.reader, from = %self.state, to = %next, "Reader finder transition");
        self.state = next;
    }

    fn fail(&mut self, err: &ReaderError) {
        self.advance(FinderState::Failed);
        self.error = Some(err.to_string());
    }
}

/// What to search for. A reader name wins over sensors, sensors over files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinderQuery {
    pub reader: Option<String>,
    pub sensors: Option<Vec<String>>,
    pub filenames: Option<Vec<String>>,
}

impl FinderQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader(mut self, name: impl Into<String>) -> Self {
        self.reader = Some(name.into());
        self
    }

    pub fn sensors<S: Into<String>>(mut self, sensors: impl IntoIterator<Item = S>) -> Self {
        self.sensors = Some(sensors.into_iter().map(Into::into).collect());
        self
    }

    pub fn filenames<S: Into<String>>(mut self, files: impl IntoIterator<Item = S>) -> Self {
        self.filenames = Some(files.into_iter().map(Into::into).collect());
        self
    }

    fn files(&self) -> Option<&[String]> {
        self.filenames.as_deref().filter(|f| !f.is_empty())
    }
}

/// Finds and builds readers from a configuration directory.
#[derive(Debug)]
pub struct ReaderFinder {
    config_dir: PathBuf,
    base_dir: Option<PathBuf>,
    info: RequestInfo,
    handlers: HandlerRegistry,
    outcomes: Vec<FinderOutcome>,
}

impl ReaderFinder {
    pub fn new(config_dir: impl Into<PathBuf>, handlers: HandlerRegistry) -> Self {
        Self {
            config_dir: config_dir.into(),
            base_dir: None,
            info: RequestInfo::default(),
            handlers,
            outcomes: Vec::new(),
        }
    }

    /// Directory searched when files have to be discovered.
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn request(mut self, info: RequestInfo) -> Self {
        self.info = info;
        self
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    /// Attempts made by the last search.
    pub fn outcomes(&self) -> &[FinderOutcome] {
        &self.outcomes
    }

    pub fn find(&mut self, query: &FinderQuery) -> Result<Vec<ConfigReader>> {
        self.outcomes.clear();
        if let Some(reader) = &query.reader {
            return Ok(vec![self.find_reader(reader, query.files())?]);
        }
        if let Some(sensors) = &query.sensors {
            return self.find_sensor_readers(sensors, query.files());
        }
        if let Some(files) = query.files() {
            return self.find_file_readers(files);
        }
        Ok(Vec::new())
    }

    fn find_reader(&mut self, name: &str, files: Option<&[String]>) -> Result<ConfigReader> {
        let mut outcome = FinderOutcome::new(name);
        let result = self.resolve_reader(name, files, &mut outcome);
        if let Err(e) = &result {
            outcome.fail(e);
        }
        self.outcomes.push(outcome);
        result
    }

    fn resolve_reader(
        &self,
        name: &str,
        files: Option<&[String]>,
        outcome: &mut FinderOutcome,
    ) -> Result<ConfigReader> {
        let config = find_reader_config(&self.config_dir, name)?;
        outcome.advance(FinderState::ConfigLoaded);

        let assigned = match files {
            Some(files) => {
                let (claimed, remaining) = assign_matching_files(&config, files)?;
                if !remaining.is_empty() {
                    return Err(ReaderError::UnclaimedFiles(remaining));
                }
                claimed
            }
            None => {
                let found = get_filenames(&config, self.base_dir.as_deref(), &self.info)?;
                if found.is_empty() {
                    return Err(ReaderError::NoFilesFound(config.name().to_string()));
                }
                found
            }
        };
        self.build(config, assigned, outcome)
    }

    fn find_sensor_readers(&mut self, sensors: &[String], files: Option<&[String]>) -> Result<Vec<ConfigReader>> {
        let wanted: HashSet<String> = sensors.iter().cloned().collect();
        let mut remaining: Option<Vec<String>> = files.map(<[String]>::to_vec);
        let mut readers = Vec::new();

        for config in self.configs()? {
            if !config.has_sensor(&wanted) {
                continue;
            }
            let mut outcome = FinderOutcome::new(config.name());
            outcome.advance(FinderState::ConfigLoaded);

            let assigned = match remaining.take() {
                Some(pool) => {
                    let (claimed, rest) = assign_matching_files(&config, &pool)?;
                    remaining = Some(rest);
                    claimed
                }
                None => get_filenames(&config, self.base_dir.as_deref(), &self.info)?,
            };
            if assigned.is_empty() {
                let err = ReaderError::NoFilesFound(config.name().to_string());
                warn!(reader = %config.name(), "No filenames found for reader");
                outcome.fail(&err);
                self.outcomes.push(outcome);
                continue;
            }

            let reader = self.build(config, assigned, &mut outcome);
            self.collect(reader, outcome, &mut readers)?;
        }

        if let Some(rest) = remaining.filter(|r| !r.is_empty()) {
            return Err(ReaderError::UnclaimedFiles(rest));
        }
        Ok(readers)
    }

    fn find_file_readers(&mut self, files: &[String]) -> Result<Vec<ConfigReader>> {
        let mut remaining = files.to_vec();
        let mut readers = Vec::new();

        for config in self.configs()? {
            if remaining.is_empty() {
                break;
            }
            let (claimed, rest) = assign_matching_files(&config, &remaining)?;
            remaining = rest;
            if claimed.is_empty() {
                continue;
            }

            let mut outcome = FinderOutcome::new(config.name());
            outcome.advance(FinderState::ConfigLoaded);
            let reader = self.build(config, claimed, &mut outcome);
            self.collect(reader, outcome, &mut readers)?;
        }

        if !remaining.is_empty() {
            return Err(ReaderError::UnclaimedFiles(remaining));
        }
        Ok(readers)
    }

    /// Records the attempt and keeps the reader. A reader left with nothing
    /// to read is skipped; any other failure ends the search.
    fn collect(
        &mut self,
        reader: Result<ConfigReader>,
        mut outcome: FinderOutcome,
        readers: &mut Vec<ConfigReader>,
    ) -> Result<()> {
        let result = match reader {
            Ok(reader) => {
                readers.push(reader);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(reader = %outcome.reader, error = %e, "Skipping reader");
                outcome.fail(&e);
                Ok(())
            }
            Err(e) => {
                outcome.fail(&e);
                Err(e)
            }
        };
        self.outcomes.push(outcome);
        result
    }

    fn build(&self, config: ReaderConfig, files: Vec<String>, outcome: &mut FinderOutcome) -> Result<ConfigReader> {
        outcome.filenames = files.clone();
        outcome.advance(FinderState::FilesAssigned);
        let filter = self.info.granule_filter(&config);
        let reader = ConfigReader::new(config, &files, &self.handlers, &filter)?;
        outcome.advance(FinderState::Ready);
        Ok(reader)
    }

    /// Valid configurations in the config directory, one per reader name.
    fn configs(&self) -> Result<Vec<ReaderConfig>> {
        let mut seen = HashSet::new();
        let mut configs = Vec::new();
        for path in reader_config_paths(&self.config_dir)? {
            match load_reader_config(&path) {
                Ok(config) => {
                    if seen.insert(config.name().to_string()) {
                        configs.push(config);
                    }
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Invalid reader config found");
                }
            }
        }
        Ok(configs)
    }
}

/// Split `files` into those the reader's patterns claim and the rest.
///
/// Only base names are compared.
pub fn assign_matching_files(config: &ReaderConfig, files: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    let mut globs = Vec::new();
    for template in config.file_patterns() {
        globs.push(FilePattern::new(template)?.base_name_glob()?);
    }

    let (claimed, remaining): (Vec<String>, Vec<String>) = files
        .iter()
        .cloned()
        .partition(|f| globs.iter().any(|g| g.matches(base_name(f))));
    Ok((claimed, remaining))
}

//! Reader configuration loading.
//!
//! One YAML document describes one reader: the files it understands, the
//! variables inside them, and the datasets those variables provide. Loading
//! expands `${VAR}` / `${VAR:-default}` references, parses the document and
//! validates cross references before anything else sees it.

use chrono::{DateTime, Utc};
use dataset_id::{Calibration, DatasetId, DatasetMeta, Describe, Wavelength};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ReaderError, Result};
use crate::multi_granule::JoinMethod;
use crate::pattern::FilePattern;

/// Handler used when neither the file type nor the reader names one.
pub const DEFAULT_FILE_READER: &str = "filename";

// ============================================================================
// Configuration Structures
// ============================================================================

/// A complete reader configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub reader: ReaderSection,
    #[serde(default)]
    pub file_types: Vec<FileTypeConfig>,
    #[serde(default)]
    pub file_keys: Vec<FileKeyConfig>,
    #[serde(default)]
    pub navigations: Vec<NavigationConfig>,
    #[serde(default)]
    pub calibrations: Vec<CalibrationConfig>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub metadata: Vec<MetadataConfig>,

    /// File the configuration was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub sensors: Vec<String>,
    #[serde(default = "default_file_reader")]
    pub default_file_reader: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Default area of interest as a closed lon/lat boundary.
    #[serde(default)]
    pub area: Option<Vec<[f64; 2]>>,
}

fn default_file_reader() -> String {
    DEFAULT_FILE_READER.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeConfig {
    pub name: String,
    #[serde(deserialize_with = "one_or_many")]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub file_reader: Option<String>,
}

/// A variable inside a file, with its optional linear calibration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileKeyConfig {
    pub name: String,
    #[serde(default)]
    pub variable_name: Option<String>,
    #[serde(default)]
    pub scaling_factors: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub file_units: Option<String>,
    #[serde(default)]
    pub standard_name: Option<String>,
}

impl FileKeyConfig {
    /// Name of the variable in the file, defaulting to the key name.
    pub fn variable(&self) -> &str {
        self.variable_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_scaled(&self) -> bool {
        self.scaling_factors.is_some() || self.offset.is_some()
    }

    pub fn scale(&self, raw: f64) -> f64 {
        raw * self.scaling_factors.unwrap_or(1.0) + self.offset.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    pub name: String,
    pub file_type: String,
    pub longitude_key: String,
    pub latitude_key: String,
    #[serde(default)]
    pub rows_per_scan: Option<usize>,
}

/// Overrides applied when a dataset is loaded at a given calibration level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub navigation: Option<String>,
}

/// A dataset and all of its resolution / calibration / polarization variants.
///
/// List-valued fields are zipped positionally with `resolution`; a single
/// value is repeated for every variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    #[serde(default)]
    pub wavelength_range: Option<Vec<f64>>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub resolution: Vec<f64>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub calibration: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub polarization: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub file_type: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub file_key: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub navigation: Vec<String>,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

/// Where a metadata item is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetadataSource {
    /// The file type of the dataset being loaded.
    Dataset,
    /// The file type of the dataset's navigation.
    Navigation,
    FileType(String),
}

impl From<String> for MetadataSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "DATASET" => MetadataSource::Dataset,
            "NAVIGATION" => MetadataSource::Navigation,
            _ => MetadataSource::FileType(value),
        }
    }
}

impl From<MetadataSource> for String {
    fn from(value: MetadataSource) -> Self {
        match value {
            MetadataSource::Dataset => "DATASET".to_string(),
            MetadataSource::Navigation => "NAVIGATION".to_string(),
            MetadataSource::FileType(name) => name,
        }
    }
}

impl Default for MetadataSource {
    fn default() -> Self {
        MetadataSource::Dataset
    }
}

/// Whether a metadata item lands on the dataset or on its swath area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataDestination {
    #[default]
    #[serde(alias = "DATASET")]
    Dataset,
    #[serde(alias = "AREA")]
    Area,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub name: String,
    #[serde(default)]
    pub file_type: MetadataSource,
    pub file_key: String,
    #[serde(default = "default_join_method")]
    pub join_method: String,
    #[serde(default)]
    pub axis: usize,
    #[serde(default)]
    pub destination: MetadataDestination,
}

fn default_join_method() -> String {
    "append".to_string()
}

fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match Option::<Repr<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Repr::One(value)) => vec![value],
        Some(Repr::Many(values)) => values,
    })
}

// ============================================================================
// Dataset Variants
// ============================================================================

/// One concrete variant of a configured dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub meta: DatasetMeta,
    pub file_type: Option<String>,
    pub file_key: Option<String>,
    pub navigation: Option<String>,
    pub standard_name: Option<String>,
    pub units: Option<String>,
}

impl DatasetInfo {
    pub fn id(&self) -> DatasetId {
        self.meta.to_id(None)
    }
}

impl Describe for DatasetInfo {
    fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DatasetMeta {
        &mut self.meta
    }
}

impl DatasetConfig {
    pub fn wavelength(&self) -> Result<Option<Wavelength>> {
        match self.wavelength_range.as_deref() {
            None => Ok(None),
            Some([min, center, max]) => Wavelength::range(*min, *center, *max)
                .map(Some)
                .map_err(|e| ReaderError::config(format!("Dataset '{}': {}", self.name, e))),
            Some(other) => Err(ReaderError::config(format!(
                "Dataset '{}': wavelength_range needs [min, center, max], got {} values",
                self.name,
                other.len()
            ))),
        }
    }

    fn calibrations(&self) -> Result<Vec<Calibration>> {
        self.calibration
            .iter()
            .map(|c| {
                Calibration::from_str(c)
                    .map_err(|e| ReaderError::config(format!("Dataset '{}': {}", self.name, e)))
            })
            .collect()
    }

    /// Expand into one variant per resolution entry.
    pub fn variants(&self) -> Result<Vec<DatasetInfo>> {
        let wavelength = self.wavelength()?;
        let calibrations = self.calibrations()?;
        let count = self.resolution.len().max(1);

        let resolutions = spread(&self.name, "resolution", &self.resolution, count)?;
        let calibrations = spread(&self.name, "calibration", &calibrations, count)?;
        let polarizations = spread(&self.name, "polarization", &self.polarization, count)?;
        let file_types = spread(&self.name, "file_type", &self.file_type, count)?;
        let file_keys = spread(&self.name, "file_key", &self.file_key, count)?;
        let navigations = spread(&self.name, "navigation", &self.navigation, count)?;

        Ok((0..count)
            .map(|i| DatasetInfo {
                meta: DatasetMeta {
                    name: Some(self.name.clone()),
                    wavelength_range: wavelength,
                    resolution: resolutions[i],
                    polarization: polarizations[i].clone(),
                    calibration: calibrations[i],
                },
                file_type: file_types[i].clone(),
                file_key: file_keys[i].clone(),
                navigation: navigations[i].clone(),
                standard_name: self.standard_name.clone(),
                units: self.units.clone(),
            })
            .collect())
    }
}

/// Line a per-variant list up with `count` variants.
fn spread<T: Clone>(dataset: &str, field: &str, values: &[T], count: usize) -> Result<Vec<Option<T>>> {
    match values.len() {
        0 => Ok(vec![None; count]),
        1 => Ok(vec![Some(values[0].clone()); count]),
        n if n == count => Ok(values.iter().cloned().map(Some).collect()),
        n => Err(ReaderError::config(format!(
            "Dataset '{}': {} has {} entries for {} resolutions",
            dataset, field, n, count
        ))),
    }
}

// ============================================================================
// Lookups
// ============================================================================

impl ReaderConfig {
    pub fn name(&self) -> &str {
        &self.reader.name
    }

    pub fn file_type(&self, name: &str) -> Option<&FileTypeConfig> {
        self.file_types.iter().find(|ft| ft.name == name)
    }

    pub fn file_key(&self, name: &str) -> Option<&FileKeyConfig> {
        self.file_keys.iter().find(|fk| fk.name == name)
    }

    pub fn navigation(&self, name: &str) -> Option<&NavigationConfig> {
        self.navigations.iter().find(|n| n.name == name)
    }

    pub fn calibration(&self, calibration: Calibration) -> Option<&CalibrationConfig> {
        self.calibrations
            .iter()
            .find(|c| c.name == calibration.as_str())
    }

    pub fn metadata_item(&self, name: &str) -> Option<&MetadataConfig> {
        self.metadata.iter().find(|m| m.name == name)
    }

    /// Every file pattern of every file type, in configuration order.
    pub fn file_patterns(&self) -> impl Iterator<Item = &str> + '_ {
        self.file_types
            .iter()
            .flat_map(|ft| ft.file_patterns.iter().map(String::as_str))
    }

    /// Handler registry key for a file type.
    pub fn file_reader_for<'a>(&'a self, file_type: &'a FileTypeConfig) -> &'a str {
        file_type
            .file_reader
            .as_deref()
            .unwrap_or(&self.reader.default_file_reader)
    }

    pub fn has_sensor(&self, sensors: &HashSet<String>) -> bool {
        self.reader.sensors.iter().any(|s| sensors.contains(s))
    }

    /// All dataset variants in configuration order.
    pub fn dataset_variants(&self) -> Result<Vec<DatasetInfo>> {
        let mut out = Vec::new();
        for dataset in &self.datasets {
            out.extend(dataset.variants()?);
        }
        Ok(out)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    pub fn validate(&self) -> Result<()> {
        let ensure = |ok: bool, msg: String| if ok { Ok(()) } else { Err(ReaderError::config(msg)) };
        let name = &self.reader.name;

        ensure(!name.trim().is_empty(), "Reader name cannot be empty".to_string())?;
        ensure(
            !self.file_types.is_empty(),
            format!("Reader '{}' has no file types", name),
        )?;

        unique_names(name, "file_types", self.file_types.iter().map(|f| f.name.as_str()))?;
        unique_names(name, "file_keys", self.file_keys.iter().map(|f| f.name.as_str()))?;
        unique_names(name, "navigations", self.navigations.iter().map(|n| n.name.as_str()))?;
        unique_names(name, "calibrations", self.calibrations.iter().map(|c| c.name.as_str()))?;
        unique_names(name, "metadata", self.metadata.iter().map(|m| m.name.as_str()))?;

        for file_type in &self.file_types {
            ensure(
                !file_type.file_patterns.is_empty(),
                format!("File type '{}' has no file patterns", file_type.name),
            )?;
            for pattern in &file_type.file_patterns {
                FilePattern::new(pattern)?;
            }
        }

        for nav in &self.navigations {
            self.ensure_file_type(&nav.file_type, "navigation", &nav.name)?;
        }

        for cal in &self.calibrations {
            Calibration::from_str(&cal.name).map_err(|e| ReaderError::config(e.to_string()))?;
            self.ensure_refs(cal.file_type.as_deref(), cal.file_key.as_deref(), cal.navigation.as_deref(), &cal.name)?;
        }

        for dataset in &self.datasets {
            for variant in dataset.variants()? {
                self.ensure_refs(
                    variant.file_type.as_deref(),
                    variant.file_key.as_deref(),
                    variant.navigation.as_deref(),
                    &dataset.name,
                )?;
            }
        }

        for item in &self.metadata {
            JoinMethod::from_str(&item.join_method)?;
            if let MetadataSource::FileType(file_type) = &item.file_type {
                self.ensure_file_type(file_type, "metadata", &item.name)?;
            }
        }

        Ok(())
    }

    fn ensure_file_type(&self, file_type: &str, section: &str, owner: &str) -> Result<()> {
        if self.file_type(file_type).is_none() {
            return Err(ReaderError::config(format!(
                "{} '{}' refers to unknown file type '{}'",
                section, owner, file_type
            )));
        }
        Ok(())
    }

    fn ensure_refs(
        &self,
        file_type: Option<&str>,
        file_key: Option<&str>,
        navigation: Option<&str>,
        owner: &str,
    ) -> Result<()> {
        if let Some(file_type) = file_type {
            self.ensure_file_type(file_type, "dataset", owner)?;
        }
        if let Some(key) = file_key {
            if self.file_key(key).is_none() {
                return Err(ReaderError::config(format!(
                    "dataset '{}' refers to unknown file key '{}'",
                    owner, key
                )));
            }
        }
        if let Some(nav) = navigation {
            if self.navigation(nav).is_none() {
                return Err(ReaderError::config(format!(
                    "dataset '{}' refers to unknown navigation '{}'",
                    owner, nav
                )));
            }
        }
        Ok(())
    }
}

fn unique_names<'a>(reader: &str, section: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ReaderError::config(format!(
                "Reader '{}' declares '{}' twice in {}",
                reader, name, section
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Parse a reader configuration from YAML text.
pub fn parse_reader_config(content: &str) -> Result<ReaderConfig> {
    let expanded = expand_env_vars(content)?;
    let config: ReaderConfig = serde_yaml::from_str(&expanded)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate one reader configuration file.
pub fn load_reader_config<P: AsRef<Path>>(path: P) -> Result<ReaderConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut config = parse_reader_config(&content).map_err(|e| match e {
        ReaderError::Config(msg) => ReaderError::config(format!("{}: {}", path.display(), msg)),
        e @ ReaderError::Substitution { .. } => ReaderError::config(format!("{}: {}", path.display(), e)),
        other => other,
    })?;
    config.source = Some(path.to_path_buf());
    debug!(reader = %config.reader.name, path = %path.display(), "Loaded reader config");
    Ok(config)
}

/// Whether `path` looks like a reader configuration file.
pub fn is_reader_config(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("yaml" | "yml"))
}

/// All `*.yaml` / `*.yml` files under a configuration directory, sorted.
pub fn reader_config_paths<P: AsRef<Path>>(config_dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(config_dir.as_ref()).follow_links(true) {
        let entry = entry.map_err(|e| ReaderError::config(e.to_string()))?;
        let path = entry.path();
        if entry.file_type().is_file() && is_reader_config(path) {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Locate the configuration for a reader given its name or a path.
pub fn find_reader_config<P: AsRef<Path>>(config_dir: P, reader: &str) -> Result<ReaderConfig> {
    let direct = Path::new(reader);
    if direct.is_file() {
        return load_reader_config(direct);
    }

    let paths = reader_config_paths(config_dir)?;
    let by_stem = paths
        .iter()
        .find(|p| p.file_stem().and_then(|s| s.to_str()) == Some(reader));
    if let Some(path) = by_stem {
        return load_reader_config(path);
    }

    for path in &paths {
        match load_reader_config(path) {
            Ok(config) if config.reader.name == reader => return Ok(config),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "Skipping invalid reader config"),
        }
    }
    Err(ReaderError::ReaderNotFound(reader.to_string()))
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references in reader YAML.
///
/// A default is used when the variable is unset or empty. `$$` yields a
/// literal `$`; a `$` not followed by `{` is kept as is. Defaults can't
/// contain `}`, so filename-template fields stay outside of them.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(idx) = rest.find('$') {
        out.push_str(&rest[..idx]);
        let offset = content.len() - rest.len() + idx;
        let tail = &rest[idx + 1..];

        if let Some(after) = tail.strip_prefix('$') {
            out.push('$');
            rest = after;
        } else if let Some(body) = tail.strip_prefix('{') {
            let close = body
                .find('}')
                .ok_or_else(|| substitution_error(content, offset, "unclosed '${'".to_string()))?;
            let value = substitute(&body[..close]).map_err(|msg| substitution_error(content, offset, msg))?;
            out.push_str(&value);
            rest = &body[close + 1..];
        } else {
            out.push('$');
            rest = tail;
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn substitute(expr: &str) -> std::result::Result<String, String> {
    let (name, default) = match expr.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (expr, None),
    };
    if !is_env_name(name) {
        return Err(format!("invalid variable name '{}'", name));
    }
    match (std::env::var(name), default) {
        (Ok(value), _) if !value.is_empty() => Ok(value),
        (_, Some(default)) => Ok(default.to_string()),
        (Ok(value), None) => Ok(value),
        (Err(_), None) => Err(format!("environment variable '{}' is not set", name)),
    }
}

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn substitution_error(content: &str, offset: usize, message: String) -> ReaderError {
    ReaderError::Substitution {
        line: content[..offset].matches('\n').count() + 1,
        message,
    }
}

// ============================================================================
// Tests
// ============================================================================

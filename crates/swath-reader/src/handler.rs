//! Per-file handlers.
//!
//! A [`FileHandler`] is opened for every file a reader claims. Everything
//! above this layer (granule filtering, swath assembly, the reader itself)
//! talks to files only through this trait. Handlers are built by factories
//! registered by name in a [`HandlerRegistry`] that the caller passes in.

use chrono::{DateTime, Utc};
use ndarray::ArrayViewMutD;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::config::{FileTypeConfig, ReaderSection, DEFAULT_FILE_READER};
use crate::error::{ReaderError, Result};
use crate::pattern::{FieldValue, FilePattern, FilenameFields};

/// Outline of a granule as longitude/latitude vertices, in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
}

impl Ring {
    pub fn new(lons: Vec<f64>, lats: Vec<f64>) -> Self {
        Self { lons, lats }
    }

    /// Ring from (lon, lat) pairs.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let (lons, lats) = points.iter().copied().unzip();
        Self { lons, lats }
    }
}

/// A metadata value read from a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Int(i64),
    Float(f64),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    pub fn as_list(&self) -> Option<&[MetadataValue]> {
        match self {
            MetadataValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&FieldValue> for MetadataValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => MetadataValue::Text(s.clone()),
            FieldValue::Int(i) => MetadataValue::Int(*i),
            FieldValue::Time(_) => MetadataValue::Text(value.to_string()),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => f.write_str(s),
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Access to one granule file.
///
/// Start and end times are fixed when the handler is built. Any file
/// resource is owned by the handler and released when it is dropped.
pub trait FileHandler: Send {
    fn filename(&self) -> &str;

    fn file_type(&self) -> &str;

    fn start_time(&self) -> DateTime<Utc>;

    fn end_time(&self) -> DateTime<Utc>;

    /// Granule outline, or `None` when the format can't provide one.
    fn ring_lonlats(&self) -> Option<Ring> {
        None
    }

    fn begin_orbit_number(&self) -> u32 {
        0
    }

    fn end_orbit_number(&self) -> u32 {
        0
    }

    fn platform_name(&self) -> Option<&str>;

    fn sensor_name(&self) -> Option<&str>;

    /// Native shape of a swath variable. The first dimension is rows.
    fn shape(&self, item: &str) -> Result<Vec<usize>>;

    /// Fill the caller's row slice with raw values of `item`. Samples the
    /// file flags as invalid are set to `true` in `mask_out`.
    fn read_swath(
        &self,
        item: &str,
        data_out: ArrayViewMutD<'_, f64>,
        mask_out: ArrayViewMutD<'_, bool>,
    ) -> Result<()>;

    fn metadata(&self, item: &str) -> Result<MetadataValue>;

    fn file_units(&self, _item: &str) -> Option<String> {
        None
    }
}

// ============================================================================
// Handler Registry
// ============================================================================

/// What a handler factory gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    pub reader: &'a ReaderSection,
    pub file_type: &'a FileTypeConfig,
    pub filename: &'a str,
    /// The file type pattern that claimed the file.
    pub pattern: &'a FilePattern,
}

impl HandlerContext<'_> {
    /// Template fields parsed from the filename.
    pub fn fields(&self) -> Option<FilenameFields> {
        self.pattern.parse(self.filename)
    }
}

pub type HandlerFactory =
    Box<dyn Fn(&HandlerContext<'_>) -> Result<Box<dyn FileHandler>> + Send + Sync>;

/// Handler factories by name.
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// A registry with no factories at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding the built-in [`FilenameHandler`].
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_FILE_READER, |ctx| {
            Ok(Box::new(FilenameHandler::open(ctx)?) as Box<dyn FileHandler>)
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&HandlerContext<'_>) -> Result<Box<dyn FileHandler>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Open a handler with the named factory.
    pub fn open(&self, name: &str, ctx: &HandlerContext<'_>) -> Result<Box<dyn FileHandler>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            ReaderError::config(format!(
                "Unknown file reader '{}' for file type '{}'",
                name, ctx.file_type.name
            ))
        })?;
        factory(ctx)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("HandlerRegistry").field("factories", &names).finish()
    }
}

// ============================================================================
// Filename Handler
// ============================================================================

/// Handler that knows only what the filename says.
///
/// Times, platform and orbit come from the template fields `start_time`
/// (or `nominal_time`), `end_time`, `platform` (or `platform_name`) and
/// `orbit`. It has no swath variables.
#[derive(Debug, Clone)]
pub struct FilenameHandler {
    filename: String,
    file_type: String,
    fields: FilenameFields,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    platform: Option<String>,
    sensor: Option<String>,
    orbit: u32,
}

impl FilenameHandler {
    pub fn open(ctx: &HandlerContext<'_>) -> Result<Self> {
        let fields = ctx.fields().ok_or_else(|| {
            ReaderError::handler(
                ctx.filename,
                format!("name doesn't follow pattern '{}'", ctx.pattern),
            )
        })?;
        let start_time = fields
            .start_time()
            .ok_or_else(|| ReaderError::handler(ctx.filename, "no start time in filename"))?;
        let end_time = fields.end_time().unwrap_or(start_time);
        let platform = fields
            .text("platform")
            .or_else(|| fields.text("platform_name"))
            .map(str::to_string);
        let orbit = fields
            .get("orbit")
            .and_then(FieldValue::as_int)
            .and_then(|o| u32::try_from(o).ok())
            .unwrap_or(0);

        Ok(Self {
            filename: ctx.filename.to_string(),
            file_type: ctx.file_type.name.clone(),
            start_time,
            end_time,
            platform,
            sensor: ctx.reader.sensors.first().cloned(),
            orbit,
            fields,
        })
    }

    pub fn fields(&self) -> &FilenameFields {
        &self.fields
    }
}

impl FileHandler for FilenameHandler {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn file_type(&self) -> &str {
        &self.file_type
    }

    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    fn begin_orbit_number(&self) -> u32 {
        self.orbit
    }

    fn end_orbit_number(&self) -> u32 {
        self.orbit
    }

    fn platform_name(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    fn sensor_name(&self) -> Option<&str> {
        self.sensor.as_deref()
    }

    fn shape(&self, item: &str) -> Result<Vec<usize>> {
        Err(ReaderError::missing_item(item, &self.filename))
    }

    fn read_swath(
        &self,
        item: &str,
        _data_out: ArrayViewMutD<'_, f64>,
        _mask_out: ArrayViewMutD<'_, bool>,
    ) -> Result<()> {
        Err(ReaderError::missing_item(item, &self.filename))
    }

    fn metadata(&self, item: &str) -> Result<MetadataValue> {
        self.fields
            .get(item)
            .map(MetadataValue::from)
            .ok_or_else(|| ReaderError::missing_item(item, &self.filename))
    }
}

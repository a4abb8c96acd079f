//! Swath access across consecutive granules of one file type.

use chrono::{DateTime, Utc};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::config::FileKeyConfig;
use crate::error::{ReaderError, Result};
use crate::handler::{FileHandler, MetadataValue, Ring};
use crate::masked::MaskedArray;

/// File keys by name, shared by every multi-granule reader of a reader.
pub type FileKeyTable = Arc<HashMap<String, FileKeyConfig>>;

/// How per-granule metadata values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMethod {
    /// Concatenate granule values along an axis.
    Append,
    /// One entry per granule.
    AppendGranule,
    /// Concatenate granule-level sequences directly.
    ExtendGranule,
    /// The first granule's value.
    First,
}

impl JoinMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinMethod::Append => "append",
            JoinMethod::AppendGranule => "append_granule",
            JoinMethod::ExtendGranule => "extend_granule",
            JoinMethod::First => "first",
        }
    }
}

impl FromStr for JoinMethod {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(JoinMethod::Append),
            "append_granule" => Ok(JoinMethod::AppendGranule),
            "extend_granule" => Ok(JoinMethod::ExtendGranule),
            "first" => Ok(JoinMethod::First),
            other => Err(ReaderError::UnknownJoinMethod(other.to_string())),
        }
    }
}

impl fmt::Display for JoinMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The granules of one file type, read as a single swath.
///
/// Granules are held in ascending start time order. Swath variables are
/// stacked along their first (row) dimension.
pub struct MultiGranuleReader {
    file_type: String,
    handlers: Vec<Box<dyn FileHandler>>,
    file_keys: FileKeyTable,
}

impl MultiGranuleReader {
    pub fn new(
        file_type: impl Into<String>,
        mut handlers: Vec<Box<dyn FileHandler>>,
        file_keys: FileKeyTable,
    ) -> Result<Self> {
        let file_type = file_type.into();
        if handlers.is_empty() {
            return Err(ReaderError::config(format!(
                "No granules for file type '{}'",
                file_type
            )));
        }
        handlers.sort_by_key(|h| h.start_time());
        Ok(Self {
            file_type,
            handlers,
            file_keys,
        })
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn granule_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn handlers(&self) -> &[Box<dyn FileHandler>] {
        &self.handlers
    }

    fn first(&self) -> &dyn FileHandler {
        self.handlers[0].as_ref()
    }

    fn last(&self) -> &dyn FileHandler {
        self.handlers[self.handlers.len() - 1].as_ref()
    }

    pub fn filenames(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.filename()).collect()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.first().start_time()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.last().end_time()
    }

    pub fn ring_lonlats(&self) -> Vec<Option<Ring>> {
        self.handlers.iter().map(|h| h.ring_lonlats()).collect()
    }

    pub fn begin_orbit_number(&self) -> u32 {
        self.first().begin_orbit_number()
    }

    pub fn end_orbit_number(&self) -> u32 {
        self.last().end_orbit_number()
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.first().platform_name()
    }

    pub fn sensor_name(&self) -> Option<&str> {
        self.first().sensor_name()
    }

    /// Units of `item`: the configured units, else what the file says.
    pub fn units(&self, item: &str) -> Option<String> {
        let key = self.file_keys.get(item);
        if let Some(units) = key.and_then(|k| k.units.clone()) {
            return Some(units);
        }
        let variable = key.map_or(item, |k| k.variable());
        self.first()
            .file_units(variable)
            .or_else(|| key.and_then(|k| k.file_units.clone()))
    }

    /// Stack `item` from every granule and apply the file key's scaling.
    pub fn get_swath_data(&self, item: &str) -> Result<MaskedArray> {
        let key = self.file_keys.get(item);
        let variable = key.map_or(item, |k| k.variable());

        let shapes = self
            .handlers
            .iter()
            .map(|h| h.shape(variable))
            .collect::<Result<Vec<_>>>()?;

        let first = &shapes[0];
        if first.is_empty() {
            return Err(ReaderError::config(format!(
                "'{}' in {} has no row dimension",
                item,
                self.first().filename()
            )));
        }
        let trailing = &first[1..];
        for (handler, shape) in self.handlers.iter().zip(&shapes) {
            if shape.is_empty() || &shape[1..] != trailing {
                return Err(ReaderError::ShapeMismatch {
                    item: item.to_string(),
                    filename: handler.filename().to_string(),
                    expected: trailing.to_vec(),
                    found: shape.get(1..).map(<[usize]>::to_vec).unwrap_or_default(),
                });
            }
        }

        let rows: usize = shapes.iter().map(|s| s[0]).sum();
        let mut out_shape = vec![rows];
        out_shape.extend_from_slice(trailing);
        let mut data = ArrayD::<f64>::zeros(IxDyn(&out_shape));
        let mut mask = ArrayD::from_elem(IxDyn(&out_shape), false);

        let scaling = key.filter(|k| k.is_scaled());
        let mut row = 0;
        for (handler, shape) in self.handlers.iter().zip(&shapes) {
            let slice = Slice::from(row..row + shape[0]);
            let mut data_rows = data.slice_axis_mut(Axis(0), slice);
            let mask_rows = mask.slice_axis_mut(Axis(0), slice);
            handler.read_swath(variable, data_rows.view_mut(), mask_rows)?;
            if let Some(key) = scaling {
                data_rows.mapv_inplace(|v| key.scale(v));
            }
            row += shape[0];
        }

        debug!(
            file_type = %self.file_type,
            item,
            granules = self.handlers.len(),
            shape = ?out_shape,
            "Assembled swath"
        );
        MaskedArray::new(data, mask)
    }

    /// Join a metadata item across granules, naming the join method.
    pub fn load_metadata(&self, item: &str, join_method: &str, axis: usize) -> Result<MetadataValue> {
        self.join_metadata(item, join_method.parse()?, axis)
    }

    pub fn join_metadata(&self, item: &str, join: JoinMethod, axis: usize) -> Result<MetadataValue> {
        if join == JoinMethod::First {
            return self.first().metadata(item);
        }
        let values = self
            .handlers
            .iter()
            .map(|h| h.metadata(item))
            .collect::<Result<Vec<_>>>()?;
        let values = match join {
            JoinMethod::AppendGranule => values
                .into_iter()
                .map(|v| MetadataValue::List(vec![v]))
                .collect(),
            _ => values,
        };
        concatenate(item, values, axis)
    }
}

impl fmt::Debug for MultiGranuleReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiGranuleReader")
            .field("file_type", &self.file_type)
            .field("filenames", &self.filenames())
            .finish()
    }
}

/// Concatenate list values along `axis`.
fn concatenate(item: &str, values: Vec<MetadataValue>, axis: usize) -> Result<MetadataValue> {
    let join_error = |message: String| ReaderError::MetadataJoin {
        item: item.to_string(),
        message,
    };

    let mut lists = Vec::with_capacity(values.len());
    for value in values {
        match value {
            MetadataValue::List(items) => lists.push(items),
            other => {
                return Err(join_error(format!(
                    "can't concatenate scalar value {} along axis {}",
                    other, axis
                )))
            }
        }
    }

    if axis == 0 {
        return Ok(MetadataValue::List(lists.into_iter().flatten().collect()));
    }

    let width = lists.first().map_or(0, Vec::len);
    if lists.iter().any(|l| l.len() != width) {
        return Err(join_error(format!(
            "granule values differ in length along axis 0, can't join along axis {}",
            axis
        )));
    }
    let mut columns: Vec<Vec<MetadataValue>> = vec![Vec::with_capacity(lists.len()); width];
    for list in lists {
        for (i, value) in list.into_iter().enumerate() {
            columns[i].push(value);
        }
    }
    let joined = columns
        .into_iter()
        .map(|column| concatenate(item, column, axis - 1))
        .collect::<Result<Vec<_>>>()?;
    Ok(MetadataValue::List(joined))
}

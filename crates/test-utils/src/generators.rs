//! Synthetic granules for exercising readers without real files.
//!
//! A [`MemoryGranule`] holds its variables as in-memory arrays. Granules are
//! collected in a [`GranuleStore`] keyed by file base name; the store then
//! registers a `memory` file reader that hands out the stored granule for
//! whichever file a reader claims.

use chrono::{DateTime, TimeZone, Utc};
use ndarray::{ArrayD, ArrayViewMutD, IxDyn};
use std::collections::HashMap;
use std::sync::Arc;
use swath_reader::pattern::base_name;
use swath_reader::{FileHandler, HandlerContext, HandlerRegistry, MetadataValue, ReaderError, Ring};

/// Name the store registers its factory under.
pub const MEMORY_FILE_READER: &str = "memory";

/// `2020-01-01` at the given time.
pub fn jan1(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, hour, minute, 0)
        .single()
        .expect("valid test time")
}

/// A variable with a predictable pattern.
///
/// Each value is `base + row * 10 + col`, so stacked granules can be told
/// apart by `base`.
pub fn patterned(rows: usize, cols: usize, base: f64) -> ArrayD<f64> {
    ArrayD::from_shape_fn(IxDyn(&[rows, cols]), |idx| base + (idx[0] * 10 + idx[1]) as f64)
}

/// An in-memory granule.
#[derive(Debug, Clone)]
pub struct MemoryGranule {
    pub filename: String,
    pub file_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: Option<String>,
    pub sensor: Option<String>,
    pub begin_orbit: u32,
    pub end_orbit: u32,
    pub ring: Option<Ring>,
    pub variables: HashMap<String, (ArrayD<f64>, ArrayD<bool>)>,
    pub units: HashMap<String, String>,
    pub metadata: HashMap<String, MetadataValue>,
}

impl MemoryGranule {
    pub fn new(filename: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            filename: filename.into(),
            file_type: String::new(),
            start_time,
            end_time,
            platform: None,
            sensor: None,
            begin_orbit: 0,
            end_orbit: 0,
            ring: None,
            variables: HashMap::new(),
            units: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn sensor(mut self, sensor: impl Into<String>) -> Self {
        self.sensor = Some(sensor.into());
        self
    }

    pub fn orbits(mut self, begin: u32, end: u32) -> Self {
        self.begin_orbit = begin;
        self.end_orbit = end;
        self
    }

    pub fn ring(mut self, points: &[(f64, f64)]) -> Self {
        self.ring = Some(Ring::from_points(points));
        self
    }

    /// Adds an unmasked variable.
    pub fn variable(self, name: impl Into<String>, data: ArrayD<f64>) -> Self {
        let mask = ArrayD::from_elem(data.raw_dim(), false);
        self.masked_variable(name, data, mask)
    }

    pub fn masked_variable(mut self, name: impl Into<String>, data: ArrayD<f64>, mask: ArrayD<bool>) -> Self {
        self.variables.insert(name.into(), (data, mask));
        self
    }

    pub fn units(mut self, variable: impl Into<String>, units: impl Into<String>) -> Self {
        self.units.insert(variable.into(), units.into());
        self
    }

    pub fn metadata(mut self, name: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(name.into(), value);
        self
    }

    fn variable_data(&self, item: &str) -> swath_reader::Result<&(ArrayD<f64>, ArrayD<bool>)> {
        self.variables
            .get(item)
            .ok_or_else(|| ReaderError::missing_item(item, &self.filename))
    }
}

impl FileHandler for MemoryGranule {
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

    fn ring_lonlats(&self) -> Option<Ring> {
        self.ring.clone()
    }

    fn begin_orbit_number(&self) -> u32 {
        self.begin_orbit
    }

    fn end_orbit_number(&self) -> u32 {
        self.end_orbit
    }

    fn platform_name(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    fn sensor_name(&self) -> Option<&str> {
        self.sensor.as_deref()
    }

    fn shape(&self, item: &str) -> swath_reader::Result<Vec<usize>> {
        Ok(self.variable_data(item)?.0.shape().to_vec())
    }

    fn read_swath(
        &self,
        item: &str,
        mut data_out: ArrayViewMutD<'_, f64>,
        mut mask_out: ArrayViewMutD<'_, bool>,
    ) -> swath_reader::Result<()> {
        let (data, mask) = self.variable_data(item)?;
        data_out.assign(data);
        mask_out.assign(mask);
        Ok(())
    }

    fn metadata(&self, item: &str) -> swath_reader::Result<MetadataValue> {
        self.metadata
            .get(item)
            .cloned()
            .ok_or_else(|| ReaderError::missing_item(item, &self.filename))
    }

    fn file_units(&self, item: &str) -> Option<String> {
        self.units.get(item).cloned()
    }
}

/// Granules by file base name, served through a handler factory.
#[derive(Debug, Clone, Default)]
pub struct GranuleStore {
    granules: HashMap<String, MemoryGranule>,
}

impl GranuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, granule: MemoryGranule) -> Self {
        self.insert(granule);
        self
    }

    pub fn insert(&mut self, granule: MemoryGranule) {
        self.granules
            .insert(base_name(&granule.filename).to_string(), granule);
    }

    /// The stored granule file names, sorted.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.granules.values().map(|g| g.filename.clone()).collect();
        names.sort();
        names
    }

    /// A registry holding the built-in handlers plus a `memory` reader that
    /// serves this store. Files the store doesn't hold fail to open.
    pub fn registry(&self) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        self.register_into(&mut registry);
        registry
    }

    pub fn register_into(&self, registry: &mut HandlerRegistry) {
        let granules = Arc::new(self.granules.clone());
        registry.register(MEMORY_FILE_READER, move |ctx: &HandlerContext<'_>| {
            let mut granule = granules
                .get(base_name(ctx.filename))
                .cloned()
                .ok_or_else(|| ReaderError::handler(ctx.filename, "no such in-memory granule"))?;
            granule.filename = ctx.filename.to_string();
            granule.file_type = ctx.file_type.name.clone();
            Ok(Box::new(granule) as Box<dyn FileHandler>)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterned_values() {
        let data = patterned(2, 3, 100.0);
        assert_eq!(data.shape(), &[2, 3]);
        assert_eq!(data[[0, 0]], 100.0);
        assert_eq!(data[[1, 2]], 112.0);
    }

    #[test]
    fn test_memory_granule_reads_variable() {
        let granule = MemoryGranule::new("/d/a.dat", jan1(10, 0), jan1(10, 5)).variable("v", patterned(2, 2, 0.0));
        assert_eq!(granule.shape("v").unwrap(), vec![2, 2]);
        assert!(granule.shape("w").is_err());

        let mut data = ArrayD::<f64>::zeros(IxDyn(&[2, 2]));
        let mut mask = ArrayD::from_elem(IxDyn(&[2, 2]), true);
        granule.read_swath("v", data.view_mut(), mask.view_mut()).unwrap();
        assert_eq!(data[[1, 1]], 11.0);
        assert!(mask.iter().all(|m| !m));
    }

    #[test]
    fn test_store_registers_memory_reader() {
        let store = GranuleStore::new().with(MemoryGranule::new("/d/a.dat", jan1(10, 0), jan1(10, 5)));
        let registry = store.registry();
        assert!(registry.contains(MEMORY_FILE_READER));
        assert!(registry.contains("filename"));
        assert_eq!(store.filenames(), vec!["/d/a.dat"]);
    }
}

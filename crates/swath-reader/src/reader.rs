//! Readers built from a configuration document and a set of files.

use chrono::{DateTime, Utc};
use dataset_id::{
    Calibration, DatasetId, DatasetIdError, DatasetMeta, DatasetQuery, DatasetRegistry, Describe,
    KeyFilter, Wavelength,
};
use ndarray::ArrayD;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::classifier::identify_file_types;
use crate::config::{DatasetInfo, MetadataDestination, MetadataSource, ReaderConfig};
use crate::error::{ReaderError, Result};
use crate::granule::GranuleFilter;
use crate::handler::{HandlerRegistry, MetadataValue};
use crate::masked::MaskedArray;
use crate::multi_granule::{FileKeyTable, MultiGranuleReader};

/// What to load from a reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadRequest {
    pub datasets: Vec<DatasetQuery>,
    pub calibration: Option<Vec<Calibration>>,
    pub resolution: Option<Vec<f64>>,
    pub polarization: Option<Vec<String>>,
    pub metadata: Option<Vec<String>>,
}

impl LoadRequest {
    pub fn new<Q: Into<DatasetQuery>>(datasets: impl IntoIterator<Item = Q>) -> Self {
        Self {
            datasets: datasets.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn calibration(mut self, values: impl IntoIterator<Item = Calibration>) -> Self {
        self.calibration = Some(values.into_iter().collect());
        self
    }

    pub fn resolution(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.resolution = Some(values.into_iter().collect());
        self
    }

    pub fn polarization<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.polarization = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn metadata<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.metadata = Some(names.into_iter().map(Into::into).collect());
        self
    }

    fn filter(&self) -> KeyFilter {
        KeyFilter {
            resolution: self.resolution.clone(),
            polarization: self.polarization.clone(),
            calibration: self.calibration.clone(),
        }
    }
}

/// Swath geolocation for loaded datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct SwathNavigation {
    pub name: String,
    pub area_id: String,
    pub lons: MaskedArray,
    pub lats: MaskedArray,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rows_per_scan: Option<usize>,
    /// Metadata loaded with an `area` destination.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl SwathNavigation {
    pub fn shape(&self) -> &[usize] {
        self.lons.shape()
    }
}

/// A loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub data: MaskedArray,
    pub area: Option<SwathNavigation>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: Option<String>,
    pub sensor: Option<String>,
    pub start_orbit: u32,
    pub end_orbit: u32,
    pub units: Option<String>,
    pub standard_name: Option<String>,
    pub rows_per_scan: Option<usize>,
    pub file_type: String,
    pub file_key: String,
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Describe for Dataset {
    fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut DatasetMeta {
        &mut self.meta
    }
}

/// Metadata loaded for one dataset, split by destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedMetadata {
    pub dataset: BTreeMap<String, MetadataValue>,
    pub area: BTreeMap<String, MetadataValue>,
}

/// File type, file key and navigation a dataset variant is read from.
#[derive(Debug, Clone, PartialEq)]
struct DatasetSource {
    file_type: Option<String>,
    file_key: String,
    navigation: Option<String>,
}

/// A reader assembled from its configuration and the files it claimed.
#[derive(Debug)]
pub struct ConfigReader {
    config: ReaderConfig,
    datasets: DatasetRegistry<DatasetInfo>,
    file_readers: Vec<MultiGranuleReader>,
    unidentified: Vec<String>,
}

impl ConfigReader {
    /// Classify `filenames`, select granules with `filter` and wrap each file
    /// type's granules in a [`MultiGranuleReader`].
    ///
    /// Every file type left after classification must keep at least one
    /// granule, and all file types must keep the same number of granules.
    pub fn new(
        config: ReaderConfig,
        filenames: &[String],
        handlers: &HandlerRegistry,
        filter: &GranuleFilter,
    ) -> Result<Self> {
        let mut datasets = DatasetRegistry::new();
        for variant in config.dataset_variants()? {
            datasets.insert(variant.id(), variant)?;
        }

        let file_keys: FileKeyTable = Arc::new(
            config
                .file_keys
                .iter()
                .map(|k| (k.name.clone(), k.clone()))
                .collect(),
        );

        let classification = identify_file_types(&config, filenames, handlers)?;
        if classification.groups.is_empty() {
            return Err(ReaderError::NoFilesFound(config.name().to_string()));
        }

        let mut file_readers = Vec::with_capacity(classification.groups.len());
        let mut granules: Option<usize> = None;
        for group in classification.groups {
            let selected = filter.apply(group.handlers)?;
            debug!(
                reader = %config.name(),
                file_type = %group.file_type,
                count = selected.len(),
                "File type granules after selection"
            );
            if selected.is_empty() {
                return Err(ReaderError::NoFilesFound(format!(
                    "{} (no '{}' granules between {:?} and {:?})",
                    config.name(),
                    group.file_type,
                    filter.start_time,
                    filter.end_time
                )));
            }
            match granules {
                Some(n) if n != selected.len() => {
                    return Err(ReaderError::config(format!(
                        "Varying numbers of granules: '{}' has {}, expected {}",
                        group.file_type,
                        selected.len(),
                        n
                    )))
                }
                _ => granules = Some(selected.len()),
            }
            file_readers.push(MultiGranuleReader::new(
                group.file_type,
                selected,
                Arc::clone(&file_keys),
            )?);
        }

        Ok(Self {
            config,
            datasets,
            file_readers,
            unidentified: classification.unidentified,
        })
    }

    pub fn name(&self) -> &str {
        self.config.name()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Files given to the reader that no file type claimed.
    pub fn unidentified_files(&self) -> &[String] {
        &self.unidentified
    }

    /// Configured sensors plus whatever the granules report.
    pub fn sensor_names(&self) -> BTreeSet<String> {
        let mut sensors: BTreeSet<String> = self.config.reader.sensors.iter().cloned().collect();
        sensors.extend(
            self.file_readers
                .iter()
                .filter_map(|fr| fr.sensor_name().map(str::to_string)),
        );
        sensors
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.file_readers.iter().map(|fr| fr.start_time()).min()
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.file_readers.iter().map(|fr| fr.end_time()).max()
    }

    pub fn file_readers(&self) -> &[MultiGranuleReader] {
        &self.file_readers
    }

    pub fn file_reader(&self, file_type: &str) -> Option<&MultiGranuleReader> {
        self.file_readers.iter().find(|fr| fr.file_type() == file_type)
    }

    /// Every configured dataset variant.
    pub fn dataset_ids(&self) -> impl Iterator<Item = &DatasetId> + '_ {
        self.datasets.keys()
    }

    /// Dataset variants whose files were provided.
    pub fn available_dataset_ids(&self) -> Vec<&DatasetId> {
        self.datasets
            .iter()
            .filter(|(_, info)| {
                self.source(info)
                    .file_type
                    .as_deref()
                    .map_or(false, |ft| self.file_reader(ft).is_some())
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Names of the available datasets, without repeats.
    pub fn available_dataset_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.available_dataset_ids()
            .into_iter()
            .filter_map(|id| id.name.as_deref())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    // ========================================================================
    // Key Resolution
    // ========================================================================

    /// Best configured variant for a query.
    pub fn get_dataset_key(&self, query: &DatasetQuery, filter: &KeyFilter) -> Result<DatasetId> {
        self.get_dataset_keys(query, filter)?
            .into_iter()
            .next()
            .ok_or_else(|| DatasetIdError::NotFound(query.to_string()).into())
    }

    /// Configured variants for a query, best first.
    ///
    /// Wavelength queries prefer the nearest band centre, then the finest
    /// resolution. Variants are then ordered by calibration level: the requested calibrations (or the
    /// default preference) highest first, uncalibrated variants last. Fields
    /// set on a composite query take the place of the matching filter.
    pub fn get_dataset_keys(&self, query: &DatasetQuery, filter: &KeyFilter) -> Result<Vec<DatasetId>> {
        let mut filter = filter.clone();
        let (mut candidates, distance): (Vec<&DatasetId>, Option<f64>) = match query {
            DatasetQuery::Name(name) => (self.keys_named(name), None),
            DatasetQuery::Wavelength(w) => (self.keys_containing(*w), Some(*w)),
            DatasetQuery::Id(id) => {
                if let Some(resolution) = id.resolution {
                    filter.resolution = Some(vec![resolution]);
                }
                if let Some(calibration) = id.calibration {
                    filter.calibration = Some(vec![calibration]);
                }
                if let Some(polarization) = &id.polarization {
                    filter.polarization = Some(vec![polarization.clone()]);
                }
                match (&id.name, id.wavelength) {
                    (Some(name), _) => (self.keys_named(name), None),
                    (None, Some(wavelength)) => {
                        let center = wavelength.center();
                        (self.keys_containing(center), Some(center))
                    }
                    (None, None) => return Err(DatasetIdError::NotFound(query.to_string()).into()),
                }
            }
        };
        if candidates.is_empty() {
            return Err(DatasetIdError::NotFound(query.to_string()).into());
        }

        let preference = Calibration::ranked(
            filter
                .calibration
                .as_deref()
                .unwrap_or(&Calibration::default_preference()),
        );

        if let Some(resolution) = &filter.resolution {
            candidates.retain(|id| id.resolution.map_or(false, |r| resolution.contains(&r)));
        }
        candidates.retain(|id| id.calibration.map_or(true, |c| preference.contains(&c)));
        if let Some(polarization) = &filter.polarization {
            candidates.retain(|id| {
                id.polarization
                    .as_ref()
                    .map_or(false, |p| polarization.contains(p))
            });
        }

        let calibration_rank = |id: &DatasetId| {
            id.calibration
                .and_then(|c| preference.iter().position(|p| *p == c))
                .unwrap_or(preference.len())
        };
        let band_distance = |id: &DatasetId| match (distance, id.wavelength) {
            (Some(w), Some(band)) => (band.center() - w).abs(),
            _ => 0.0,
        };
        let resolution = |id: &DatasetId| id.resolution.unwrap_or(f64::INFINITY);
        candidates.sort_by(|a, b| {
            band_distance(a)
                .total_cmp(&band_distance(b))
                .then_with(|| resolution(a).total_cmp(&resolution(b)))
                .then_with(|| calibration_rank(a).cmp(&calibration_rank(b)))
        });

        if candidates.is_empty() {
            return Err(DatasetIdError::NotFound(query.to_string()).into());
        }
        Ok(candidates.into_iter().cloned().collect())
    }

    fn keys_named(&self, name: &str) -> Vec<&DatasetId> {
        self.datasets
            .keys()
            .filter(|id| id.name.as_deref() == Some(name))
            .collect()
    }

    fn keys_containing(&self, wavelength: f64) -> Vec<&DatasetId> {
        self.datasets
            .keys()
            .filter(|id| id.wavelength.as_ref().map_or(false, |w: &Wavelength| w.contains(wavelength)))
            .collect()
    }

    /// File type, key and navigation for a variant, after any calibration
    /// section overrides.
    fn source(&self, info: &DatasetInfo) -> DatasetSource {
        let mut source = DatasetSource {
            file_type: info.file_type.clone(),
            file_key: info
                .file_key
                .clone()
                .or_else(|| info.meta.name.clone())
                .unwrap_or_default(),
            navigation: info.navigation.clone(),
        };
        if let Some(overrides) = info.meta.calibration.and_then(|c| self.config.calibration(c)) {
            if let Some(file_type) = &overrides.file_type {
                source.file_type = Some(file_type.clone());
            }
            if let Some(file_key) = &overrides.file_key {
                source.file_key = file_key.clone();
            }
            if let Some(navigation) = &overrides.navigation {
                source.navigation = Some(navigation.clone());
            }
        }
        source
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the requested datasets this reader can provide.
    ///
    /// Queries the reader has no variant for, or whose files weren't given,
    /// are skipped. Navigation is loaded once per navigation name.
    pub fn load(&self, request: &LoadRequest) -> Result<DatasetRegistry<Dataset>> {
        let filter = request.filter();
        let mut ids: Vec<DatasetId> = Vec::new();
        for query in &request.datasets {
            match self.get_dataset_key(query, &filter) {
                Ok(id) => {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                Err(e) if e.is_not_found() => {
                    debug!(reader = %self.name(), query = %query, "Reader has no dataset for query")
                }
                Err(e) => return Err(e),
            }
        }

        let mut loaded = DatasetRegistry::new();
        if ids.is_empty() {
            debug!(reader = %self.name(), "No datasets to load from this reader");
            return Ok(loaded);
        }

        let mut areas: HashMap<String, SwathNavigation> = HashMap::new();
        for id in ids {
            let info = self.datasets.get(&id)?;
            let source = self.source(info);
            let Some(file_reader) = source.file_type.as_deref().and_then(|ft| self.file_reader(ft)) else {
                warn!(reader = %self.name(), dataset = %id, file_type = ?source.file_type, "No files for dataset");
                continue;
            };

            let area = match &source.navigation {
                Some(nav) => match areas.get(nav) {
                    Some(area) => Some(area.clone()),
                    None => match self.load_navigation(nav, None) {
                        Ok(area) => {
                            areas.insert(nav.clone(), area.clone());
                            Some(area)
                        }
                        Err(e) if e.is_not_found() => {
                            warn!(reader = %self.name(), dataset = %id, navigation = %nav, error = %e, "Navigation unavailable");
                            continue;
                        }
                        Err(e) => return Err(e),
                    },
                },
                None => None,
            };

            let data = file_reader.get_swath_data(&source.file_key)?;
            let file_key = self.config.file_key(&source.file_key);
            let rows_per_scan = source
                .navigation
                .as_deref()
                .and_then(|nav| self.config.navigation(nav))
                .and_then(|nav| nav.rows_per_scan);

            debug!(reader = %self.name(), dataset = %id, file_type = %file_reader.file_type(), "Loaded dataset");
            let dataset = Dataset {
                meta: info.meta.clone(),
                data,
                area,
                start_time: file_reader.start_time(),
                end_time: file_reader.end_time(),
                platform: file_reader.platform_name().map(str::to_string),
                sensor: file_reader.sensor_name().map(str::to_string),
                start_orbit: file_reader.begin_orbit_number(),
                end_orbit: file_reader.end_orbit_number(),
                units: info.units.clone().or_else(|| file_reader.units(&source.file_key)),
                standard_name: info
                    .standard_name
                    .clone()
                    .or_else(|| file_key.and_then(|k| k.standard_name.clone())),
                rows_per_scan,
                file_type: file_reader.file_type().to_string(),
                file_key: source.file_key,
                metadata: BTreeMap::new(),
            };
            loaded.insert(id, dataset)?;
        }

        let names = request.metadata.as_deref().unwrap_or(&[]);
        let ids: Vec<DatasetId> = loaded.keys().cloned().collect();
        for (id, metadata) in self.load_metadata(&ids, names)? {
            let dataset = loaded.get_mut(&id)?;
            dataset.metadata.extend(metadata.dataset);
            if let Some(area) = dataset.area.as_mut() {
                area.metadata.extend(metadata.area);
            }
        }
        Ok(loaded)
    }

    /// Load named metadata items for the given datasets.
    ///
    /// Unknown dataset ids and metadata names are ignored. Items whose file
    /// type has no files, or that a file doesn't carry, are skipped.
    pub fn load_metadata(&self, ids: &[DatasetId], names: &[String]) -> Result<Vec<(DatasetId, LoadedMetadata)>> {
        let items: Vec<_> = names
            .iter()
            .filter_map(|n| self.config.metadata_item(n))
            .collect();
        let mut out = Vec::new();
        if items.is_empty() {
            debug!(reader = %self.name(), "No metadata to load from this reader");
            return Ok(out);
        }

        for id in ids {
            let Ok(info) = self.datasets.get(id) else {
                continue;
            };
            let source = self.source(info);
            let nav_file_type = source
                .navigation
                .as_deref()
                .and_then(|n| self.config.navigation(n))
                .map(|n| n.file_type.as_str());

            let mut loaded = LoadedMetadata::default();
            for item in &items {
                let file_type = match &item.file_type {
                    MetadataSource::Dataset => source.file_type.as_deref(),
                    MetadataSource::Navigation => nav_file_type,
                    MetadataSource::FileType(name) => Some(name.as_str()),
                };
                let Some(file_reader) = file_type.and_then(|ft| self.file_reader(ft)) else {
                    warn!(reader = %self.name(), metadata = %item.name, file_type = ?file_type, "File type not loaded for metadata");
                    continue;
                };

                match file_reader.load_metadata(&item.file_key, &item.join_method, item.axis) {
                    Ok(value) => {
                        let target = match item.destination {
                            MetadataDestination::Dataset => &mut loaded.dataset,
                            MetadataDestination::Area => &mut loaded.area,
                        };
                        target.insert(item.name.clone(), value);
                    }
                    Err(e) if e.is_not_found() || matches!(e, ReaderError::MetadataJoin { .. }) => {
                        debug!(metadata = %item.name, dataset = %id, error = %e, "Could not load metadata");
                    }
                    Err(e) => return Err(e),
                }
            }
            out.push((id.clone(), loaded));
        }
        Ok(out)
    }

    /// Load a navigation's longitudes and latitudes as a swath area.
    ///
    /// `extra_mask` masks additional samples in both arrays.
    pub fn load_navigation(&self, name: &str, extra_mask: Option<&ArrayD<bool>>) -> Result<SwathNavigation> {
        let nav = self
            .config
            .navigation(name)
            .ok_or_else(|| ReaderError::config(format!("Unknown navigation '{}'", name)))?;
        let file_reader = self
            .file_reader(&nav.file_type)
            .ok_or_else(|| ReaderError::missing_item(name, format!("file type '{}'", nav.file_type)))?;

        let mut lons = file_reader.get_swath_data(&nav.longitude_key)?;
        let mut lats = file_reader.get_swath_data(&nav.latitude_key)?;
        if let Some(mask) = extra_mask {
            lons.mask_where(mask)?;
            lats.mask_where(mask)?;
        }

        let start_time = file_reader.start_time();
        let end_time = file_reader.end_time();
        let area_id = swath_area_id(start_time, end_time, lons.shape());
        debug!(navigation = %name, area_id = %area_id, "Loaded navigation");

        Ok(SwathNavigation {
            name: name.to_string(),
            area_id,
            lons,
            lats,
            start_time,
            end_time,
            rows_per_scan: nav.rows_per_scan,
            metadata: BTreeMap::new(),
        })
    }
}

/// `swath_<start>_<end>__<shape>` with the shape joined by `_`.
pub fn swath_area_id(start: DateTime<Utc>, end: DateTime<Utc>, shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!(
        "swath_{}_{}__{}",
        start.format("%Y-%m-%dT%H:%M:%S"),
        end.format("%Y-%m-%dT%H:%M:%S"),
        dims.join("_")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_reader_config;
    use chrono::TimeZone;

    const CONFIG: &str = r#"
reader:
  name: seviri_like
  sensors: [seviri]
file_types:
  - name: hrit
    file_patterns: ["H_{platform}_{start_time:%Y%m%d%H%M}.dat"]
file_keys:
  - name: ir_108
  - name: vis_006
datasets:
  - name: IR_108
    wavelength_range: [9.8, 10.8, 11.8]
    resolution: [3000, 3000, 3000]
    calibration: [counts, radiance, brightness_temperature]
    file_type: hrit
    file_key: ir_108
  - name: VIS006
    wavelength_range: [0.56, 0.635, 0.71]
    resolution: [3000, 3000]
    calibration: [radiance, reflectance]
    file_type: hrit
    file_key: vis_006
"#;

    fn reader() -> ConfigReader {
        let config = parse_reader_config(CONFIG).unwrap();
        let files = vec!["/data/H_msg4_202001011200.dat".to_string()];
        ConfigReader::new(config, &files, &HandlerRegistry::new(), &GranuleFilter::new()).unwrap()
    }

    #[test]
    fn test_default_calibration_preference() {
        let reader = reader();
        let id = reader
            .get_dataset_key(&DatasetQuery::from("IR_108"), &KeyFilter::new())
            .unwrap();
        assert_eq!(id.calibration, Some(Calibration::BrightnessTemperature));

        let id = reader.get_dataset_key(&DatasetQuery::from(0.6), &KeyFilter::new()).unwrap();
        assert_eq!(id.name.as_deref(), Some("VIS006"));
        assert_eq!(id.calibration, Some(Calibration::Reflectance));
    }

    #[test]
    fn test_requested_calibrations_ranked() {
        let reader = reader();
        let filter = KeyFilter::new().calibration([Calibration::Counts, Calibration::Radiance]);
        let keys = reader
            .get_dataset_keys(&DatasetQuery::from("IR_108"), &filter)
            .unwrap();
        let cals: Vec<_> = keys.iter().map(|k| k.calibration.unwrap()).collect();
        assert_eq!(cals, vec![Calibration::Radiance, Calibration::Counts]);

        // Radiance isn't in the default preference.
        let query = DatasetQuery::from(DatasetId::named("VIS006").calibration(Calibration::Radiance));
        let id = reader.get_dataset_key(&query, &KeyFilter::new()).unwrap();
        assert_eq!(id.calibration, Some(Calibration::Radiance));
    }

    #[test]
    fn test_equal_distance_prefers_finest_resolution() {
        let yaml = format!(
            "{}{}",
            CONFIG,
            r#"  - name: IR_039
    wavelength_range: [3.48, 3.92, 4.36]
    resolution: [3000, 1000]
    calibration: [brightness_temperature, brightness_temperature]
    file_type: hrit
    file_key: ir_108
"#
        );
        let config = parse_reader_config(&yaml).unwrap();
        let files = vec!["/data/H_msg4_202001011200.dat".to_string()];
        let reader = ConfigReader::new(config, &files, &HandlerRegistry::new(), &GranuleFilter::new()).unwrap();

        let keys = reader
            .get_dataset_keys(&DatasetQuery::from(3.9), &KeyFilter::new())
            .unwrap();
        let resolutions: Vec<_> = keys.iter().map(|k| k.resolution.unwrap()).collect();
        assert_eq!(resolutions, vec![1000.0, 3000.0]);

        let id = reader.get_dataset_key(&DatasetQuery::from(3.9), &KeyFilter::new()).unwrap();
        assert_eq!(id.resolution, Some(1000.0));
    }

    #[test]
    fn test_unknown_queries_not_found() {
        let reader = reader();
        let err = reader
            .get_dataset_key(&DatasetQuery::from("WV_062"), &KeyFilter::new())
            .unwrap_err();
        assert!(err.is_not_found());
        let err = reader
            .get_dataset_key(&DatasetQuery::from(5.0), &KeyFilter::new())
            .unwrap_err();
        assert!(err.is_not_found());
        let err = reader
            .get_dataset_key(&DatasetQuery::from("IR_108"), &KeyFilter::new().resolution([1000.0]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_available_datasets() {
        let reader = reader();
        assert_eq!(reader.available_dataset_names(), vec!["IR_108", "VIS006"]);
        assert_eq!(reader.available_dataset_ids().len(), 5);
        assert!(reader.sensor_names().contains("seviri"));
        assert_eq!(
            reader.start_time(),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_load_skips_what_files_cant_provide() {
        let reader = reader();
        // The filename handler has no swath variables.
        let err = reader.load(&LoadRequest::new(["IR_108"])).unwrap_err();
        assert!(matches!(err, ReaderError::MissingItem { .. }));

        let loaded = reader.load(&LoadRequest::new(["WV_062"])).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_area_id_format() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 1, 0, 2, 0).unwrap();
        assert_eq!(
            swath_area_id(start, end, &[5, 4]),
            "swath_2020-01-01T00:00:00_2020-01-01T00:02:00__5_4"
        );
    }
}

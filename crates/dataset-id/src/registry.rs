//! Ordered container of datasets addressed by composite keys.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::Calibration;
use crate::error::{DatasetIdError, Result};
use crate::key::{DatasetId, DatasetQuery};
use crate::matching::{get_key, get_keys, get_keys_by_id, KeyFilter};
use crate::wavelength::Wavelength;

/// Identity fields carried by a dataset's own metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wavelength_range: Option<Wavelength>,
    #[serde(default)]
    pub resolution: Option<f64>,
    #[serde(default)]
    pub polarization: Option<String>,
    #[serde(default)]
    pub calibration: Option<Calibration>,
}

impl DatasetMeta {
    /// Key built from these fields.
    pub fn to_id(&self, name: Option<String>) -> DatasetId {
        DatasetId {
            name: name.or_else(|| self.name.clone()),
            wavelength: self.wavelength_range,
            resolution: self.resolution,
            polarization: self.polarization.clone(),
            calibration: self.calibration,
        }
    }
}

/// Values stored in a [`DatasetRegistry`] expose their identity metadata.
pub trait Describe {
    fn meta(&self) -> &DatasetMeta;
    fn meta_mut(&mut self) -> &mut DatasetMeta;
}

impl Describe for DatasetMeta {
    fn meta(&self) -> &DatasetMeta {
        self
    }

    fn meta_mut(&mut self) -> &mut DatasetMeta {
        self
    }
}

/// Insertion-ordered map from [`DatasetId`] to a value.
///
/// All lookups go through [`get_key`], so a name, a wavelength or a partial
/// key can be used wherever a full key is accepted. A lookup that matches
/// nothing is an error; the registry never hands out defaults.
#[derive(Debug, Clone)]
pub struct DatasetRegistry<V> {
    entries: Vec<(DatasetId, V)>,
}

impl<V> Default for DatasetRegistry<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> DatasetRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys in insertion order. Each call starts a fresh iteration.
    pub fn keys(&self) -> impl Iterator<Item = &DatasetId> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Names of the stored keys.
    pub fn names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.keys().map(|k| k.name.as_deref())
    }

    /// Wavelengths of the stored keys.
    pub fn wavelengths(&self) -> impl Iterator<Item = Option<&Wavelength>> + '_ {
        self.keys().map(|k| k.wavelength.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DatasetId, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Resolve a query to the stored key it designates.
    pub fn resolve(&self, query: &DatasetQuery) -> Result<&DatasetId> {
        get_key(self.keys(), query)
    }

    pub fn get(&self, query: impl Into<DatasetQuery>) -> Result<&V> {
        let index = self.position(&query.into())?;
        Ok(&self.entries[index].1)
    }

    pub fn get_mut(&mut self, query: impl Into<DatasetQuery>) -> Result<&mut V> {
        let index = self.position(&query.into())?;
        Ok(&mut self.entries[index].1)
    }

    /// Whether the query designates a stored dataset.
    ///
    /// "Nothing matched" is `false`; an ambiguous query is still an error.
    pub fn contains(&self, query: impl Into<DatasetQuery>) -> Result<bool> {
        match self.position(&query.into()) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn remove(&mut self, query: impl Into<DatasetQuery>) -> Result<V> {
        let index = self.position(&query.into())?;
        Ok(self.entries.remove(index).1)
    }

    /// Keys selected by name or wavelength and narrowed by `filter`.
    pub fn get_keys(&self, selector: impl Into<DatasetQuery>, filter: &KeyFilter) -> Result<Vec<&DatasetId>> {
        get_keys(self.keys(), &selector.into(), filter)
    }

    /// Keys compatible with every populated field of `query`.
    pub fn get_keys_by_id(&self, query: &DatasetId) -> Result<Vec<&DatasetId>> {
        get_keys_by_id(self.keys(), query)
    }

    /// First value selected by [`DatasetRegistry::get_keys`].
    pub fn get_item(&self, selector: impl Into<DatasetQuery>, filter: &KeyFilter) -> Result<&V> {
        let selector = selector.into();
        let key = self
            .get_keys(selector.clone(), filter)?
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| DatasetIdError::NotFound(selector.to_string()))?;
        self.get(key)
    }

    fn position(&self, query: &DatasetQuery) -> Result<usize> {
        if let DatasetQuery::Id(id) = query {
            if let Some(index) = self.index_of(id) {
                return Ok(index);
            }
        }
        let key = self.resolve(query)?;
        self.index_of(key)
            .ok_or_else(|| DatasetIdError::NotFound(query.to_string()))
    }

    fn index_of(&self, key: &DatasetId) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<V: Describe> DatasetRegistry<V> {
    /// Store `value` under the key designated by `query`.
    ///
    /// A composite key is used as given. Any other query is resolved against
    /// the stored keys; when nothing matches, a new key is built from the
    /// value's own metadata (a bare name query supplies the name). The value's
    /// metadata is then aligned with the key it is stored under. Returns the key.
    pub fn insert(&mut self, query: impl Into<DatasetQuery>, mut value: V) -> Result<DatasetId> {
        let query = query.into();
        let key = match &query {
            DatasetQuery::Id(id) => {
                if !id.is_usable() {
                    return Err(DatasetIdError::MissingIdentity);
                }
                id.clone()
            }
            other => match self.resolve(other) {
                Ok(existing) => existing.clone(),
                Err(err) if err.is_not_found() => {
                    let name = match other {
                        DatasetQuery::Name(name) => Some(name.clone()),
                        _ => None,
                    };
                    let key = value.meta().to_id(name);
                    if !key.is_usable() {
                        return Err(DatasetIdError::MissingIdentity);
                    }
                    debug!(key = %key, "Registering new dataset key");
                    key
                }
                Err(err) => return Err(err),
            },
        };

        let meta = value.meta_mut();
        if let Some(requested) = meta.wavelength_range {
            if key.wavelength != Some(requested) {
                return Err(DatasetIdError::WavelengthConflict {
                    key: key.to_string(),
                    registered: key
                        .wavelength
                        .map_or_else(|| "none".to_string(), |wl| wl.to_string()),
                    requested: requested.to_string(),
                });
            }
        }
        meta.name = key.name.clone();
        meta.resolution = key.resolution;
        meta.calibration = key.calibration;
        meta.polarization = key.polarization.clone();

        match self.index_of(&key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key.clone(), value)),
        }
        Ok(key)
    }
}

impl<V> IntoIterator for DatasetRegistry<V> {
    type Item = (DatasetId, V);
    type IntoIter = std::vec::IntoIter<(DatasetId, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, wl: Option<(f64, f64, f64)>) -> DatasetMeta {
        DatasetMeta {
            name: Some(name.to_string()),
            wavelength_range: wl.map(|(a, b, c)| Wavelength::range(a, b, c).unwrap()),
            resolution: Some(742.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_key_round_trip() {
        let mut reg = DatasetRegistry::new();
        let id = DatasetId::named("M05")
            .resolution(742.0)
            .calibration(Calibration::Reflectance);
        reg.insert(id.clone(), DatasetMeta::default()).unwrap();

        let stored = reg.get(&id).unwrap();
        assert_eq!(stored.name.as_deref(), Some("M05"));
        assert_eq!(stored.calibration, Some(Calibration::Reflectance));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_insert_by_name_synthesizes_key() {
        let mut reg = DatasetRegistry::new();
        let key = reg
            .insert("M05", meta("ignored", Some((0.662, 0.672, 0.682))))
            .unwrap();
        assert_eq!(key.name.as_deref(), Some("M05"));
        assert_eq!(key.resolution, Some(742.0));
        assert!(key.wavelength.is_some());

        // The value now carries the key's name.
        assert_eq!(reg.get(0.67).unwrap().name.as_deref(), Some("M05"));
    }

    #[test]
    fn test_insert_by_name_updates_in_place() {
        let mut reg = DatasetRegistry::new();
        reg.insert("M05", meta("M05", None)).unwrap();
        let mut updated = meta("M05", None);
        updated.resolution = Some(1.0);
        reg.insert("M05", updated).unwrap();

        assert_eq!(reg.len(), 1);
        // Key resolution wins over the value's.
        assert_eq!(reg.get("M05").unwrap().resolution, Some(742.0));
    }

    #[test]
    fn test_wavelength_is_immutable() {
        let mut reg = DatasetRegistry::new();
        reg.insert("ch1", meta("ch1", Some((0.5, 0.6, 0.7)))).unwrap();
        let err = reg
            .insert("ch1", meta("ch1", Some((0.8, 0.9, 1.0))))
            .unwrap_err();
        assert!(matches!(err, DatasetIdError::WavelengthConflict { .. }));
    }

    #[test]
    fn test_insert_without_identity_fails() {
        let mut reg: DatasetRegistry<DatasetMeta> = DatasetRegistry::new();
        let err = reg.insert(0.6, DatasetMeta::default()).unwrap_err();
        assert_eq!(err, DatasetIdError::MissingIdentity);
    }

    #[test]
    fn test_missing_lookups_are_errors() {
        let mut reg = DatasetRegistry::new();
        reg.insert("M05", meta("M05", None)).unwrap();

        assert!(matches!(reg.get("M06"), Err(DatasetIdError::NotFound(_))));
        assert!(matches!(reg.remove("M06"), Err(DatasetIdError::NotFound(_))));
        assert!(!reg.contains("M06").unwrap());
        assert!(reg.contains("M05").unwrap());

        reg.remove("M05").unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_key_projections_restart() {
        let mut reg = DatasetRegistry::new();
        reg.insert("a", meta("a", Some((0.5, 0.6, 0.7)))).unwrap();
        reg.insert("b", meta("b", None)).unwrap();

        let names: Vec<_> = reg.names().collect();
        assert_eq!(names, vec![Some("a"), Some("b")]);
        assert_eq!(reg.names().count(), 2);
        assert_eq!(reg.wavelengths().filter(|w| w.is_some()).count(), 1);
    }

    #[test]
    fn test_get_item_uses_filters() {
        let mut reg = DatasetRegistry::new();
        reg.insert(
            DatasetId::named("I01").resolution(371.0).calibration(Calibration::Radiance),
            DatasetMeta::default(),
        )
        .unwrap();
        reg.insert(
            DatasetId::named("I01").resolution(371.0).calibration(Calibration::Reflectance),
            DatasetMeta::default(),
        )
        .unwrap();

        let item = reg
            .get_item("I01", &KeyFilter::new().calibration([Calibration::Reflectance]))
            .unwrap();
        assert_eq!(item.calibration, Some(Calibration::Reflectance));

        assert!(reg
            .get_item("I01", &KeyFilter::new().resolution([742.0]))
            .is_err());
    }
}

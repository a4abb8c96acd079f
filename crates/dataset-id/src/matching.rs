//! Resolution of full or partial queries against a set of stored keys.
//!
//! These functions work over any sequence of keys so they can be used (and
//! tested) without a registry.

use std::cmp::Ordering;

use crate::calibration::Calibration;
use crate::error::{DatasetIdError, Result};
use crate::key::{DatasetId, DatasetQuery};

/// Optional secondary filters applied after the primary name/wavelength selection.
///
/// Each filter holds the set of acceptable values; a key with the field unset
/// is rejected by an active filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyFilter {
    pub resolution: Option<Vec<f64>>,
    pub polarization: Option<Vec<String>>,
    pub calibration: Option<Vec<Calibration>>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.resolution = Some(values.into_iter().collect());
        self
    }

    pub fn polarization<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.polarization = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn calibration(mut self, values: impl IntoIterator<Item = Calibration>) -> Self {
        self.calibration = Some(values.into_iter().collect());
        self
    }

    /// True when no filter is active.
    pub fn is_empty(&self) -> bool {
        self.resolution.is_none() && self.polarization.is_none() && self.calibration.is_none()
    }

    /// Check a key against every active filter.
    pub fn accepts(&self, key: &DatasetId) -> bool {
        fn accepted<T: PartialEq>(allowed: &Option<Vec<T>>, value: &Option<T>) -> bool {
            match (allowed, value) {
                (None, _) => true,
                (Some(allowed), Some(value)) => allowed.contains(value),
                (Some(_), None) => false,
            }
        }

        accepted(&self.resolution, &key.resolution)
            && accepted(&self.polarization, &key.polarization)
            && accepted(&self.calibration, &key.calibration)
    }
}

/// Resolve a query to exactly one stored key.
///
/// - A wavelength selects the key whose band contains it with the nearest
///   center. Equal distances prefer the finest resolution, then the key seen first.
/// - A name selects the first key with that name.
/// - A composite key must narrow the candidates to exactly one.
pub fn get_key<'a, I>(candidates: I, query: &DatasetQuery) -> Result<&'a DatasetId>
where
    I: IntoIterator<Item = &'a DatasetId>,
{
    match query {
        DatasetQuery::Id(id) => {
            let mut keys = get_keys_by_id(candidates, id)?;
            match keys.len() {
                0 => Err(DatasetIdError::NotFound(query.to_string())),
                1 => Ok(keys.remove(0)),
                count => Err(DatasetIdError::Ambiguous {
                    query: query.to_string(),
                    count,
                }),
            }
        }
        DatasetQuery::Wavelength(wavelength) => {
            nearest_wavelength(candidates, *wavelength)
                .into_iter()
                .next()
                .ok_or_else(|| DatasetIdError::NotFound(query.to_string()))
        }
        DatasetQuery::Name(name) => candidates
            .into_iter()
            .find(|k| k.name.as_deref() == Some(name.as_str()))
            .ok_or_else(|| DatasetIdError::NotFound(query.to_string())),
    }
}

/// All keys matching the primary selector, narrowed by `filter`.
///
/// Wavelength selections are ordered nearest center first; other selections
/// keep storage order.
pub fn get_keys<'a, I>(
    candidates: I,
    selector: &DatasetQuery,
    filter: &KeyFilter,
) -> Result<Vec<&'a DatasetId>>
where
    I: IntoIterator<Item = &'a DatasetId>,
{
    let keys = match selector {
        DatasetQuery::Wavelength(wavelength) => nearest_wavelength(candidates, *wavelength),
        DatasetQuery::Name(name) => candidates
            .into_iter()
            .filter(|k| k.name.as_deref() == Some(name.as_str()))
            .collect(),
        DatasetQuery::Id(id) => get_keys_by_id(candidates, id)?,
    };

    Ok(keys.into_iter().filter(|k| filter.accepts(k)).collect())
}

/// All keys compatible with every populated field of `query`.
///
/// Fields are applied in order: name, wavelength, resolution, polarization,
/// calibration. A candidate that lacks a queried field is dropped.
pub fn get_keys_by_id<'a, I>(candidates: I, query: &DatasetId) -> Result<Vec<&'a DatasetId>>
where
    I: IntoIterator<Item = &'a DatasetId>,
{
    let mut keys: Vec<&DatasetId> = candidates.into_iter().collect();

    if let Some(name) = &query.name {
        keys.retain(|k| k.name.as_ref() == Some(name));
    }
    if let Some(wavelength) = &query.wavelength {
        let mut kept = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(key_wl) = &key.wavelength {
                if key_wl.matches(wavelength)? {
                    kept.push(key);
                }
            }
        }
        keys = kept;
    }
    if let Some(resolution) = query.resolution {
        keys.retain(|k| k.resolution == Some(resolution));
    }
    if let Some(polarization) = &query.polarization {
        keys.retain(|k| k.polarization.as_ref() == Some(polarization));
    }
    if let Some(calibration) = query.calibration {
        keys.retain(|k| k.calibration == Some(calibration));
    }

    Ok(keys)
}

/// Keys whose wavelength contains `wavelength`, nearest center first.
fn nearest_wavelength<'a, I>(candidates: I, wavelength: f64) -> Vec<&'a DatasetId>
where
    I: IntoIterator<Item = &'a DatasetId>,
{
    let mut keys: Vec<&DatasetId> = candidates
        .into_iter()
        .filter(|k| k.wavelength.map_or(false, |wl| wl.contains(wavelength)))
        .collect();

    // Stable sort keeps storage order as the last tie-break.
    keys.sort_by(|a, b| compare_nearest(a, b, wavelength));
    keys
}

fn compare_nearest(a: &DatasetId, b: &DatasetId, wavelength: f64) -> Ordering {
    let distance = |k: &DatasetId| {
        k.wavelength
            .map_or(f64::INFINITY, |wl| (wl.center() - wavelength).abs())
    };
    let resolution = |k: &DatasetId| k.resolution.unwrap_or(f64::INFINITY);

    distance(a)
        .total_cmp(&distance(b))
        .then_with(|| resolution(a).total_cmp(&resolution(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelength::Wavelength;

    fn band(min: f64, center: f64, max: f64) -> Wavelength {
        Wavelength::range(min, center, max).unwrap()
    }

    fn viirs_keys() -> Vec<DatasetId> {
        vec![
            DatasetId::named("I01")
                .wavelength(band(0.6, 0.64, 0.68))
                .resolution(371.0)
                .calibration(Calibration::Reflectance),
            DatasetId::named("I01")
                .wavelength(band(0.6, 0.64, 0.68))
                .resolution(371.0)
                .calibration(Calibration::Radiance),
            DatasetId::named("M05")
                .wavelength(band(0.662, 0.672, 0.682))
                .resolution(742.0)
                .calibration(Calibration::Reflectance),
            DatasetId::named("M15")
                .wavelength(band(10.263, 10.763, 11.263))
                .resolution(742.0)
                .calibration(Calibration::BrightnessTemperature),
        ]
    }

    #[test]
    fn test_get_key_by_name_returns_first() {
        let keys = viirs_keys();
        let key = get_key(&keys, &"I01".into()).unwrap();
        assert_eq!(key.calibration, Some(Calibration::Reflectance));
    }

    #[test]
    fn test_get_key_by_wavelength_prefers_nearest_center() {
        let keys = viirs_keys();
        // 0.665 is inside both I01 and M05; M05's center is closer.
        let key = get_key(&keys, &0.665.into()).unwrap();
        assert_eq!(key.name.as_deref(), Some("M05"));

        let key = get_key(&keys, &0.63.into()).unwrap();
        assert_eq!(key.name.as_deref(), Some("I01"));
    }

    #[test]
    fn test_wavelength_tie_prefers_finest_resolution() {
        let keys = vec![
            DatasetId::named("coarse")
                .wavelength(band(0.5, 0.6, 0.7))
                .resolution(1000.0),
            DatasetId::named("fine")
                .wavelength(band(0.5, 0.6, 0.7))
                .resolution(500.0),
        ];
        let key = get_key(&keys, &0.6.into()).unwrap();
        assert_eq!(key.name.as_deref(), Some("fine"));
    }

    #[test]
    fn test_wavelength_tie_falls_back_to_storage_order() {
        let keys = vec![
            DatasetId::named("first").wavelength(band(0.5, 0.6, 0.7)),
            DatasetId::named("second").wavelength(band(0.5, 0.6, 0.7)),
        ];
        let key = get_key(&keys, &0.6.into()).unwrap();
        assert_eq!(key.name.as_deref(), Some("first"));
    }

    #[test]
    fn test_get_key_by_id_requires_unique_match() {
        let keys = viirs_keys();

        let ambiguous = get_key(&keys, &DatasetId::named("I01").into());
        assert!(matches!(
            ambiguous,
            Err(DatasetIdError::Ambiguous { count: 2, .. })
        ));

        let unique = get_key(
            &keys,
            &DatasetId::named("I01")
                .calibration(Calibration::Radiance)
                .into(),
        )
        .unwrap();
        assert_eq!(unique.calibration, Some(Calibration::Radiance));

        let missing = get_key(&keys, &DatasetId::named("M99").into());
        assert!(matches!(missing, Err(DatasetIdError::NotFound(_))));
    }

    #[test]
    fn test_get_key_by_id_drops_keys_missing_queried_fields() {
        let keys = vec![
            DatasetId::named("longitude"),
            DatasetId::named("longitude").resolution(742.0),
        ];
        let key = get_key(&keys, &DatasetId::named("longitude").resolution(742.0).into()).unwrap();
        assert_eq!(key.resolution, Some(742.0));
    }

    #[test]
    fn test_get_keys_with_filters() {
        let keys = viirs_keys();

        let all_i01 = get_keys(&keys, &"I01".into(), &KeyFilter::new()).unwrap();
        assert_eq!(all_i01.len(), 2);

        let radiance = get_keys(
            &keys,
            &"I01".into(),
            &KeyFilter::new().calibration([Calibration::Radiance, Calibration::Counts]),
        )
        .unwrap();
        assert_eq!(radiance.len(), 1);
        assert_eq!(radiance[0].calibration, Some(Calibration::Radiance));

        let by_wl = get_keys(&keys, &10.8.into(), &KeyFilter::new().resolution([742.0])).unwrap();
        assert_eq!(by_wl.len(), 1);
        assert_eq!(by_wl[0].name.as_deref(), Some("M15"));

        let none = get_keys(&keys, &"M05".into(), &KeyFilter::new().polarization(["H"])).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_get_keys_by_id_empty_iff_incompatible() {
        let keys = viirs_keys();
        let found = get_keys_by_id(&keys, &DatasetId::default().resolution(742.0)).unwrap();
        assert_eq!(found.len(), 2);

        let found = get_keys_by_id(&keys, &DatasetId::default().resolution(100.0)).unwrap();
        assert!(found.is_empty());
    }
}

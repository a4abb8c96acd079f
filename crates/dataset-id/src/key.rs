//! The composite dataset identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calibration::Calibration;
use crate::error::Result;
use crate::wavelength::Wavelength;

/// Identifies a dataset by name, wavelength, resolution, polarization and calibration.
///
/// Every field is optional. A key with only some fields set is a partial key
/// and is used as a query; keys stored in a registry must carry at least a
/// name or a wavelength.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wavelength: Option<Wavelength>,
    /// Resolution in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
}

impl DatasetId {
    /// Key with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Key with only a wavelength set.
    pub fn with_wavelength_only(wavelength: impl Into<Wavelength>) -> Self {
        Self {
            wavelength: Some(wavelength.into()),
            ..Default::default()
        }
    }

    pub fn wavelength(mut self, wavelength: impl Into<Wavelength>) -> Self {
        self.wavelength = Some(wavelength.into());
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn polarization(mut self, polarization: impl Into<String>) -> Self {
        self.polarization = Some(polarization.into());
        self
    }

    pub fn calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// A key can be stored only if it has a name or a wavelength.
    pub fn is_usable(&self) -> bool {
        self.name.is_some() || self.wavelength.is_some()
    }

    /// True if every field of `self` that is set is also set on `other` with an equal value.
    ///
    /// Wavelengths are compared with [`Wavelength::matches`], other fields exactly.
    pub fn is_subset_of(&self, other: &DatasetId) -> Result<bool> {
        if self.name.is_some() && self.name != other.name {
            return Ok(false);
        }
        if let Some(wl) = &self.wavelength {
            match &other.wavelength {
                Some(other_wl) if wl.matches(other_wl)? => {}
                _ => return Ok(false),
            }
        }
        if self.resolution.is_some() && self.resolution != other.resolution {
            return Ok(false);
        }
        if self.polarization.is_some() && self.polarization != other.polarization {
            return Ok(false);
        }
        if self.calibration.is_some() && self.calibration != other.calibration {
            return Ok(false);
        }
        Ok(true)
    }

    /// Check whether two keys can describe the same dataset.
    ///
    /// Fields set on both sides must be compatible; a field set on only one
    /// side never prevents a match.
    pub fn matches(&self, other: &DatasetId) -> Result<bool> {
        fn compatible<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }

        if !compatible(&self.name, &other.name)
            || !compatible(&self.resolution, &other.resolution)
            || !compatible(&self.polarization, &other.polarization)
            || !compatible(&self.calibration, &other.calibration)
        {
            return Ok(false);
        }

        match (&self.wavelength, &other.wavelength) {
            (Some(a), Some(b)) => a.matches(b),
            _ => Ok(true),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(wl) = &self.wavelength {
            parts.push(format!("wavelength={}", wl));
        }
        if let Some(res) = &self.resolution {
            parts.push(format!("resolution={}", res));
        }
        if let Some(pol) = &self.polarization {
            parts.push(format!("polarization={}", pol));
        }
        if let Some(cal) = &self.calibration {
            parts.push(format!("calibration={}", cal));
        }
        write!(f, "DatasetId({})", parts.join(", "))
    }
}

/// Anything a caller may use to look up a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetQuery {
    /// A full or partial composite key.
    Id(DatasetId),
    /// A bare dataset name.
    Name(String),
    /// A bare wavelength in micrometers.
    Wavelength(f64),
}

impl fmt::Display for DatasetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetQuery::Id(id) => write!(f, "{}", id),
            DatasetQuery::Name(name) => write!(f, "{}", name),
            DatasetQuery::Wavelength(wl) => write!(f, "{}um", wl),
        }
    }
}

impl From<DatasetId> for DatasetQuery {
    fn from(id: DatasetId) -> Self {
        DatasetQuery::Id(id)
    }
}

impl From<&DatasetId> for DatasetQuery {
    fn from(id: &DatasetId) -> Self {
        DatasetQuery::Id(id.clone())
    }
}

impl From<&str> for DatasetQuery {
    fn from(name: &str) -> Self {
        DatasetQuery::Name(name.to_string())
    }
}

impl From<String> for DatasetQuery {
    fn from(name: String) -> Self {
        DatasetQuery::Name(name)
    }
}

impl From<f64> for DatasetQuery {
    fn from(wavelength: f64) -> Self {
        DatasetQuery::Wavelength(wavelength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetIdError;

    fn band(min: f64, center: f64, max: f64) -> Wavelength {
        Wavelength::range(min, center, max).unwrap()
    }

    #[test]
    fn test_partial_keys_match() {
        let full = DatasetId::named("M05")
            .wavelength(band(0.662, 0.672, 0.682))
            .resolution(742.0)
            .calibration(Calibration::Reflectance);

        assert!(DatasetId::named("M05").matches(&full).unwrap());
        assert!(DatasetId::with_wavelength_only(0.67).matches(&full).unwrap());
        assert!(!DatasetId::named("M05")
            .resolution(371.0)
            .matches(&full)
            .unwrap());
        assert!(!DatasetId::named("M05")
            .calibration(Calibration::Radiance)
            .matches(&full)
            .unwrap());
    }

    #[test]
    fn test_disjoint_bands_never_match() {
        let a = DatasetId::named("a").wavelength(band(0.5, 0.6, 0.7));
        let b = DatasetId::named("a").wavelength(band(0.8, 0.9, 1.0));
        assert!(!a.matches(&b).unwrap());
        assert!(!b.matches(&a).unwrap());
    }

    #[test]
    fn test_overlapping_bands_are_ambiguous() {
        let a = DatasetId::with_wavelength_only(band(0.5, 0.6, 0.7));
        let b = DatasetId::with_wavelength_only(band(0.6, 0.7, 0.8));
        assert!(matches!(
            a.matches(&b),
            Err(DatasetIdError::AmbiguousWavelength { .. })
        ));
    }

    #[test]
    fn test_usable() {
        assert!(!DatasetId::default().is_usable());
        assert!(!DatasetId::default().resolution(1000.0).is_usable());
        assert!(DatasetId::named("x").is_usable());
        assert!(DatasetId::with_wavelength_only(0.6).is_usable());
    }

    #[test]
    fn test_display() {
        let id = DatasetId::named("I04").resolution(371.0);
        assert_eq!(id.to_string(), "DatasetId(name=I04, resolution=371)");
        assert_eq!(DatasetId::default().to_string(), "DatasetId()");
    }
}

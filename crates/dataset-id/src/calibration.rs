//! Calibration levels and their ranking.
//!
//! A single ranking table drives both "which of these calibrations is best"
//! and "what do we load when the caller doesn't say".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DatasetIdError;

/// Processing stage of a physical quantity.
///
/// Ordering follows the processing chain: counts are the rawest level,
/// reflectance and brightness temperature the most derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Calibration {
    /// Raw digital counts
    Counts,
    /// Calibrated radiance
    Radiance,
    /// Reflectance (visible / near-IR channels)
    Reflectance,
    /// Brightness temperature (thermal IR channels)
    BrightnessTemperature,
}

impl Calibration {
    /// All calibration levels, highest level first.
    pub const RANKED: [Calibration; 4] = [
        Calibration::BrightnessTemperature,
        Calibration::Reflectance,
        Calibration::Radiance,
        Calibration::Counts,
    ];

    /// Position in [`Calibration::RANKED`]; lower is preferred.
    pub fn rank(self) -> usize {
        Self::RANKED
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::RANKED.len())
    }

    /// Calibrations loaded when the caller expresses no preference.
    ///
    /// These are the top-level physical quantities of the ranking table.
    pub fn default_preference() -> Vec<Calibration> {
        Self::RANKED
            .iter()
            .copied()
            .filter(|c| c.is_physical_quantity())
            .collect()
    }

    /// Sort a set of acceptable calibrations from highest to lowest level,
    /// dropping duplicates.
    pub fn ranked(acceptable: &[Calibration]) -> Vec<Calibration> {
        Self::RANKED
            .iter()
            .copied()
            .filter(|c| acceptable.contains(c))
            .collect()
    }

    /// True for reflectance and brightness temperature.
    pub fn is_physical_quantity(self) -> bool {
        matches!(
            self,
            Calibration::Reflectance | Calibration::BrightnessTemperature
        )
    }

    /// Canonical configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Calibration::Counts => "counts",
            Calibration::Radiance => "radiance",
            Calibration::Reflectance => "reflectance",
            Calibration::BrightnessTemperature => "brightness_temperature",
        }
    }
}

impl fmt::Display for Calibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Calibration {
    type Err = DatasetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "counts" => Ok(Calibration::Counts),
            "radiance" => Ok(Calibration::Radiance),
            "reflectance" => Ok(Calibration::Reflectance),
            "brightness_temperature" => Ok(Calibration::BrightnessTemperature),
            other => Err(DatasetIdError::UnknownCalibration(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_order() {
        assert!(Calibration::Counts < Calibration::Radiance);
        assert!(Calibration::Radiance < Calibration::Reflectance);
        assert!(Calibration::Radiance < Calibration::BrightnessTemperature);
    }

    #[test]
    fn test_default_preference_comes_from_ranking() {
        assert_eq!(
            Calibration::default_preference(),
            vec![Calibration::BrightnessTemperature, Calibration::Reflectance]
        );
    }

    #[test]
    fn test_ranked_sorts_and_dedups() {
        let ranked = Calibration::ranked(&[
            Calibration::Counts,
            Calibration::Reflectance,
            Calibration::Counts,
        ]);
        assert_eq!(ranked, vec![Calibration::Reflectance, Calibration::Counts]);
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "brightness_temperature".parse::<Calibration>().unwrap(),
            Calibration::BrightnessTemperature
        );
        assert_eq!(" Radiance ".parse::<Calibration>().unwrap(), Calibration::Radiance);
        assert!(matches!(
            "albedo".parse::<Calibration>(),
            Err(DatasetIdError::UnknownCalibration(_))
        ));
    }
}

//! Wavelength values attached to dataset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DatasetIdError, Result};

/// A wavelength in micrometers, either a single value or a `[min, center, max]` band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WavelengthRepr", into = "WavelengthRepr")]
pub enum Wavelength {
    Scalar(f64),
    Range { min: f64, center: f64, max: f64 },
}

impl Wavelength {
    /// Build a band, checking that `min <= center <= max`.
    pub fn range(min: f64, center: f64, max: f64) -> std::result::Result<Self, String> {
        if min <= center && center <= max {
            Ok(Wavelength::Range { min, center, max })
        } else {
            Err(format!(
                "wavelength range must be ordered as [min, center, max], got [{}, {}, {}]",
                min, center, max
            ))
        }
    }

    /// Center of the band (or the scalar itself).
    pub fn center(&self) -> f64 {
        match *self {
            Wavelength::Scalar(w) => w,
            Wavelength::Range { center, .. } => center,
        }
    }

    /// Inclusive containment test for a scalar wavelength.
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Wavelength::Scalar(w) => w == value,
            Wavelength::Range { min, max, .. } => min <= value && value <= max,
        }
    }

    /// Compare two wavelengths for key matching.
    ///
    /// A band matches a scalar if it contains it and two scalars must be equal.
    /// Two bands are only comparable when they are identical or fully disjoint;
    /// overlapping but different bands are an [`DatasetIdError::AmbiguousWavelength`].
    pub fn matches(&self, other: &Wavelength) -> Result<bool> {
        match (*self, *other) {
            (Wavelength::Scalar(a), Wavelength::Scalar(b)) => Ok(a == b),
            (band @ Wavelength::Range { .. }, Wavelength::Scalar(w))
            | (Wavelength::Scalar(w), band @ Wavelength::Range { .. }) => Ok(band.contains(w)),
            (
                Wavelength::Range {
                    min: a_min,
                    max: a_max,
                    ..
                },
                Wavelength::Range {
                    min: b_min,
                    max: b_max,
                    ..
                },
            ) => {
                if self == other {
                    Ok(true)
                } else if a_max < b_min || b_max < a_min {
                    Ok(false)
                } else {
                    Err(DatasetIdError::AmbiguousWavelength {
                        left: self.to_string(),
                        right: other.to_string(),
                    })
                }
            }
        }
    }
}

impl From<f64> for Wavelength {
    fn from(value: f64) -> Self {
        Wavelength::Scalar(value)
    }
}

impl fmt::Display for Wavelength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wavelength::Scalar(w) => write!(f, "{}", w),
            Wavelength::Range { min, center, max } => write!(f, "({}, {}, {})", min, center, max),
        }
    }
}

/// On-disk form: a bare number or a three element list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WavelengthRepr {
    Scalar(f64),
    Range([f64; 3]),
}

impl TryFrom<WavelengthRepr> for Wavelength {
    type Error = String;

    fn try_from(repr: WavelengthRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            WavelengthRepr::Scalar(w) => Ok(Wavelength::Scalar(w)),
            WavelengthRepr::Range([min, center, max]) => Wavelength::range(min, center, max),
        }
    }
}

impl From<Wavelength> for WavelengthRepr {
    fn from(wl: Wavelength) -> Self {
        match wl {
            Wavelength::Scalar(w) => WavelengthRepr::Scalar(w),
            Wavelength::Range { min, center, max } => WavelengthRepr::Range([min, center, max]),
        }
    }
}

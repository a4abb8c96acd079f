//! Composite dataset identifiers.
//!
//! A dataset is addressed by a [`DatasetId`]: name, wavelength, resolution,
//! polarization and calibration, any of which may be unset. Callers usually
//! hold only part of a key (a channel name, a wavelength) and this crate
//! resolves that partial knowledge against the keys a reader or a scene
//! actually has.
//!
//! - [`matching`] holds the resolution rules as free functions over key sets
//! - [`DatasetRegistry`] is the ordered container built on top of them
//! - [`Calibration`] carries the single ranking of calibration levels

pub mod calibration;
pub mod error;
pub mod key;
pub mod matching;
pub mod registry;
pub mod wavelength;

pub use calibration::Calibration;
pub use error::{DatasetIdError, Result};
pub use key::{DatasetId, DatasetQuery};
pub use matching::{get_key, get_keys, get_keys_by_id, KeyFilter};
pub use registry::{DatasetMeta, DatasetRegistry, Describe};
pub use wavelength::Wavelength;

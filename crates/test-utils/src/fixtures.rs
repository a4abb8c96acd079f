//! Common reader configurations and granule sets for swath tests.

/// Reader configuration documents.
pub mod configs {
    /// Two file types (band data and geolocation) served by the in-memory
    /// reader, one band with two calibration levels, and metadata items for
    /// each join method.
    pub const VIIRS_SDR: &str = r#"
reader:
  name: viirs_sdr
  description: VIIRS SDR style granules
  sensors: [viirs]
  default_file_reader: memory
file_types:
  - name: svm05
    file_patterns: ["SVM05_{platform}_{start_time:%Y%m%d_%H%M}_{end_time:%H%M}.h5"]
  - name: gmodo
    file_patterns: ["GMODO_{platform}_{start_time:%Y%m%d_%H%M}_{end_time:%H%M}.h5"]
file_keys:
  - name: m05_radiance
    variable_name: Radiance
    scaling_factors: 2.0
    offset: 1.0
    units: W m-2 um-1 sr-1
    standard_name: toa_outgoing_radiance_per_unit_wavelength
  - name: m05_reflectance
    variable_name: Reflectance
    scaling_factors: 0.5
  - name: longitude
    variable_name: Longitude
  - name: latitude
    variable_name: Latitude
navigations:
  - name: m_nav
    file_type: gmodo
    longitude_key: longitude
    latitude_key: latitude
    rows_per_scan: 16
datasets:
  - name: M05
    wavelength_range: [0.662, 0.672, 0.682]
    resolution: [742, 742]
    calibration: [reflectance, radiance]
    file_type: svm05
    file_key: [m05_reflectance, m05_radiance]
    navigation: m_nav
    standard_name: toa_bidirectional_reflectance
metadata:
  - name: scan_start
    file_key: scan_start
    join_method: first
  - name: orbit_numbers
    file_key: orbit
    join_method: append_granule
  - name: gain
    file_key: gain
    join_method: append
  - name: nav_quality
    file_type: NAVIGATION
    file_key: quality
    join_method: extend_granule
    destination: area
"#;

    /// File types matched by plain `A*.dat` / `B*.dat` style patterns.
    pub const LETTERS: &str = r#"
reader:
  name: letters
  sensors: [letters]
  default_file_reader: memory
file_types:
  - name: A
    file_patterns: ["A{index:d}.dat"]
  - name: B
    file_patterns: ["B{index:d}.dat"]
"#;

    /// A filename-only reader for discovery tests.
    pub const AVHRR_L1B: &str = r#"
reader:
  name: avhrr_l1b
  sensors: [avhrr-3]
file_types:
  - name: l1b
    file_patterns: ["hrpt_{platform}_{start_time:%Y%m%d_%H%M}_{end_time:%H%M}.l1b"]
"#;
}

/// Granule file names that match [`configs::VIIRS_SDR`].
pub mod viirs {
    pub const SVM05_0000: &str = "SVM05_npp_20200101_0000_0010.h5";
    pub const SVM05_0010: &str = "SVM05_npp_20200101_0010_0020.h5";
    pub const GMODO_0000: &str = "GMODO_npp_20200101_0000_0010.h5";
    pub const GMODO_0010: &str = "GMODO_npp_20200101_0010_0020.h5";
}

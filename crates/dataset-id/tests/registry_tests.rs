//! Registry behavior as seen by code that only holds partial keys.

use dataset_id::{
    Calibration, DatasetId, DatasetIdError, DatasetMeta, DatasetRegistry, KeyFilter, Wavelength,
};

fn band(min: f64, center: f64, max: f64) -> Wavelength {
    Wavelength::range(min, center, max).unwrap()
}

fn seviri_registry() -> DatasetRegistry<DatasetMeta> {
    let mut reg = DatasetRegistry::new();
    for (name, wl, cal) in [
        ("VIS006", band(0.56, 0.635, 0.71), Calibration::Reflectance),
        ("VIS008", band(0.74, 0.81, 0.88), Calibration::Reflectance),
        ("IR_108", band(9.8, 10.8, 11.8), Calibration::BrightnessTemperature),
        ("IR_120", band(11.0, 12.0, 13.0), Calibration::BrightnessTemperature),
    ] {
        let id = DatasetId::named(name)
            .wavelength(wl)
            .resolution(3000.403165817)
            .calibration(cal);
        reg.insert(id, DatasetMeta::default()).unwrap();
    }
    reg
}

// ============================================================================
// Lookup by partial key
// ============================================================================

#[test]
fn test_lookup_by_name_and_wavelength() {
    let reg = seviri_registry();

    assert_eq!(reg.get("IR_108").unwrap().name.as_deref(), Some("IR_108"));
    assert_eq!(reg.get(0.8).unwrap().name.as_deref(), Some("VIS008"));
}

#[test]
fn test_overlapping_bands_pick_nearest_center() {
    let reg = seviri_registry();
    // 11.5um is inside both IR_108 and IR_120.
    assert_eq!(reg.get(11.5).unwrap().name.as_deref(), Some("IR_120"));
    assert_eq!(reg.get(11.2).unwrap().name.as_deref(), Some("IR_108"));
}

#[test]
fn test_lookup_by_partial_id() {
    let reg = seviri_registry();
    let found = reg
        .get(DatasetId::default().calibration(Calibration::Reflectance).wavelength(0.63))
        .unwrap();
    assert_eq!(found.name.as_deref(), Some("VIS006"));

    let ambiguous = reg.get(DatasetId::default().calibration(Calibration::Reflectance));
    assert!(matches!(ambiguous, Err(DatasetIdError::Ambiguous { count: 2, .. })));
}

#[test]
fn test_get_keys_by_id_empty_when_incompatible() {
    let reg = seviri_registry();
    let none = reg
        .get_keys_by_id(&DatasetId::named("IR_108").calibration(Calibration::Radiance))
        .unwrap();
    assert!(none.is_empty());

    let one = reg
        .get_keys_by_id(&DatasetId::with_wavelength_only(12.5))
        .unwrap();
    assert_eq!(one.len(), 1);
}

#[test]
fn test_get_keys_by_wavelength_with_calibration_set() {
    let reg = seviri_registry();
    let keys = reg
        .get_keys(
            11.5,
            &KeyFilter::new().calibration([
                Calibration::BrightnessTemperature,
                Calibration::Radiance,
            ]),
        )
        .unwrap();
    let names: Vec<_> = keys.iter().map(|k| k.name.as_deref().unwrap()).collect();
    assert_eq!(names, vec!["IR_120", "IR_108"]);
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_name_only_registration_conflict() {
    let mut reg = DatasetRegistry::new();
    let first = DatasetMeta {
        wavelength_range: Some(band(0.5, 0.6, 0.7)),
        ..Default::default()
    };
    let second = DatasetMeta {
        wavelength_range: Some(band(0.8, 0.9, 1.0)),
        ..Default::default()
    };

    reg.insert("ch1", first).unwrap();
    let err = reg.insert("ch1", second).unwrap_err();
    assert!(matches!(err, DatasetIdError::WavelengthConflict { .. }));
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_registration_keeps_insertion_order() {
    let reg = seviri_registry();
    let names: Vec<_> = reg.names().map(|n| n.unwrap().to_string()).collect();
    assert_eq!(names, vec!["VIS006", "VIS008", "IR_108", "IR_120"]);
}

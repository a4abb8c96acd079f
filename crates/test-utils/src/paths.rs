//! Path and scratch-directory helpers.
//!
//! Readers are configured from a directory of YAML documents and discover
//! granules by globbing a base directory, so most tests need one of each.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// This is determined by walking up from the current crate's manifest directory
/// until we find the workspace Cargo.toml.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Writes reader configuration documents into a fresh directory.
///
/// Each entry is `(file name, yaml)`; a bare name gets a `.yaml` suffix.
///
/// # Example
///
/// ```ignore
/// let dir = write_config_dir(&[("avhrr", fixtures::configs::AVHRR_L1B)]);
/// let finder = ReaderFinder::new(dir.path(), HandlerRegistry::new());
/// ```
pub fn write_config_dir(configs: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = temp_test_dir_with_prefix("reader_configs_");
    for (name, yaml) in configs {
        let file = if name.ends_with(".yaml") || name.ends_with(".yml") {
            name.to_string()
        } else {
            format!("{}.yaml", name)
        };
        fs::write(dir.path().join(file), yaml).expect("Failed to write reader config");
    }
    dir
}

/// Creates empty files under `dir` and returns their full paths in order.
pub fn touch_files(dir: &Path, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::File::create(&path).expect("Failed to create test file");
            path.to_string_lossy().into_owned()
        })
        .collect()
}

//! What the inventory prints.

use chrono::{DateTime, Utc};
use dataset_id::DatasetId;
use serde::Serialize;
use std::fmt::Write as _;
use swath_reader::{ConfigReader, FileHandler, FinderOutcome};

#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub outcomes: Vec<FinderOutcome>,
    pub readers: Vec<ReaderReport>,
}

#[derive(Debug, Serialize)]
pub struct ReaderReport {
    pub name: String,
    pub description: Option<String>,
    pub sensors: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub file_types: Vec<FileTypeReport>,
    pub available_datasets: Vec<DatasetId>,
    pub unidentified_files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FileTypeReport {
    pub file_type: String,
    pub platform: Option<String>,
    pub granules: Vec<GranuleReport>,
}

#[derive(Debug, Serialize)]
pub struct GranuleReport {
    pub filename: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl GranuleReport {
    fn from_handler(handler: &dyn FileHandler) -> Self {
        Self {
            filename: handler.filename().to_string(),
            start_time: handler.start_time(),
            end_time: handler.end_time(),
        }
    }
}

impl ReaderReport {
    pub fn from_reader(reader: &ConfigReader) -> Self {
        let file_types = reader
            .file_readers()
            .iter()
            .map(|fr| FileTypeReport {
                file_type: fr.file_type().to_string(),
                platform: fr.platform_name().map(str::to_string),
                granules: fr
                    .handlers()
                    .iter()
                    .map(|h| GranuleReport::from_handler(h.as_ref()))
                    .collect(),
            })
            .collect();

        Self {
            name: reader.name().to_string(),
            description: reader.config().reader.description.clone(),
            sensors: reader.sensor_names().into_iter().collect(),
            start_time: reader.start_time(),
            end_time: reader.end_time(),
            file_types,
            available_datasets: reader.available_dataset_ids().into_iter().cloned().collect(),
            unidentified_files: reader.unidentified_files().to_vec(),
        }
    }
}

impl InventoryReport {
    pub fn new(outcomes: &[FinderOutcome], readers: &[ConfigReader]) -> Self {
        Self {
            outcomes: outcomes.to_vec(),
            readers: readers.iter().map(ReaderReport::from_reader).collect(),
        }
    }

    /// Plain-text rendering.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            let _ = write!(out, "{:<24} {:<15} {} file(s)", outcome.reader, outcome.state, outcome.filenames.len());
            if let Some(error) = &outcome.error {
                let _ = write!(out, "  ({})", error);
            }
            out.push('\n');
        }

        for reader in &self.readers {
            let _ = writeln!(out, "\n{} [{}]", reader.name, reader.sensors.join(", "));
            if let (Some(start), Some(end)) = (reader.start_time, reader.end_time) {
                let _ = writeln!(out, "  coverage: {} .. {}", start.to_rfc3339(), end.to_rfc3339());
            }
            for file_type in &reader.file_types {
                let _ = writeln!(
                    out,
                    "  {} ({} granule(s), platform {})",
                    file_type.file_type,
                    file_type.granules.len(),
                    file_type.platform.as_deref().unwrap_or("unknown")
                );
                for granule in &file_type.granules {
                    let _ = writeln!(
                        out,
                        "    {}  {} .. {}",
                        granule.filename,
                        granule.start_time.format("%Y-%m-%dT%H:%M:%S"),
                        granule.end_time.format("%Y-%m-%dT%H:%M:%S")
                    );
                }
            }
            if reader.available_datasets.is_empty() {
                out.push_str("  no datasets available\n");
            }
            for id in &reader.available_datasets {
                let _ = writeln!(out, "  dataset {}", id);
            }
            for filename in &reader.unidentified_files {
                let _ = writeln!(out, "  unidentified {}", filename);
            }
        }
        out
    }
}

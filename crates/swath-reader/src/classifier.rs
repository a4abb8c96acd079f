//! Bucketing input files by file type.

use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::handler::{FileHandler, HandlerContext, HandlerRegistry};
use crate::pattern::{base_name, FilePattern};

/// Handlers opened for one file type, in the order their files were claimed.
pub struct FileTypeGroup {
    pub file_type: String,
    pub handlers: Vec<Box<dyn FileHandler>>,
}

/// Result of classifying a list of files against a reader's file types.
pub struct Classification {
    /// Groups in configuration order. File types without files are absent.
    pub groups: Vec<FileTypeGroup>,
    /// Files no pattern claimed.
    pub unidentified: Vec<String>,
}

impl Classification {
    pub fn file_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.groups.iter().map(|g| g.file_type.as_str())
    }

    pub fn handler_count(&self) -> usize {
        self.groups.iter().map(|g| g.handlers.len()).sum()
    }
}

/// Assign each file to the first file type whose pattern matches its base
/// name and open a handler for it right away.
///
/// File types are tried in configuration order and each file is claimed at
/// most once. Files left over are logged and returned as unidentified. A
/// handler that fails to open fails the whole classification.
pub fn identify_file_types(
    config: &ReaderConfig,
    filenames: &[String],
    handlers: &HandlerRegistry,
) -> Result<Classification> {
    let mut remaining: Vec<&str> = filenames.iter().map(String::as_str).collect();
    let mut groups = Vec::new();

    for file_type in &config.file_types {
        if remaining.is_empty() {
            break;
        }
        let factory = config.file_reader_for(file_type);
        let mut opened = Vec::new();

        for template in &file_type.file_patterns {
            let pattern = FilePattern::new(template)?;
            let glob = pattern.base_name_glob()?;
            let mut unmatched = Vec::with_capacity(remaining.len());

            for filename in remaining {
                if glob.matches(base_name(filename)) {
                    let ctx = HandlerContext {
                        reader: &config.reader,
                        file_type,
                        filename,
                        pattern: &pattern,
                    };
                    opened.push(handlers.open(factory, &ctx)?);
                } else {
                    unmatched.push(filename);
                }
            }
            remaining = unmatched;
        }

        if opened.is_empty() {
            continue;
        }
        debug!(
            reader = %config.name(),
            file_type = %file_type.name,
            count = opened.len(),
            "Identified files"
        );
        groups.push(FileTypeGroup {
            file_type: file_type.name.clone(),
            handlers: opened,
        });
    }

    for filename in &remaining {
        warn!(reader = %config.name(), filename = %filename, "Unidentified file");
    }

    Ok(Classification {
        groups,
        unidentified: remaining.into_iter().map(str::to_string).collect(),
    })
}

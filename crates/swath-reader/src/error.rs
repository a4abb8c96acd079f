//! Error types for the swath reader crate.

use dataset_id::DatasetIdError;
use thiserror::Error;

/// Errors that can occur while finding readers or assembling swaths.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Malformed reader, file type, dataset or metadata declaration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A `${VAR}` reference in reader YAML can't be resolved.
    #[error("Line {line}: {message}")]
    Substitution { line: usize, message: String },

    /// Dataset key resolution failed.
    #[error(transparent)]
    Key(#[from] DatasetIdError),

    /// Granules disagree on the trailing dimensions of an item.
    #[error("Shape mismatch for '{item}' in {filename}: expected trailing dimensions {expected:?}, found {found:?}")]
    ShapeMismatch {
        item: String,
        filename: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// A metadata join method that isn't one of append/append_granule/extend_granule/first.
    #[error("Unknown metadata join method: {0}")]
    UnknownJoinMethod(String),

    /// The requested granule filter can't be evaluated for this data.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Files that no configured pattern could claim.
    #[error("Don't know how to open the following files: {0:?}")]
    UnclaimedFiles(Vec<String>),

    /// Discovery found no files for a reader.
    #[error("No filenames found for reader: {0}")]
    NoFilesFound(String),

    /// No configuration exists for the named reader.
    #[error("Can't find config file for reader: {0}")]
    ReaderNotFound(String),

    /// A file handler failed to open or read a file.
    #[error("File handler error for {filename}: {message}")]
    Handler { filename: String, message: String },

    /// The file doesn't provide the requested item.
    #[error("Item '{item}' not available in {filename}")]
    MissingItem { item: String, filename: String },

    /// Granule metadata values can't be joined with the requested method.
    #[error("Can't join metadata '{item}': {message}")]
    MetadataJoin { item: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl ReaderError {
    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a Handler error.
    pub fn handler(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handler {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a MissingItem error.
    pub fn missing_item(item: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::MissingItem {
            item: item.into(),
            filename: filename.into(),
        }
    }

    /// True if the error only means "this reader can't provide it".
    pub fn is_not_found(&self) -> bool {
        match self {
            ReaderError::Key(err) => err.is_not_found(),
            ReaderError::NoFilesFound(_) | ReaderError::MissingItem { .. } => true,
            _ => false,
        }
    }
}

/// Result type for swath reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

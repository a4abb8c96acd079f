//! Config-driven swath readers.
//!
//! A reader is described by a YAML document (see [`config`]). Given a set of
//! files, a [`ConfigReader`] sorts them into file types, opens one
//! [`FileHandler`] per granule and stitches the granules of each file type
//! into contiguous swaths through a [`MultiGranuleReader`]. Datasets are
//! addressed with the composite keys from the `dataset-id` crate.
//!
//! The [`ReaderFinder`] sits on top: it turns a reader name, a set of sensors
//! or a plain file list into constructed readers, discovering files on disk
//! when none are given.

pub mod classifier;
pub mod config;
pub mod discovery;
pub mod error;
pub mod finder;
pub mod granule;
pub mod handler;
pub mod masked;
pub mod multi_granule;
pub mod pattern;
pub mod reader;

pub use classifier::{identify_file_types, Classification, FileTypeGroup};
pub use config::{
    find_reader_config, is_reader_config, load_reader_config, parse_reader_config, reader_config_paths,
    CalibrationConfig, DatasetConfig, DatasetInfo, FileKeyConfig, FileTypeConfig, MetadataConfig,
    MetadataDestination, MetadataSource, NavigationConfig, ReaderConfig, ReaderSection,
};
pub use discovery::{get_filenames, RequestInfo};
pub use error::{ReaderError, Result};
pub use finder::{assign_matching_files, FinderOutcome, FinderQuery, FinderState, ReaderFinder};
pub use granule::{polygon_from_lonlats, GranuleFilter};
pub use handler::{
    FileHandler, FilenameHandler, HandlerContext, HandlerFactory, HandlerRegistry, MetadataValue, Ring,
};
pub use masked::MaskedArray;
pub use multi_granule::{FileKeyTable, JoinMethod, MultiGranuleReader};
pub use pattern::{FieldValue, FilePattern, FilenameFields};
pub use reader::{swath_area_id, ConfigReader, Dataset, LoadRequest, LoadedMetadata, SwathNavigation};

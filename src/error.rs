//! Error types for bindery operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while assembling or writing an EPUB.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot create EPUB at {path:?}: {source}")]
    DestinationCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("staging error: {0}")]
    Staging(#[source] io::Error),

    #[error("cannot fetch media {filename:?} from {locator:?}: {source}")]
    MediaFetch {
        filename: String,
        locator: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot derive an XML id from an empty filename")]
    InvalidIdentifier,

    #[error("invalid filename {0:?}: expected a single path component")]
    InvalidFilename(String),

    #[error("book has no sections to list in the table of contents")]
    NoSections,

    #[error("cannot add {path:?} to archive ({bytes_written} bytes written): {source}")]
    ArchiveWrite {
        path: String,
        bytes_written: u64,
        #[source]
        source: io::Error,
    },

    #[error("cannot write section {filename:?}: {source}")]
    SectionWrite {
        filename: String,
        #[source]
        source: io::Error,
    },

    #[error("filename already used: {0}")]
    DuplicateFilename(String),

    #[error("parent section not found: {0}")]
    ParentNotFound(String),

    #[error("only one cover may be set")]
    MultipleCovers,

    #[error("no table of contents entry for parent {0:?}")]
    TocParentMissing(String),

    #[error("invalid package: {0}")]
    Package(String),
}

impl Error {
    /// Bytes already written to the sink when an archive write failed.
    pub fn bytes_written(&self) -> Option<u64> {
        match self {
            Error::ArchiveWrite { bytes_written, .. } => Some(*bytes_written),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

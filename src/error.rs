use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    MissingField(&'static str),
    #[error("no entries to export")]
    NothingToExport,
    #[error("import data must be a JSON array of entries")]
    NotAnArray,
    #[error("entry {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("accessing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored value under '{key}' is not a list of entries: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding entries: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("no default dataset configured")]
    Disabled,
    #[error("reading default dataset {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing default dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

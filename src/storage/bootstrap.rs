use std::fs;
use std::path::PathBuf;

use crate::error::BootstrapError;
use crate::journal::Entry;

const BUNDLED_ENTRIES: &str = include_str!("../../data/default_entries.json");

/// Source of the entries seeded on first run.
pub trait DefaultDataset {
    fn fetch(&self) -> Result<Vec<Entry>, BootstrapError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BundledDataset;

impl DefaultDataset for BundledDataset {
    fn fetch(&self) -> Result<Vec<Entry>, BootstrapError> {
        Ok(serde_json::from_str(BUNDLED_ENTRIES)?)
    }
}

#[derive(Debug, Clone)]
pub struct FileDataset {
    path: PathBuf,
}

impl FileDataset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DefaultDataset for FileDataset {
    fn fetch(&self) -> Result<Vec<Entry>, BootstrapError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| BootstrapError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDataset;

impl DefaultDataset for NoDataset {
    fn fetch(&self) -> Result<Vec<Entry>, BootstrapError> {
        Err(BootstrapError::Disabled)
    }
}

impl<F> DefaultDataset for F
where
    F: Fn() -> Result<Vec<Entry>, BootstrapError>,
{
    fn fetch(&self) -> Result<Vec<Entry>, BootstrapError> {
        self()
    }
}

pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod notify;
pub mod render;
pub mod storage;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::{BootstrapError, JournalError, StorageError, ValidationError};
pub use journal::{Draft, Entry, JournalStore};

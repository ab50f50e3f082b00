use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::journal::entry::{DateFormatter, DEFAULT_DATE_FORMAT};
use crate::notify::DEFAULT_NOTIFICATION_DURATION;
use crate::storage::{BundledDataset, DefaultDataset, FileDataset, NoDataset, DEFAULT_STORAGE_KEY};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Journal";
const APP_NAME: &str = "journal";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub storage_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("JOURNAL_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("JOURNAL_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        Ok(Self::with_roots(config_dir, config_file, data_dir))
    }

    pub fn with_roots(config_dir: PathBuf, config_file: PathBuf, data_dir: PathBuf) -> Self {
        let storage_dir = data_dir.join("storage");
        Self {
            config_dir,
            config_file,
            data_dir,
            storage_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.storage_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageOptions,
    pub bootstrap: BootstrapOptions,
    pub notifications: NotificationOptions,
    pub display: DisplayOptions,
    pub export: ExportOptions,
}

impl AppConfig {
    fn post_load(&mut self) {
        if self.storage.key.trim().is_empty() {
            tracing::warn!("empty storage key in config, falling back to {DEFAULT_STORAGE_KEY}");
            self.storage.key = DEFAULT_STORAGE_KEY.to_string();
        }
        if let Err(err) = DateFormatter::parse(&self.display.date_format) {
            tracing::warn!(%err, format = %self.display.date_format, "invalid date format in config, using default");
            self.display.date_format = DEFAULT_DATE_FORMAT.to_string();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub key: String,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapOptions {
    pub enabled: bool,
    /// Dataset file to seed from; the bundled dataset is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl BootstrapOptions {
    pub fn dataset(&self) -> Box<dyn DefaultDataset> {
        match (self.enabled, &self.path) {
            (false, _) => Box::new(NoDataset),
            (true, Some(path)) => Box::new(FileDataset::new(path)),
            (true, None) => Box::new(BundledDataset),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationOptions {
    pub duration_ms: u64,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_NOTIFICATION_DURATION.whole_milliseconds() as u64,
        }
    }
}

impl NotificationOptions {
    pub fn duration(&self) -> Duration {
        Duration::milliseconds(self.duration_ms as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub date_format: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DisplayOptions {
    pub fn formatter(&self) -> DateFormatter {
        DateFormatter::parse(&self.date_format).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl ExportOptions {
    /// Configured directory, else the user's downloads, else the working directory.
    pub fn resolve_directory(&self) -> PathBuf {
        if let Some(dir) = &self.directory {
            return dir.clone();
        }
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

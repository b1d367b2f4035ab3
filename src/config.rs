//! Configuration file handling.
//!
//! Everything lives under `$BUDGET_HOME` (by default `~/.budgettrackr`):
//!
//! - `config.json`: application settings such as how many backups to keep
//! - `budgets.json`: the persisted budgets, categories and settings
//! - `sync.json`: whether the remote API is used, and where it lives
//! - `.backups/`: snapshots taken before an import replaces local data

use crate::backup::Backup;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_NAME: &str = "budgettrackr";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const CONFIG_JSON: &str = "config.json";
const DATA_JSON: &str = "budgets.json";
const SYNC_JSON: &str = "sync.json";
pub(crate) const DEFAULT_API_BASE_URL: &str = "http://localhost:4000";

/// The `Config` object represents the data directory of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME`; missing directories and files are created with defaults so that
/// the very first run works without any setup.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    data_path: PathBuf,
    sync_path: PathBuf,
    config_file: ConfigFile,
    sync: SyncConfig,
}

impl Config {
    /// This will
    /// - create `budget_home` and its backups directory if they do not exist
    /// - load `config.json`, writing a default one if it is missing
    /// - load `sync.json`, falling back to defaults if it is missing or unreadable
    pub async fn open(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = if config_path.is_file() {
            ConfigFile::load(&config_path).await?
        } else {
            debug!("Creating {}", config_path.display());
            let config_file = ConfigFile::default();
            config_file.save(&config_path).await?;
            config_file
        };

        let sync_path = root.join(SYNC_JSON);
        let sync = SyncConfig::load_or_default(&sync_path).await;

        Ok(Self {
            data_path: root.join(DATA_JSON),
            root,
            backups,
            config_path,
            sync_path,
            config_file,
            sync,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The path of the persisted `AppState` document.
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn sync_path(&self) -> &Path {
        &self.sync_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// The sync configuration as it was when this `Config` was opened.
    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budgettrackr",
///   "config_version": 1,
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budgettrackr"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version in config file: expected {}, got {}",
            CONFIG_VERSION,
            config.config_version
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }
}

/// Whether the remote API is used, and its base URL. This is persisted separately from the
/// budget data so that importing or replacing data never changes where it syncs to.
///
/// ```json
/// { "useApi": false, "apiBaseUrl": "http://localhost:4000" }
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    use_api: bool,
    api_base_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            use_api: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn new(use_api: bool, api_base_url: impl Into<String>) -> Self {
        Self {
            use_api,
            api_base_url: api_base_url.into(),
        }
    }

    pub fn use_api(&self) -> bool {
        self.use_api
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub(crate) fn set_use_api(&mut self, use_api: bool) {
        self.use_api = use_api;
    }

    pub(crate) fn set_api_base_url(&mut self, url: impl Into<String>) {
        self.api_base_url = url.into();
    }

    /// Reads the sync document. A missing or unreadable file means "use the defaults"; sync
    /// settings are never a reason to refuse to start.
    pub async fn load_or_default(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        match utils::deserialize(path).await {
            Ok(sync) => sync,
            Err(e) => {
                warn!("Ignoring sync settings: {e:#}");
                Self::default()
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize sync config")?;
        utils::write_atomic(path, data)
            .await
            .context("Unable to write sync config file")?;
        Ok(())
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::codec::ExrCompression;
use crate::export::Resolution;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Durable-store key holding the history blob
    pub history_key: String,
    /// Durable-store key holding the last shared query (CLI address bar)
    pub address_bar_key: String,
    /// Flush scheduling
    pub sync: SyncConfig,
    /// Export defaults
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Quiet period before the history blob is written
    pub history_delay: Duration,
    /// Quiet period before the shared link is rewritten
    pub url_delay: Duration,
    /// Delay of the flush scheduled when a pointer gesture ends
    pub release_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// File name prefix of exported files
    pub prefix: String,
    /// Panorama size requested from the renderer
    pub resolution: Resolution,
    /// OpenEXR block compression
    pub compression: ExrCompression,
    /// Edge length of matcap exports
    pub matcap_size: u32,
    /// Output directory (None = current directory)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_key: "history".into(),
            address_bar_key: "address_bar".into(),
            sync: SyncConfig {
                history_delay: Duration::from_millis(1200),
                url_delay: Duration::from_millis(350),
                release_delay: Duration::from_millis(16),
            },
            export: ExportConfig {
                prefix: "lumen".into(),
                resolution: Resolution::TwoK,
                compression: ExrCompression::Zip,
                matcap_size: 512,
                output_dir: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlHistoryConfig {
    pub storage_key: Option<String>,
    pub address_bar_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSyncConfig {
    pub history_delay_ms: Option<u64>,
    pub url_delay_ms: Option<u64>,
    pub release_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlExportConfig {
    pub prefix: Option<String>,
    pub resolution: Option<Resolution>,
    pub compression: Option<ExrCompression>,
    pub matcap_size: Option<u32>,
    pub output_dir: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub history: Option<TomlHistoryConfig>,
    pub sync: Option<TomlSyncConfig>,
    pub export: Option<TomlExportConfig>,
}

impl Config {
    /// Load configuration from file, merging with defaults
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match fs::read_to_string(&config_file) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(_) => Config::default(),
        }
    }

    /// Parse a config file; unreadable TOML falls back to the defaults
    pub fn from_toml_str(contents: &str) -> Self {
        let mut config = Config::default();

        let toml_config = match toml::from_str::<TomlConfig>(contents) {
            Ok(toml_config) => toml_config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid config file");
                return config;
            }
        };

        if let Some(history) = toml_config.history {
            if let Some(key) = history.storage_key {
                config.history_key = key;
            }
            if let Some(key) = history.address_bar_key {
                config.address_bar_key = key;
            }
        }

        if let Some(sync) = toml_config.sync {
            if let Some(ms) = sync.history_delay_ms {
                config.sync.history_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = sync.url_delay_ms {
                config.sync.url_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = sync.release_delay_ms {
                config.sync.release_delay = Duration::from_millis(ms);
            }
        }

        if let Some(export) = toml_config.export {
            if let Some(prefix) = export.prefix {
                config.export.prefix = prefix;
            }
            if let Some(resolution) = export.resolution {
                config.export.resolution = resolution;
            }
            if let Some(compression) = export.compression {
                config.export.compression = compression;
            }
            if let Some(size) = export.matcap_size {
                config.export.matcap_size = size.max(1);
            }
            if export.output_dir.is_some() {
                config.export.output_dir = export.output_dir;
            }
        }

        config
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(error = %e, "Failed to create config directory");
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}

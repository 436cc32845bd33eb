//! Configuration management for pagemeta.
//!
//! Configuration is read from `~/.config/pagemeta/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fetcher::FetchConfig;
use crate::worker::WorkerConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub worker: WorkerConfig,
    pub fetch: FetchConfig,
}

/// Where the task database lives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file; `<data_dir>/pagemeta/pagemeta.db` when unset
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/pagemeta/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("pagemeta").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# pagemeta configuration
#
# Every setting is optional; anything left out uses the value shown here.

[database]
# SQLite database file (default: <data dir>/pagemeta/pagemeta.db)
# path = "/var/lib/pagemeta/pagemeta.db"

[worker]
# Maximum tasks processed per cycle
batch_size = 10

# Seconds to wait between cycles
interval_secs = 5

# "fixed-delay" waits after each batch finishes,
# "fixed-rate" counts the interval from each batch start
schedule = "fixed-delay"

# Number of hosts scraped at once within a batch (1 = sequential)
concurrency = 1

# Claim tasks before processing so several workers can share one database
claim = false

# Seconds before an abandoned claim may be taken over
claim_lease_secs = 300

# Name recorded on claims (default: pagemeta-<pid>)
# worker_id = "scraper-1"

[fetch]
# Per-request timeout in seconds
timeout_secs = 10

# Redirects followed before giving up
max_redirects = 5

# Bytes of each page downloaded; metadata only needs the document head
max_body_bytes = 2097152

# User-Agent header sent with every request
# user_agent = "pagemeta/0.1.0"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Schedule;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.worker.batch_size, 10);
        assert_eq!(config.worker.interval_secs, 5);
        assert_eq!(config.worker.schedule, Schedule::FixedDelay);
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.fetch.max_body_bytes, 2 * 1024 * 1024);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[worker]
batch_size = 25
schedule = "fixed-rate"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.worker.batch_size, 25);
        assert_eq!(config.worker.schedule, Schedule::FixedRate);
        // Defaults
        assert_eq!(config.worker.interval_secs, 5);
        assert_eq!(config.fetch.max_redirects, 5);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.worker.batch_size, 10);
        assert_eq!(config.worker.concurrency, 1);
        assert!(!config.worker.claim);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[database]\npath = \"/tmp/tasks.db\"\n[fetch]\ntimeout_secs = 3\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/tasks.db")));
        assert_eq!(config.fetch.timeout_secs, 3);
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[worker]\nbatch_size = \"many\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_create_default_config_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default_config(&path).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.worker.claim_lease_secs, 300);
    }
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.edutrack.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".edutrack.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Data source selection.
    #[serde(default)]
    pub data: DataConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Output format used when the CLI does not pick one.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

/// Hosted record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the record store API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Project identifier. Usually supplied through `EDUTRACK_PROJECT_ID`.
    #[serde(default)]
    pub project_id: String,

    /// Public API key. Usually supplied through `EDUTRACK_PUBLIC_KEY`.
    #[serde(default)]
    pub public_key: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: String::new(),
            public_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.apper.io".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Where records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    /// The hosted record store.
    #[default]
    Live,
    /// In-memory collections seeded from fixture files.
    Mock,
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub mode: DataMode,

    /// Directory holding the JSON fixture files.
    #[serde(default = "default_fixtures_dir")]
    pub fixtures_dir: PathBuf,

    /// Simulated round trip delay for in-memory repositories.
    #[serde(default = "default_latency")]
    pub latency_ms: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            mode: DataMode::default(),
            fixtures_dir: default_fixtures_dir(),
            latency_ms: default_latency(),
        }
    }
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("fixtures")
}

fn default_latency() -> u64 {
    0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.store.base_url = base_url.clone();
        }
        if let Some(ref project_id) = args.project_id {
            self.store.project_id = project_id.clone();
        }
        if let Some(ref public_key) = args.public_key {
            self.store.public_key = public_key.clone();
        }
        if let Some(timeout) = args.timeout {
            self.store.timeout_seconds = timeout;
        }

        if args.mock {
            self.data.mode = DataMode::Mock;
        }
        if let Some(ref fixtures) = args.fixtures {
            self.data.fixtures_dir = fixtures.clone();
        }
        if let Some(latency) = args.latency_ms {
            self.data.latency_ms = latency;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.mode, DataMode::Live);
        assert_eq!(config.data.fixtures_dir, PathBuf::from("fixtures"));
        assert_eq!(config.store.timeout_seconds, 30);
        assert!(config.store.project_id.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[store]
project_id = "proj-42"
timeout_seconds = 10

[data]
mode = "mock"
fixtures_dir = "seed"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.store.project_id, "proj-42");
        assert_eq!(config.store.timeout_seconds, 10);
        assert_eq!(config.store.base_url, "https://api.apper.io");
        assert_eq!(config.data.mode, DataMode::Mock);
        assert_eq!(config.data.fixtures_dir, PathBuf::from("seed"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data]\nlatency_ms = 250").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.data.latency_ms, 250);
        assert_eq!(config.data.mode, DataMode::Live);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[data\nmode = ").unwrap();
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_args_only_overrides_given_values() {
        let mut config = Config::default();
        config.store.project_id = "from-file".to_string();

        let args = Args::try_parse_from(["edutrack", "--mock", "--timeout", "5", "dashboard"])
            .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.data.mode, DataMode::Mock);
        assert_eq!(config.store.timeout_seconds, 5);
        assert_eq!(config.store.project_id, "from-file");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[data]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data.mode, DataMode::Live);
    }
}

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ConfigColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Config {
    /// Local rate settings document
    #[serde(default)]
    pub(crate) rates_file: Option<PathBuf>,
    /// Gateway endpoint serving the rate settings document
    #[serde(default)]
    pub(crate) settings_url: Option<String>,
    #[serde(default)]
    pub(crate) quota_per_unit: Option<f64>,
    #[serde(default)]
    pub(crate) precision: Option<usize>,
    #[serde(default)]
    pub(crate) offline: bool,
    #[serde(default)]
    pub(crate) no_color: bool,
    #[serde(default)]
    pub(crate) debug: bool,
    #[serde(default)]
    pub(crate) color: Option<ConfigColorMode>,
    #[serde(default)]
    pub(crate) timezone: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,
}

impl Config {
    /// Load the first config file found. A file that exists but does not parse
    /// is an error rather than being silently ignored.
    pub(crate) fn load(quiet: bool) -> Result<Self, ConfigError> {
        for path in Self::get_config_paths() {
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let config = Self::parse(&path, &content)?;
            if !quiet {
                eprintln!("Loaded config from {}", path.display());
            }
            return Ok(config);
        }
        Ok(Self::default())
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Config>(content).map_err(|e| ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. XDG config: ~/.config/quotacalc/config.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("quotacalc").join("config.toml"));
        }

        // 2. Platform config dir (e.g. ~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("quotacalc").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        // 3. Home directory: ~/.quotacalc.toml
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".quotacalc.toml"));
        }

        paths
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::ConfigError;

use super::cache::{load_cached_document, load_cached_document_if_fresh, save_cached_document};
use super::provider::fetch_settings_document;
use super::resolver::{parse_settings_document, resolve_rates};
use super::types::{RateSettings, RateTable};

const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Where the settings document comes from
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreOptions {
    pub(crate) rates_file: Option<PathBuf>,
    pub(crate) settings_url: Option<String>,
    pub(crate) offline: bool,
    pub(crate) quiet: bool,
}

/// Rate settings loaded from a file, the gateway, or the local cache
#[derive(Debug, Default)]
pub(crate) struct RateStore {
    settings: RateSettings,
}

impl RateStore {
    pub(crate) fn from_settings(settings: RateSettings) -> Self {
        Self { settings }
    }

    fn from_document(document: &HashMap<String, serde_json::Value>) -> Result<Self, ConfigError> {
        Ok(Self::from_settings(parse_settings_document(document)?))
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: HashMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Malformed {
                section: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_document(&document)
    }

    pub(crate) fn settings(&self) -> &RateSettings {
        &self.settings
    }

    pub(crate) fn resolve(&self, model: &str, group: &str) -> Result<RateTable, ConfigError> {
        resolve_rates(&self.settings, model, group)
    }

    /// Load settings. A local file is authoritative and its errors are surfaced;
    /// the remote path degrades to the cache and then to empty settings.
    pub(crate) fn load(opts: &StoreOptions) -> Result<Self, ConfigError> {
        let start = Instant::now();

        if let Some(path) = &opts.rates_file {
            let store = Self::from_file(path)?;
            if store.settings.is_empty() && !opts.quiet {
                eprintln!("Warning: {} defines no model or group rates", path.display());
            }
            if !opts.quiet {
                eprintln!(
                    "Loaded rates from {} ({:.2}ms)",
                    path.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            return Ok(store);
        }

        let Some(url) = opts.settings_url.as_deref() else {
            if !opts.quiet {
                eprintln!("No rate settings configured (use --rates or settings_url)");
            }
            return Ok(Self::default());
        };

        if opts.offline {
            if let Some(document) = load_cached_document(url) {
                if !opts.quiet {
                    eprintln!(
                        "Using cached rates ({:.2}ms)",
                        start.elapsed().as_secs_f64() * 1000.0
                    );
                }
                return Self::from_document(&document);
            }
            if !opts.quiet {
                eprintln!("No cached rates, continuing without settings");
            }
            return Ok(Self::default());
        }

        if let Some((document, age)) = load_cached_document_if_fresh(url, SETTINGS_CACHE_TTL) {
            if !opts.quiet {
                eprintln!("Using cached rates ({:.0}m old)", age.as_secs_f64() / 60.0);
            }
            return Self::from_document(&document);
        }

        if !opts.quiet {
            eprint!("Fetching rates from {url}...");
        }
        if let Some(document) = fetch_settings_document(url) {
            let store = Self::from_document(&document)?;
            save_cached_document(url, &document);
            if !opts.quiet {
                eprintln!(
                    " {} models ({:.2}ms)",
                    store.settings.model_ratio.len() + store.settings.model_price.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            return Ok(store);
        }

        if !opts.quiet {
            eprintln!(" failed, trying cache...");
        }
        if let Some(document) = load_cached_document(url) {
            if !opts.quiet {
                eprintln!("Using stale cached rates");
            }
            return Self::from_document(&document);
        }

        if !opts.quiet {
            eprintln!("Warning: no rate settings available, costs cannot be computed");
        }
        Ok(Self::default())
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Invalid timezone: {input}")]
    InvalidTimezone { input: String },

    #[error("Unsupported locale: {input}")]
    UnsupportedLocale { input: String },

    #[error("QuotaPerUnit is not configured (use --quota-per-unit or quota_per_unit in config)")]
    UnitNotConfigured,

    #[error("Amount {amount} cannot be expressed as quota")]
    AmountOutOfRange { amount: f64 },

    #[error("No usage log files matched {pattern}")]
    NoLogFiles { pattern: String },

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Pricing(#[from] PricingError),
}

/// Problems with the rate settings or the config file. Never coerced into a zero cost.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed rate settings section \"{section}\": {reason}")]
    Malformed { section: String, reason: String },

    #[error("Invalid {section} value for \"{key}\": {value}")]
    InvalidRate {
        section: &'static str,
        key: String,
        value: f64,
    },

    #[error("Unknown group \"{group}\" (not present in group_ratio)")]
    UnknownGroup { group: String },

    #[error("Model \"{model}\" has neither a model_ratio nor a model_price")]
    ModelNotPriced { model: String },

    #[error("Invalid config file {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },
}

/// Usage input that violates the caller contract.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum UsageError {
    #[error("{field} must not be negative (got {value})")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("cache_tokens ({cache}) exceeds input_tokens ({input})")]
    CacheExceedsInput { cache: i64, input: i64 },
}

#[derive(Debug, Error)]
pub(crate) enum PricingError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid usage: {0}")]
    Usage(#[from] UsageError),
}

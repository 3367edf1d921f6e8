//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{Config, ConfigColorMode};

use super::commands::Commands;

const DEFAULT_PRECISION: usize = 6;

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq)]
pub(crate) enum ColorMode {
    /// Auto-detect based on terminal (default)
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Parser)]
#[command(name = "quotacalc")]
#[command(about = "Preview gateway quota and cost from model ratios", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Rate settings document (JSON) to price against
    #[arg(short, long, global = true, value_name = "FILE")]
    pub(crate) rates: Option<PathBuf>,

    /// Gateway endpoint serving the rate settings document
    #[arg(long, global = true, value_name = "URL")]
    pub(crate) settings_url: Option<String>,

    /// Use cached rate settings only (skip fetching from the gateway)
    #[arg(short = 'O', long, global = true)]
    pub(crate) offline: bool,

    /// Quota units per one currency unit (e.g. 500000 = $1)
    #[arg(long, global = true, value_name = "N")]
    pub(crate) quota_per_unit: Option<f64>,

    /// Fractional digits for currency amounts
    #[arg(short, long, global = true, value_name = "DIGITS")]
    pub(crate) precision: Option<usize>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Suppress status messages on stderr
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Color output mode
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub(crate) color: ColorMode,

    /// Disable colored output (shorthand for --color=never)
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    /// Enable debug output (skipped log lines, pricing failures)
    #[arg(long, global = true)]
    pub(crate) debug: bool,

    /// Timezone for log timestamps (e.g., "Asia/Shanghai", "UTC")
    #[arg(long, global = true, value_name = "TZ")]
    pub(crate) timezone: Option<String>,

    /// Locale for number formatting (e.g., "en", "de", "fr")
    #[arg(long, global = true, value_name = "LOCALE")]
    pub(crate) locale: Option<String>,
}

impl Cli {
    /// Merge config file values into CLI (CLI args take precedence)
    pub(crate) fn with_config(mut self, config: &Config) -> Self {
        if !self.offline && config.offline {
            self.offline = true;
        }
        if !self.no_color && config.no_color {
            self.no_color = true;
        }
        if !self.debug && config.debug {
            self.debug = true;
        }

        if let Some(color) = config.color
            && self.color == ColorMode::Auto
        {
            self.color = match color {
                ConfigColorMode::Auto => ColorMode::Auto,
                ConfigColorMode::Always => ColorMode::Always,
                ConfigColorMode::Never => ColorMode::Never,
            };
        }

        if self.rates.is_none() {
            self.rates = config.rates_file.clone();
        }
        if self.settings_url.is_none() {
            self.settings_url = config.settings_url.clone();
        }
        if self.quota_per_unit.is_none() {
            self.quota_per_unit = config.quota_per_unit;
        }
        if self.precision.is_none() {
            self.precision = config.precision;
        }
        if self.timezone.is_none() {
            self.timezone = config.timezone.clone();
        }
        if self.locale.is_none() {
            self.locale = config.locale.clone();
        }

        self
    }

    /// Status lines are noise when stdout carries JSON
    pub(crate) fn quiet(&self) -> bool {
        self.quiet || self.json
    }

    pub(crate) fn precision(&self) -> usize {
        self.precision.unwrap_or(DEFAULT_PRECISION)
    }

    pub(crate) fn use_color(&self) -> bool {
        if self.no_color {
            return false;
        }
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn config_fills_unset_options() {
        let config = Config {
            rates_file: Some(PathBuf::from("/tmp/rates.json")),
            quota_per_unit: Some(500_000.0),
            precision: Some(2),
            color: Some(ConfigColorMode::Never),
            ..Config::default()
        };
        let cli = parse(&["quotacalc", "rates"]).with_config(&config);
        assert_eq!(cli.rates, Some(PathBuf::from("/tmp/rates.json")));
        assert_eq!(cli.quota_per_unit, Some(500_000.0));
        assert_eq!(cli.precision(), 2);
        assert!(!cli.use_color());
    }

    #[test]
    fn cli_flags_beat_config() {
        let config = Config {
            quota_per_unit: Some(500_000.0),
            precision: Some(2),
            ..Config::default()
        };
        let cli = parse(&[
            "quotacalc",
            "to-currency",
            "1000",
            "--quota-per-unit",
            "1000",
            "-p",
            "4",
        ])
        .with_config(&config);
        assert_eq!(cli.quota_per_unit, Some(1000.0));
        assert_eq!(cli.precision(), 4);
    }

    #[test]
    fn json_implies_quiet() {
        let cli = parse(&["quotacalc", "rates", "--json"]);
        assert!(cli.quiet());
        assert_eq!(cli.precision(), DEFAULT_PRECISION);
    }
}

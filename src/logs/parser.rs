//! Gateway usage-log parser
//!
//! One JSON object per line, as exported from the gateway's log table.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::consts::UNKNOWN;
use crate::engine::UsageEvent;
use crate::error::ConfigError;
use crate::rates::{RateSettings, RateTable, check_rate, is_unset_price, resolve_group_ratio};
use crate::utils::debug_enabled;

// ============================================================================
// Internal types for JSONL parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct LogLine {
    created_at: Option<i64>,
    model_name: Option<String>,
    group: Option<String>,
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    quota: Option<i64>,
    /// Object, or a string holding one (the gateway stores it as text)
    other: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct BillingDetail {
    cache_tokens: Option<i64>,
    audio_input: Option<i64>,
    audio_output: Option<i64>,
    #[serde(flatten)]
    rates: RateSnapshot,
}

impl BillingDetail {
    fn from_value(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(raw) if raw.trim().is_empty() => Some(Self::default()),
            serde_json::Value::String(raw) => serde_json::from_str(&raw).ok(),
            serde_json::Value::Null => Some(Self::default()),
            other => serde_json::from_value(other).ok(),
        }
    }
}

/// Rates the ledger recorded at billing time, as written to the log.
///
/// Values are checked when the record is priced, not when it is parsed, so a
/// bad snapshot leaves that one record unpriced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct RateSnapshot {
    model_ratio: Option<f64>,
    completion_ratio: Option<f64>,
    cache_ratio: Option<f64>,
    model_price: Option<f64>,
    group_ratio: Option<f64>,
    audio_ratio: Option<f64>,
    audio_completion_ratio: Option<f64>,
}

impl RateSnapshot {
    fn fixed_price(&self) -> Option<f64> {
        self.model_price.filter(|&price| !is_unset_price(price))
    }

    fn is_recorded(&self) -> bool {
        self.fixed_price().is_some() || self.model_ratio.is_some()
    }

    /// Rate table the call was billed at. A snapshot without `group_ratio`
    /// takes the caller's group from the current settings.
    pub(crate) fn resolve(
        &self,
        usage: &UsageEvent,
        settings: &RateSettings,
    ) -> Result<RateTable, ConfigError> {
        let model = usage.model_name.as_str();
        let group_ratio = match self.group_ratio {
            Some(ratio) => check_rate("group_ratio", &usage.group, ratio)?,
            None => resolve_group_ratio(&usage.group, &settings.group_ratio)?,
        };
        if let Some(price) = self.fixed_price() {
            return Ok(RateTable::fixed(
                check_rate("model_price", model, price)?,
                group_ratio,
            ));
        }

        let Some(model_ratio) = self.model_ratio else {
            return Err(ConfigError::ModelNotPriced {
                model: model.to_string(),
            });
        };
        let fallback = RateTable::default();
        let companion = |section: &'static str, value: Option<f64>, default: f64| {
            value.map_or(Ok(default), |v| check_rate(section, model, v))
        };
        Ok(RateTable {
            model_ratio: check_rate("model_ratio", model, model_ratio)?,
            completion_ratio: companion(
                "completion_ratio",
                self.completion_ratio,
                fallback.completion_ratio,
            )?,
            cache_ratio: companion("cache_ratio", self.cache_ratio, fallback.cache_ratio)?,
            audio_ratio: companion("audio_ratio", self.audio_ratio, fallback.audio_ratio)?,
            audio_completion_ratio: companion(
                "audio_completion_ratio",
                self.audio_completion_ratio,
                fallback.audio_completion_ratio,
            )?,
            model_price: None,
            group_ratio,
        })
    }
}

/// One billed call from the usage log
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UsageRecord {
    pub(crate) created_at: Option<i64>,
    pub(crate) usage: UsageEvent,
    /// Quota the ledger actually deducted
    pub(crate) charged_quota: Option<i64>,
    pub(crate) snapshot: Option<RateSnapshot>,
}

pub(super) fn parse_log_line(line: &str) -> Option<UsageRecord> {
    let entry: LogLine = serde_json::from_str(line).ok()?;
    let detail = match entry.other {
        Some(value) => BillingDetail::from_value(value)?,
        None => BillingDetail::default(),
    };

    let usage = UsageEvent {
        model_name: entry
            .model_name
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        group: entry.group.unwrap_or_default(),
        input_tokens: entry.prompt_tokens.unwrap_or(0),
        completion_tokens: entry.completion_tokens.unwrap_or(0),
        cache_tokens: detail.cache_tokens.unwrap_or(0),
        audio_input_tokens: detail.audio_input.unwrap_or(0),
        audio_completion_tokens: detail.audio_output.unwrap_or(0),
    };

    Some(UsageRecord {
        created_at: entry.created_at,
        usage,
        charged_quota: entry.quota,
        snapshot: detail.rates.is_recorded().then_some(detail.rates),
    })
}

/// Parse a log file, returning the records and the number of skipped lines
pub(super) fn parse_log_file(path: &Path) -> (Vec<UsageRecord>, usize) {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(err) => {
            if debug_enabled() {
                eprintln!("Failed to open {}: {}", path.display(), err);
            }
            return (Vec::new(), 0);
        }
    };
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut skipped = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                if debug_enabled() {
                    eprintln!(
                        "Failed to read line {} in {}: {}",
                        line_no + 1,
                        path.display(),
                        err
                    );
                }
                skipped += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_log_line(&line) {
            Some(record) => records.push(record),
            None => {
                if debug_enabled() {
                    eprintln!("Skipping malformed line {} in {}", line_no + 1, path.display());
                }
                skipped += 1;
            }
        }
    }
    (records, skipped)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_record() {
        let record = parse_log_line(
            r#"{"created_at":1760000000,"model_name":"gpt-4o","group":"vip","prompt_tokens":1000,"completion_tokens":200,"quota":3500}"#,
        )
        .unwrap();
        assert_eq!(record.created_at, Some(1_760_000_000));
        assert_eq!(record.usage.model_name, "gpt-4o");
        assert_eq!(record.usage.group, "vip");
        assert_eq!(record.usage.input_tokens, 1000);
        assert_eq!(record.usage.completion_tokens, 200);
        assert_eq!(record.charged_quota, Some(3500));
        assert!(record.snapshot.is_none());
    }

    fn vip_settings() -> RateSettings {
        let mut settings = RateSettings::default();
        settings.group_ratio.insert("default".to_string(), 1.0);
        settings.group_ratio.insert("vip".to_string(), 2.0);
        settings
    }

    #[test]
    fn parses_other_as_string_with_snapshot() {
        let record = parse_log_line(
            r#"{"model_name":"gpt-4o","prompt_tokens":1000,"completion_tokens":0,"other":"{\"cache_tokens\":400,\"model_ratio\":1.25,\"completion_ratio\":4,\"cache_ratio\":0.5,\"group_ratio\":1,\"model_price\":-1}"}"#,
        )
        .unwrap();
        assert_eq!(record.usage.cache_tokens, 400);
        let rates = record
            .snapshot
            .unwrap()
            .resolve(&record.usage, &RateSettings::default())
            .unwrap();
        assert!(!rates.is_fixed_price());
        assert_eq!(rates.model_ratio, 1.25);
        assert_eq!(rates.cache_ratio, 0.5);
    }

    #[test]
    fn fixed_price_snapshot() {
        let record = parse_log_line(
            r#"{"model_name":"dall-e-3","other":{"model_price":0.04,"group_ratio":2}}"#,
        )
        .unwrap();
        let rates = record
            .snapshot
            .unwrap()
            .resolve(&record.usage, &RateSettings::default())
            .unwrap();
        assert_eq!(rates, RateTable::fixed(0.04, 2.0));
    }

    #[test]
    fn negative_snapshot_rates_are_rejected() {
        for line in [
            r#"{"model_name":"gpt-4o-mini","other":{"model_ratio":-1,"group_ratio":1}}"#,
            r#"{"model_name":"dall-e-3","other":{"model_price":0.04,"group_ratio":-3}}"#,
            r#"{"model_name":"gpt-4o","other":{"model_ratio":1,"cache_ratio":-0.5}}"#,
            r#"{"model_name":"gpt-4o","other":{"model_ratio":1,"audio_ratio":-2}}"#,
            r#"{"model_name":"dall-e-3","other":{"model_price":-0.5}}"#,
        ] {
            let record = parse_log_line(line).unwrap();
            let err = record
                .snapshot
                .expect("snapshot recorded")
                .resolve(&record.usage, &vip_settings())
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRate { .. }), "{line}: {err}");
        }
    }

    #[test]
    fn snapshot_without_group_ratio_uses_callers_group() {
        let record = parse_log_line(
            r#"{"model_name":"gpt-4o-mini","group":"vip","other":{"model_ratio":0.5}}"#,
        )
        .unwrap();
        let rates = record
            .snapshot
            .unwrap()
            .resolve(&record.usage, &vip_settings())
            .unwrap();
        assert_eq!(rates.group_ratio, 2.0);
    }

    #[test]
    fn snapshot_without_group_ratio_rejects_unknown_group() {
        let record = parse_log_line(
            r#"{"model_name":"gpt-4o-mini","group":"vip-legacy","other":{"model_ratio":0.5}}"#,
        )
        .unwrap();
        let err = record
            .snapshot
            .unwrap()
            .resolve(&record.usage, &vip_settings())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGroup { ref group } if group == "vip-legacy"));
    }

    #[test]
    fn unset_price_without_ratio_is_not_a_snapshot() {
        let record = parse_log_line(
            r#"{"model_name":"gpt-4o","other":{"model_price":-1,"group_ratio":1}}"#,
        )
        .unwrap();
        assert!(record.snapshot.is_none());
    }

    #[test]
    fn audio_counts_are_read() {
        let record = parse_log_line(
            r#"{"model_name":"gpt-4o-audio-preview","prompt_tokens":10,"other":{"audio_input":30,"audio_output":20}}"#,
        )
        .unwrap();
        assert_eq!(record.usage.audio_input_tokens, 30);
        assert_eq!(record.usage.audio_completion_tokens, 20);
        assert!(record.snapshot.is_none());
    }

    #[test]
    fn missing_model_name_is_unknown() {
        let record = parse_log_line(r#"{"prompt_tokens":1}"#).unwrap();
        assert_eq!(record.usage.model_name, UNKNOWN);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_log_line("not json").is_none());
        assert!(parse_log_line(r#"{"model_name":"m","other":"{broken"}"#).is_none());
    }

    #[test]
    fn parse_file_counts_skipped_lines() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"model_name":"gpt-4o","prompt_tokens":1}}"#).unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"model_name":"gpt-4o","prompt_tokens":2}}"#).unwrap();
        let (records, skipped) = parse_log_file(file.path());
        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
    }
}

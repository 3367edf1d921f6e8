use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::consts::{DEFAULT_GROUP, DEFAULT_MODEL_KEY, MODEL_PRICE_UNSET};
use crate::error::ConfigError;

use super::types::{RateSettings, RateTable};

/// Section names: snake_case spelling first, gateway option spelling second
const MODEL_RATIO: (&str, &str) = ("model_ratio", "ModelRatio");
const COMPLETION_RATIO: (&str, &str) = ("completion_ratio", "CompletionRatio");
const CACHE_RATIO: (&str, &str) = ("cache_ratio", "CacheRatio");
const MODEL_PRICE: (&str, &str) = ("model_price", "ModelPrice");
const AUDIO_RATIO: (&str, &str) = ("audio_ratio", "AudioRatio");
const AUDIO_COMPLETION_RATIO: (&str, &str) = ("audio_completion_ratio", "AudioCompletionRatio");
const GROUP_RATIO: (&str, &str) = ("group_ratio", "GroupRatio");
const QUOTA_PER_UNIT: (&str, &str) = ("quota_per_unit", "QuotaPerUnit");

fn section<'a>(data: &'a HashMap<String, Value>, names: (&str, &str)) -> Option<&'a Value> {
    data.get(names.0).or_else(|| data.get(names.1))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode one key→number section. The gateway transports each section as a
/// JSON string, so both a nested object and a string holding one are accepted.
fn parse_number_map(
    name: &'static str,
    value: &Value,
) -> Result<HashMap<String, f64>, ConfigError> {
    let malformed = |reason: String| ConfigError::Malformed {
        section: name.to_string(),
        reason,
    };

    let object = match value {
        Value::Null => return Ok(HashMap::new()),
        Value::Object(map) => map.clone(),
        Value::String(raw) if raw.trim().is_empty() => return Ok(HashMap::new()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(malformed(format!(
                    "expected an object, found {}",
                    json_kind(&other)
                )));
            }
            Err(e) => return Err(malformed(e.to_string())),
        },
        other => {
            return Err(malformed(format!(
                "expected an object, found {}",
                json_kind(other)
            )));
        }
    };

    let mut parsed = HashMap::with_capacity(object.len());
    for (key, raw) in object {
        let Some(number) = raw.as_f64() else {
            return Err(malformed(format!(
                "value for \"{key}\" is {}, expected a number",
                json_kind(&raw)
            )));
        };
        parsed.insert(key, number);
    }
    Ok(parsed)
}

fn parse_ratio_section(
    data: &HashMap<String, Value>,
    names: (&'static str, &'static str),
) -> Result<HashMap<String, f64>, ConfigError> {
    let Some(value) = section(data, names) else {
        return Ok(HashMap::new());
    };
    let map = parse_number_map(names.0, value)?;
    for (key, &ratio) in &map {
        check_rate(names.0, key, ratio)?;
    }
    Ok(map)
}

/// Ratios and prices must be finite and non-negative
pub(crate) fn check_rate(section: &'static str, key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidRate {
            section,
            key: key.to_string(),
            value,
        })
    }
}

/// `-1` on the wire means "no fixed price"
pub(crate) fn is_unset_price(price: f64) -> bool {
    (price - MODEL_PRICE_UNSET).abs() < f64::EPSILON
}

fn parse_price_section(data: &HashMap<String, Value>) -> Result<HashMap<String, f64>, ConfigError> {
    let Some(value) = section(data, MODEL_PRICE) else {
        return Ok(HashMap::new());
    };
    let mut prices = HashMap::new();
    for (key, price) in parse_number_map(MODEL_PRICE.0, value)? {
        if is_unset_price(price) {
            continue;
        }
        check_rate(MODEL_PRICE.0, &key, price)?;
        prices.insert(key, price);
    }
    Ok(prices)
}

fn parse_quota_per_unit(data: &HashMap<String, Value>) -> Result<Option<f64>, ConfigError> {
    let malformed = |reason: String| ConfigError::Malformed {
        section: QUOTA_PER_UNIT.0.to_string(),
        reason,
    };
    match section(data, QUOTA_PER_UNIT) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| malformed(format!("\"{raw}\": {e}"))),
        Some(other) => Err(malformed(format!(
            "expected a number, found {}",
            json_kind(other)
        ))),
    }
}

/// Build typed settings from the raw settings document
pub(crate) fn parse_settings_document(
    data: &HashMap<String, Value>,
) -> Result<RateSettings, ConfigError> {
    Ok(RateSettings {
        model_ratio: parse_ratio_section(data, MODEL_RATIO)?,
        completion_ratio: parse_ratio_section(data, COMPLETION_RATIO)?,
        cache_ratio: parse_ratio_section(data, CACHE_RATIO)?,
        model_price: parse_price_section(data)?,
        audio_ratio: parse_ratio_section(data, AUDIO_RATIO)?,
        audio_completion_ratio: parse_ratio_section(data, AUDIO_COMPLETION_RATIO)?,
        group_ratio: parse_ratio_section(data, GROUP_RATIO)?,
        quota_per_unit: parse_quota_per_unit(data)?,
    })
}

/// Exact key, then the map's `"default"` key
fn lookup(map: &HashMap<String, f64>, model: &str) -> Option<f64> {
    map.get(model)
        .or_else(|| map.get(DEFAULT_MODEL_KEY))
        .copied()
}

/// Resolve the multiplier for a caller's group.
///
/// An empty id (or the reserved `"default"` id) maps to the `"default"` entry,
/// or 1.0 when none is configured. A non-empty id missing from the map points
/// at a stale tenant mapping and is reported instead of defaulted.
pub(crate) fn resolve_group_ratio(
    group: &str,
    groups: &HashMap<String, f64>,
) -> Result<f64, ConfigError> {
    let group = group.trim();
    if let Some(&ratio) = groups.get(group) {
        return Ok(ratio);
    }
    if group.is_empty() || group == DEFAULT_GROUP {
        return Ok(groups.get(DEFAULT_GROUP).copied().unwrap_or(1.0));
    }
    Err(ConfigError::UnknownGroup {
        group: group.to_string(),
    })
}

/// Resolve the full rate table for one model and group.
///
/// Exact model entries win over `"default"` entries; a fixed price beats a
/// ratio at the same precedence level.
pub(crate) fn resolve_rates(
    settings: &RateSettings,
    model: &str,
    group: &str,
) -> Result<RateTable, ConfigError> {
    let group_ratio = resolve_group_ratio(group, &settings.group_ratio)?;

    let exact_price = settings.model_price.get(model).copied();
    let exact_ratio = settings.model_ratio.get(model).copied();
    let (model_price, model_ratio) = match (exact_price, exact_ratio) {
        (Some(price), _) => (Some(price), 0.0),
        (None, Some(ratio)) => (None, ratio),
        (None, None) => {
            match (
                settings.model_price.get(DEFAULT_MODEL_KEY).copied(),
                settings.model_ratio.get(DEFAULT_MODEL_KEY).copied(),
            ) {
                (Some(price), _) => (Some(price), 0.0),
                (None, Some(ratio)) => (None, ratio),
                (None, None) => {
                    return Err(ConfigError::ModelNotPriced {
                        model: model.to_string(),
                    });
                }
            }
        }
    };

    if let Some(price) = model_price {
        return Ok(RateTable::fixed(price, group_ratio));
    }

    let fallback = RateTable::default();
    Ok(RateTable {
        model_ratio,
        completion_ratio: lookup(&settings.completion_ratio, model)
            .unwrap_or(fallback.completion_ratio),
        cache_ratio: lookup(&settings.cache_ratio, model).unwrap_or(fallback.cache_ratio),
        audio_ratio: lookup(&settings.audio_ratio, model).unwrap_or(fallback.audio_ratio),
        audio_completion_ratio: lookup(&settings.audio_completion_ratio, model)
            .unwrap_or(fallback.audio_completion_ratio),
        model_price: None,
        group_ratio,
    })
}

/// Every model name with an explicit ratio or price, sorted
pub(crate) fn priced_models(settings: &RateSettings) -> Vec<String> {
    let names: BTreeSet<&String> = settings
        .model_ratio
        .keys()
        .chain(settings.model_price.keys())
        .filter(|name| name.as_str() != DEFAULT_MODEL_KEY)
        .collect();
    names.into_iter().cloned().collect()
}

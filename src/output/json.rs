use serde_json::{Value, json};

use crate::engine::{CostBreakdown, QuotaConverter, UsageEvent, abbreviate_quota};
use crate::error::ConfigError;
use crate::logs::LogAudit;
use crate::output::format::cost_json_value;
use crate::rates::RateTable;
use crate::utils::Timezone;

fn render(value: &Value) -> String {
    format!("{value:#}")
}

pub(crate) fn output_cost_json(
    usage: &UsageEvent,
    cost: &CostBreakdown,
    quota: Option<i64>,
    derivation: &[String],
) -> String {
    render(&json!({
        "usage": usage,
        "mode": cost.mode,
        "rates": cost.rates,
        "price_per_million": cost.price_per_million,
        "effective_input_tokens": cost.effective_input_tokens,
        "text_cost": cost.text_cost,
        "audio_cost": cost.audio_cost,
        "total_cost": cost.total_cost,
        "quota": quota,
        "derivation": derivation,
        "estimate": true,
    }))
}

/// Quota → currency; `amount` is null when the unit is not configured
pub(crate) fn output_conversion_json(
    quota: Option<i64>,
    amount: Option<f64>,
    converter: QuotaConverter,
) -> String {
    render(&json!({
        "quota": quota,
        "amount": amount,
        "quota_per_unit": converter.quota_per_unit(),
        "display": quota.map(abbreviate_quota),
    }))
}

pub(crate) fn output_rates_json(rows: &[(String, Result<RateTable, ConfigError>)]) -> String {
    let output: Vec<Value> = rows
        .iter()
        .map(|(model, resolved)| match resolved {
            Ok(rates) => json!({
                "model": model,
                "rates": rates,
            }),
            Err(e) => json!({
                "model": model,
                "rates": Value::Null,
                "error": e.to_string(),
            }),
        })
        .collect();
    render(&Value::Array(output))
}

pub(crate) fn output_audit_json(audit: &LogAudit, timezone: Timezone, converter: QuotaConverter) -> String {
    let records: Vec<Value> = audit
        .rows
        .iter()
        .map(|row| {
            let mut entry = json!({
                "created_at": row.record.created_at,
                "time": row.record.created_at.and_then(|secs| timezone.format_unix(secs)),
                "model": row.record.usage.model_name,
                "group": row.record.usage.group,
                "input_tokens": row.record.usage.input_tokens,
                "cache_tokens": row.record.usage.cache_tokens,
                "completion_tokens": row.record.usage.completion_tokens,
                "audio_input_tokens": row.record.usage.audio_input_tokens,
                "audio_completion_tokens": row.record.usage.audio_completion_tokens,
                "rates_source": if row.record.snapshot.is_some() { "record" } else { "current" },
                "cost": cost_json_value(row.total_cost()),
                "quota": row.quota,
                "charged_quota": row.record.charged_quota,
                "quota_diff": row.quota_delta(),
            });
            if let Err(e) = &row.cost {
                entry["error"] = json!(e.to_string());
            }
            entry
        })
        .collect();

    let total_cost = audit.total_cost();
    render(&json!({
        "records": records,
        "summary": {
            "records": audit.rows.len(),
            "files": audit.files,
            "skipped_lines": audit.skipped,
            "unpriced": audit.failed(),
            "total_cost": total_cost,
            "total_quota": converter.to_quota(total_cost),
            "charged_quota": audit.charged_quota(),
        },
        "estimate": true,
    }))
}

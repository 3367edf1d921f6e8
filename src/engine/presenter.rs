//! Step-by-step derivation of a cost, one line per arithmetic step.
//!
//! Every operand of the final sum is substituted so the total can be checked
//! by hand.

use super::calculator::{CostBreakdown, PricingMode};
use super::usage::UsageEvent;
use crate::consts::DOLLARS_PER_MILLION_AT_UNIT_RATIO;

/// Up to six fractional digits, trailing zeros trimmed. Values below 1e-6
/// keep six significant digits instead of rounding to zero.
pub(crate) fn format_operand(value: f64) -> String {
    let magnitude = value.abs();
    let precision = if magnitude > 0.0 && magnitude < 1e-6 {
        (-magnitude.log10()).ceil() as usize + 5
    } else {
        6
    };
    let s = format!("{value:.precision$}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn dollars(value: f64) -> String {
    format!("${}", format_operand(value))
}

pub(crate) fn explain(usage: &UsageEvent, cost: &CostBreakdown) -> Vec<String> {
    let rates = &cost.rates;
    let group = format_operand(rates.group_ratio);

    if cost.mode == PricingMode::Fixed {
        let price = rates.model_price.unwrap_or(0.0);
        return vec![format!(
            "fixed price: {} × {group} = {}",
            dollars(price),
            dollars(cost.total_cost)
        )];
    }

    let ppm = cost.price_per_million;
    let mut lines = vec![
        format!(
            "input price: {} × {} = {} / 1M tokens",
            format_operand(rates.model_ratio),
            dollars(DOLLARS_PER_MILLION_AT_UNIT_RATIO),
            dollars(ppm)
        ),
        format!(
            "completion price: {} × {} = {} / 1M tokens",
            dollars(ppm),
            format_operand(rates.completion_ratio),
            dollars(ppm * rates.completion_ratio)
        ),
    ];

    if usage.cache_tokens > 0 {
        lines.push(format!(
            "cache price: {} × {} = {} / 1M tokens",
            dollars(ppm),
            format_operand(rates.cache_ratio),
            dollars(ppm * rates.cache_ratio)
        ));
        lines.push(format!(
            "effective input: ({} - {}) + {} × {} = {} tokens",
            usage.input_tokens,
            usage.cache_tokens,
            usage.cache_tokens,
            format_operand(rates.cache_ratio),
            format_operand(cost.effective_input_tokens)
        ));
    }

    let has_audio = usage.has_audio();
    if has_audio {
        lines.push(format!(
            "audio input price: {} × {} = {} / 1M tokens",
            dollars(ppm),
            format_operand(rates.audio_ratio),
            dollars(ppm * rates.audio_ratio)
        ));
        lines.push(format!(
            "audio completion price: {} × {} × {} = {} / 1M tokens",
            dollars(ppm),
            format_operand(rates.audio_ratio),
            format_operand(rates.audio_completion_ratio),
            dollars(ppm * rates.audio_ratio * rates.audio_completion_ratio)
        ));
    }

    let text_sum = format!(
        "{} / 1M × {} × {group} + {} / 1M × {} × {} × {group} = {}",
        format_operand(cost.effective_input_tokens),
        dollars(ppm),
        usage.completion_tokens,
        dollars(ppm),
        format_operand(rates.completion_ratio),
        dollars(cost.text_cost)
    );

    if !has_audio {
        lines.push(format!("total: {text_sum}"));
        return lines;
    }

    lines.push(format!("text: {text_sum}"));
    lines.push(format!(
        "audio: {} / 1M × {} × {} × {group} + {} / 1M × {} × {} × {} × {group} = {}",
        usage.audio_input_tokens,
        dollars(ppm),
        format_operand(rates.audio_ratio),
        usage.audio_completion_tokens,
        dollars(ppm),
        format_operand(rates.audio_ratio),
        format_operand(rates.audio_completion_ratio),
        dollars(cost.audio_cost)
    ));
    lines.push(format!(
        "total: {} + {} = {}",
        dollars(cost.text_cost),
        dollars(cost.audio_cost),
        dollars(cost.total_cost)
    ));
    lines
}

use serde::Serialize;

use crate::consts::{DOLLARS_PER_MILLION_AT_UNIT_RATIO, TOKENS_PER_MILLION};
use crate::error::UsageError;
use crate::rates::RateTable;

use super::usage::UsageEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PricingMode {
    /// Per-call price, token counts ignored
    Fixed,
    /// Per-token pricing derived from model ratios
    Ratio,
}

/// Cost of one usage event in dollars, with the operands used to derive it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct CostBreakdown {
    pub(crate) mode: PricingMode,
    pub(crate) text_cost: f64,
    pub(crate) audio_cost: f64,
    pub(crate) total_cost: f64,
    pub(crate) rates: RateTable,
    /// Dollars per one million input tokens (0 in fixed mode)
    pub(crate) price_per_million: f64,
    /// Cache-weighted input token count (0 in fixed mode)
    pub(crate) effective_input_tokens: f64,
}

fn per_million(tokens: f64) -> f64 {
    tokens / TOKENS_PER_MILLION
}

/// Price one usage event against a resolved rate table
pub(crate) fn compute(rates: &RateTable, usage: &UsageEvent) -> Result<CostBreakdown, UsageError> {
    usage.validate()?;

    if let Some(price) = rates.model_price {
        let total_cost = price * rates.group_ratio;
        return Ok(CostBreakdown {
            mode: PricingMode::Fixed,
            text_cost: total_cost,
            audio_cost: 0.0,
            total_cost,
            rates: *rates,
            price_per_million: 0.0,
            effective_input_tokens: 0.0,
        });
    }

    let price_per_million = rates.model_ratio * DOLLARS_PER_MILLION_AT_UNIT_RATIO;
    let cache_tokens = usage.cache_tokens as f64;
    let effective_input_tokens =
        (usage.input_tokens as f64 - cache_tokens) + cache_tokens * rates.cache_ratio;

    let text_cost = per_million(effective_input_tokens) * price_per_million * rates.group_ratio
        + per_million(usage.completion_tokens as f64)
            * price_per_million
            * rates.completion_ratio
            * rates.group_ratio;

    let audio_cost = if usage.has_audio() {
        per_million(usage.audio_input_tokens as f64)
            * price_per_million
            * rates.audio_ratio
            * rates.group_ratio
            + per_million(usage.audio_completion_tokens as f64)
                * price_per_million
                * rates.audio_ratio
                * rates.audio_completion_ratio
                * rates.group_ratio
    } else {
        0.0
    };

    Ok(CostBreakdown {
        mode: PricingMode::Ratio,
        text_cost,
        audio_cost,
        total_cost: text_cost + audio_cost,
        rates: *rates,
        price_per_million,
        effective_input_tokens,
    })
}

//! Quota/pricing engine: pure functions from rates and usage to cost,
//! quota conversion and derivation text. Performs no I/O.

mod calculator;
mod converter;
mod presenter;
mod usage;

pub(crate) use calculator::{CostBreakdown, PricingMode, compute};
pub(crate) use converter::{QuotaConverter, abbreviate_quota};
pub(crate) use presenter::{explain, format_operand};
pub(crate) use usage::UsageEvent;

use crate::error::PricingError;
use crate::rates::{RateSettings, resolve_rates};

/// Resolve rates for the event's model and group, then price it
pub(crate) fn quote(settings: &RateSettings, usage: &UsageEvent) -> Result<CostBreakdown, PricingError> {
    let rates = resolve_rates(settings, &usage.model_name, &usage.group)?;
    Ok(compute(&rates, usage)?)
}

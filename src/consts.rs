/// Reserved group id used when the caller's group is empty
pub(crate) const DEFAULT_GROUP: &str = "default";

/// Reserved key consulted when a model has no entry of its own in a ratio map
pub(crate) const DEFAULT_MODEL_KEY: &str = "default";

/// Dollars per one million tokens at model ratio 1.0 ($0.002 / 1K tokens).
/// Part of the unit system, not a tunable rate.
pub(crate) const DOLLARS_PER_MILLION_AT_UNIT_RATIO: f64 = 2.0;

pub(crate) const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Wire sentinel in `model_price` meaning "not fixed-priced"
pub(crate) const MODEL_PRICE_UNSET: f64 = -1.0;

/// Fallback value when a log record has no model name
pub(crate) const UNKNOWN: &str = "unknown";

use std::collections::HashMap;

use serde::Serialize;

/// Typed form of the gateway's rate settings document
#[derive(Debug, Clone, Default)]
pub(crate) struct RateSettings {
    pub(crate) model_ratio: HashMap<String, f64>,
    pub(crate) completion_ratio: HashMap<String, f64>,
    pub(crate) cache_ratio: HashMap<String, f64>,
    /// Fixed per-call prices in dollars; the `-1` wire sentinel is never stored
    pub(crate) model_price: HashMap<String, f64>,
    pub(crate) audio_ratio: HashMap<String, f64>,
    pub(crate) audio_completion_ratio: HashMap<String, f64>,
    pub(crate) group_ratio: HashMap<String, f64>,
    pub(crate) quota_per_unit: Option<f64>,
}

impl RateSettings {
    pub(crate) fn is_empty(&self) -> bool {
        self.model_ratio.is_empty() && self.model_price.is_empty() && self.group_ratio.is_empty()
    }
}

/// Rates resolved for one model/group pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct RateTable {
    pub(crate) model_ratio: f64,
    pub(crate) completion_ratio: f64,
    pub(crate) cache_ratio: f64,
    pub(crate) audio_ratio: f64,
    pub(crate) audio_completion_ratio: f64,
    /// `Some` selects fixed-price mode; per-token ratios are then ignored
    pub(crate) model_price: Option<f64>,
    pub(crate) group_ratio: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable {
            model_ratio: 0.0,
            completion_ratio: 0.0,
            cache_ratio: 1.0,
            audio_ratio: 1.0,
            audio_completion_ratio: 1.0,
            model_price: None,
            group_ratio: 1.0,
        }
    }
}

impl RateTable {
    pub(crate) fn ratio(model_ratio: f64, completion_ratio: f64, group_ratio: f64) -> Self {
        RateTable {
            model_ratio,
            completion_ratio,
            group_ratio,
            ..RateTable::default()
        }
    }

    pub(crate) fn fixed(model_price: f64, group_ratio: f64) -> Self {
        RateTable {
            model_price: Some(model_price),
            group_ratio,
            ..RateTable::default()
        }
    }

    pub(crate) fn is_fixed_price(&self) -> bool {
        self.model_price.is_some()
    }
}

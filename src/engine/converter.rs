/// Linear map between the gateway's integer quota unit and currency.
///
/// An unset, zero, negative or non-finite `quota_per_unit` leaves the
/// converter unconfigured: both directions return `None` and callers fall
/// back to showing raw quota.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct QuotaConverter {
    quota_per_unit: Option<f64>,
}

impl QuotaConverter {
    pub(crate) fn new(quota_per_unit: Option<f64>) -> Self {
        let quota_per_unit = quota_per_unit.filter(|q| q.is_finite() && *q > 0.0);
        Self { quota_per_unit }
    }

    pub(crate) fn quota_per_unit(&self) -> Option<f64> {
        self.quota_per_unit
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.quota_per_unit.is_some()
    }

    pub(crate) fn to_currency(&self, quota: i64) -> Option<f64> {
        self.quota_per_unit.map(|per_unit| quota as f64 / per_unit)
    }

    /// Nearest whole quota for a currency amount. `None` when unconfigured,
    /// or when the amount is non-finite or does not fit an `i64`.
    pub(crate) fn to_quota(&self, amount: f64) -> Option<i64> {
        let quota = (amount * self.quota_per_unit?).round();
        // i64::MAX as f64 is 2^63, one past the largest i64
        let in_range = quota >= i64::MIN as f64 && quota < i64::MAX as f64;
        (quota.is_finite() && in_range).then_some(quota as i64)
    }
}

/// Compact rendering of a raw quota number: verbatim below 10,000, then k/M/B
/// with one fractional digit.
pub(crate) fn abbreviate_quota(quota: i64) -> String {
    let (sign, value) = if quota < 0 {
        ("-", quota.unsigned_abs())
    } else {
        ("", quota.unsigned_abs())
    };
    let (scaled, suffix) = if value >= 1_000_000_000 {
        (value as f64 / 1_000_000_000.0, "B")
    } else if value >= 1_000_000 {
        (value as f64 / 1_000_000.0, "M")
    } else if value >= 10_000 {
        (value as f64 / 1_000.0, "k")
    } else {
        return format!("{sign}{value}");
    };
    format!("{sign}{scaled:.1}{suffix}")
}

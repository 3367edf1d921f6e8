//! Parallel log auditing: discover → parse → price → compare with the ledger.

use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::engine::{CostBreakdown, QuotaConverter, compute, quote};
use crate::error::{AppError, PricingError};
use crate::rates::RateSettings;
use crate::utils::debug_enabled;

use super::parser::{UsageRecord, parse_log_file};

/// A log record with its recomputed cost
#[derive(Debug)]
pub(crate) struct AuditRow {
    pub(crate) record: UsageRecord,
    pub(crate) cost: Result<CostBreakdown, PricingError>,
    /// Preview quota; `None` when the cost or the quota unit is unknown
    pub(crate) quota: Option<i64>,
}

impl AuditRow {
    /// Cost in dollars, NaN when it could not be computed
    pub(crate) fn total_cost(&self) -> f64 {
        self.cost.as_ref().map_or(f64::NAN, |c| c.total_cost)
    }

    /// Preview quota minus charged quota
    pub(crate) fn quota_delta(&self) -> Option<i64> {
        self.quota?.checked_sub(self.record.charged_quota?)
    }
}

#[derive(Debug, Default)]
pub(crate) struct LogAudit {
    pub(crate) rows: Vec<AuditRow>,
    pub(crate) files: usize,
    pub(crate) skipped: usize,
    pub(crate) elapsed_ms: f64,
}

impl LogAudit {
    pub(crate) fn total_cost(&self) -> f64 {
        self.rows
            .iter()
            .filter_map(|row| row.cost.as_ref().ok())
            .map(|c| c.total_cost)
            .sum()
    }

    pub(crate) fn failed(&self) -> usize {
        self.rows.iter().filter(|row| row.cost.is_err()).count()
    }

    pub(crate) fn charged_quota(&self) -> i64 {
        self.rows
            .iter()
            .filter_map(|row| row.record.charged_quota)
            .sum()
    }
}

/// Expand file arguments; each may be a path or a glob pattern
pub(crate) fn find_log_files(patterns: &[String]) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        if let Ok(entries) = glob::glob(pattern) {
            files.extend(entries.flatten().filter(|p| p.is_file()));
        }
        if files.len() == before {
            return Err(AppError::NoLogFiles {
                pattern: pattern.clone(),
            });
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Price a record with the rates it was billed at, or the current table when
/// the record carries no snapshot
pub(crate) fn price_record(
    record: &UsageRecord,
    settings: &RateSettings,
) -> Result<CostBreakdown, PricingError> {
    match &record.snapshot {
        Some(snapshot) => {
            let rates = snapshot.resolve(&record.usage, settings)?;
            Ok(compute(&rates, &record.usage)?)
        }
        None => quote(settings, &record.usage),
    }
}

pub(crate) fn audit_logs(
    files: &[PathBuf],
    settings: &RateSettings,
    converter: QuotaConverter,
    quiet: bool,
) -> LogAudit {
    let start = Instant::now();
    if !quiet {
        eprintln!("Scanning {} log files...", files.len());
    }

    let (records, skipped) = files
        .par_iter()
        .map(|path| parse_log_file(path))
        .reduce(
            || (Vec::new(), 0),
            |(mut acc, acc_skipped), (records, skipped)| {
                acc.extend(records);
                (acc, acc_skipped + skipped)
            },
        );

    let mut rows: Vec<AuditRow> = records
        .into_par_iter()
        .map(|record| {
            let cost = price_record(&record, settings);
            if let Err(e) = &cost
                && debug_enabled()
            {
                eprintln!("Cost unknown for {}: {e}", record.usage.model_name);
            }
            let quota = cost
                .as_ref()
                .ok()
                .and_then(|c| converter.to_quota(c.total_cost));
            AuditRow {
                record,
                cost,
                quota,
            }
        })
        .collect();
    rows.sort_by_key(|row| row.record.created_at);

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    if !quiet {
        eprintln!("Priced {} records ({:.2}ms)", rows.len(), elapsed_ms);
    }

    LogAudit {
        rows,
        files: files.len(),
        skipped,
        elapsed_ms,
    }
}

//! Usage-log auditing
//!
//! Recomputes the cost of every billed call in exported gateway logs and
//! compares the preview quota with what the ledger charged.

mod loader;
mod parser;

pub(crate) use loader::{AuditRow, LogAudit, audit_logs, find_log_files};

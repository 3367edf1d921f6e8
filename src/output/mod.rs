mod format;
mod json;
mod table;

pub(crate) use format::{NumberFormat, format_cost, format_quota};
pub(crate) use json::{output_audit_json, output_conversion_json, output_cost_json, output_rates_json};
pub(crate) use table::{TableOptions, print_audit_table, print_cost_table, print_rates_table};

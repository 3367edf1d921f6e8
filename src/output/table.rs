use comfy_table::{Cell, Color};

use crate::consts::DOLLARS_PER_MILLION_AT_UNIT_RATIO;
use crate::engine::{CostBreakdown, PricingMode, QuotaConverter, UsageEvent, format_operand};
use crate::error::ConfigError;
use crate::logs::LogAudit;
use crate::output::format::{
    NumberFormat, create_styled_table, format_cost, format_number, format_quota, header_cell,
    right_cell,
};
use crate::rates::RateTable;
use crate::utils::Timezone;

const ESTIMATE_NOTE: &str = "Estimate only; the gateway ledger is authoritative.";

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableOptions {
    pub(crate) use_color: bool,
    pub(crate) precision: usize,
    pub(crate) number_format: NumberFormat,
    pub(crate) converter: QuotaConverter,
    pub(crate) timezone: Timezone,
}

impl TableOptions {
    fn accent(&self, color: Color) -> Option<Color> {
        self.use_color.then_some(color)
    }
}

fn mode_label(mode: PricingMode) -> &'static str {
    match mode {
        PricingMode::Fixed => "fixed price",
        PricingMode::Ratio => "ratio",
    }
}

fn quota_cell_text(quota: Option<i64>, opts: &TableOptions) -> String {
    quota.map_or_else(
        || "N/A".to_string(),
        |q| format_number(q, opts.number_format),
    )
}

/// Key/value table for a single priced call, followed by its derivation
pub(crate) fn print_cost_table(
    usage: &UsageEvent,
    cost: &CostBreakdown,
    quota: Option<i64>,
    derivation: &[String],
    opts: TableOptions,
) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![header_cell("Field", c), header_cell("Value", c)]);

    let group = if usage.group.is_empty() {
        "(default)"
    } else {
        usage.group.as_str()
    };
    let mut rows: Vec<(&str, String)> = vec![
        ("Model", usage.model_name.clone()),
        ("Group", group.to_string()),
        ("Pricing", mode_label(cost.mode).to_string()),
        ("Group ratio", format_operand(cost.rates.group_ratio)),
    ];
    if cost.mode == PricingMode::Ratio {
        rows.extend([
            ("Input tokens", format_number(usage.input_tokens, fmt)),
            ("Cached tokens", format_number(usage.cache_tokens, fmt)),
            ("Completion tokens", format_number(usage.completion_tokens, fmt)),
        ]);
        if usage.has_audio() {
            rows.extend([
                ("Audio input tokens", format_number(usage.audio_input_tokens, fmt)),
                (
                    "Audio completion tokens",
                    format_number(usage.audio_completion_tokens, fmt),
                ),
            ]);
        }
        rows.extend([
            ("Model ratio", format_operand(cost.rates.model_ratio)),
            ("Text cost", format_cost(cost.text_cost, opts.precision)),
            ("Audio cost", format_cost(cost.audio_cost, opts.precision)),
        ]);
    } else {
        rows.push((
            "Fixed price",
            format_cost(cost.rates.model_price.unwrap_or(0.0), opts.precision),
        ));
    }

    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), right_cell(&value, None, false)]);
    }
    table.add_row(vec![
        Cell::new("Total cost"),
        right_cell(
            &format_cost(cost.total_cost, opts.precision),
            opts.accent(Color::Green),
            true,
        ),
    ]);
    table.add_row(vec![
        Cell::new("Quota"),
        right_cell(&quota_cell_text(quota, &opts), opts.accent(Color::Yellow), true),
    ]);

    println!("{table}");
    println!();
    for line in derivation {
        println!("  {line}");
    }
    println!("\n  {ESTIMATE_NOTE}\n");
}

/// One row per model; rows that failed to resolve show the error
pub(crate) fn print_rates_table(
    rows: &[(String, Result<RateTable, ConfigError>)],
    group_ratio: f64,
    opts: TableOptions,
) {
    let c = opts.use_color;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Model", c),
        header_cell("Pricing", c),
        header_cell("Ratio", c),
        header_cell("Completion", c),
        header_cell("Cache", c),
        header_cell("Audio", c),
        header_cell("Audio out", c),
        header_cell("Input $/1M", c),
        header_cell("Output $/1M", c),
        header_cell("Fixed price", c),
    ]);

    for (model, resolved) in rows {
        let rates = match resolved {
            Ok(rates) => rates,
            Err(e) => {
                let mut reason = Cell::new(e.to_string());
                if c {
                    reason = reason.fg(Color::Red);
                }
                table.add_row(vec![Cell::new(model), reason]);
                continue;
            }
        };
        let row = match rates.model_price {
            Some(price) => vec![
                Cell::new(model),
                Cell::new(mode_label(PricingMode::Fixed)),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell("-", None, false),
                right_cell(&format_cost(price * rates.group_ratio, opts.precision), None, false),
            ],
            None => {
                let input_ppm =
                    rates.model_ratio * DOLLARS_PER_MILLION_AT_UNIT_RATIO * rates.group_ratio;
                vec![
                    Cell::new(model),
                    Cell::new(mode_label(PricingMode::Ratio)),
                    right_cell(&format_operand(rates.model_ratio), None, false),
                    right_cell(&format_operand(rates.completion_ratio), None, false),
                    right_cell(&format_operand(rates.cache_ratio), None, false),
                    right_cell(&format_operand(rates.audio_ratio), None, false),
                    right_cell(&format_operand(rates.audio_completion_ratio), None, false),
                    right_cell(&format_cost(input_ppm, opts.precision), None, false),
                    right_cell(
                        &format_cost(input_ppm * rates.completion_ratio, opts.precision),
                        None,
                        false,
                    ),
                    right_cell("-", None, false),
                ]
            }
        };
        table.add_row(row);
    }

    println!("{table}");
    println!(
        "\n  Group ratio {} applied to prices. {ESTIMATE_NOTE}\n",
        format_operand(group_ratio)
    );
}

/// One row per log record with preview vs charged quota
pub(crate) fn print_audit_table(audit: &LogAudit, opts: TableOptions) {
    let c = opts.use_color;
    let fmt = opts.number_format;
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Time", c),
        header_cell("Model", c),
        header_cell("Group", c),
        header_cell("Input", c),
        header_cell("Cached", c),
        header_cell("Output", c),
        header_cell("Cost", c),
        header_cell("Quota", c),
        header_cell("Charged", c),
        header_cell("Diff", c),
    ]);

    for row in &audit.rows {
        let usage = &row.record.usage;
        let time = row
            .record
            .created_at
            .and_then(|secs| opts.timezone.format_unix(secs))
            .unwrap_or_else(|| "-".to_string());
        let charged = row
            .record
            .charged_quota
            .map_or_else(|| "-".to_string(), |q| format_number(q, fmt));
        let (diff, diff_color) = match row.quota_delta() {
            Some(0) => ("0".to_string(), None),
            Some(d) => (format_number(d, fmt), opts.accent(Color::Yellow)),
            None => ("-".to_string(), None),
        };
        let cost_color = if row.cost.is_err() {
            opts.accent(Color::Red)
        } else {
            None
        };
        table.add_row(vec![
            Cell::new(time),
            Cell::new(&usage.model_name),
            Cell::new(if usage.group.is_empty() {
                "-"
            } else {
                usage.group.as_str()
            }),
            right_cell(&format_number(usage.input_tokens, fmt), None, false),
            right_cell(&format_number(usage.cache_tokens, fmt), None, false),
            right_cell(&format_number(usage.completion_tokens, fmt), None, false),
            right_cell(&format_cost(row.total_cost(), opts.precision), cost_color, false),
            right_cell(&quota_cell_text(row.quota, &opts), None, false),
            right_cell(&charged, None, false),
            right_cell(&diff, diff_color, false),
        ]);
    }

    let total_cost = audit.total_cost();
    let total_quota = opts.converter.to_quota(total_cost);
    let charged = audit.charged_quota();
    let mut total_label = Cell::new("Total");
    if c {
        total_label = total_label.fg(Color::Yellow);
    }
    table.add_row(vec![
        total_label,
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        right_cell(
            &format_cost(total_cost, opts.precision),
            opts.accent(Color::Green),
            true,
        ),
        right_cell(&quota_cell_text(total_quota, &opts), None, true),
        right_cell(&format_number(charged, fmt), None, true),
        right_cell(
            &total_quota.map_or_else(|| "-".to_string(), |q| format_number(q - charged, fmt)),
            None,
            true,
        ),
    ]);

    println!("{table}");
    println!(
        "\n  {} records from {} files, {} skipped lines, {} unpriced | charged {} | {:.0}ms",
        format_number(audit.rows.len() as i64, fmt),
        audit.files,
        audit.skipped,
        audit.failed(),
        format_quota(charged, opts.converter, opts.precision),
        audit.elapsed_ms
    );
    println!("  {ESTIMATE_NOTE}\n");
}

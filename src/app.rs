use crate::cli::{Cli, Commands, CostArgs};
use crate::engine::{QuotaConverter, UsageEvent, explain, quote};
use crate::error::AppError;
use crate::logs::{audit_logs, find_log_files};
use crate::output::{
    NumberFormat, TableOptions, format_quota, output_audit_json, output_conversion_json,
    output_cost_json, output_rates_json, print_audit_table, print_cost_table, print_rates_table,
};
use crate::rates::{RateStore, StoreOptions, priced_models, resolve_group_ratio};
use crate::utils::Timezone;

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) store: RateStore,
    pub(crate) converter: QuotaConverter,
    pub(crate) table: TableOptions,
}

fn store_options(cli: &Cli) -> StoreOptions {
    StoreOptions {
        rates_file: cli.rates.clone(),
        settings_url: cli.settings_url.clone(),
        offline: cli.offline,
        quiet: cli.quiet(),
    }
}

/// Conversions only need the settings document for its `quota_per_unit`
fn needs_rate_settings(cli: &Cli) -> bool {
    match cli.command {
        Commands::ToCurrency { .. } | Commands::ToQuota { .. } => {
            cli.quota_per_unit.is_none() && (cli.rates.is_some() || cli.settings_url.is_some())
        }
        _ => true,
    }
}

fn handle_cost(args: &CostArgs, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let usage = UsageEvent::from(args);
    let cost = quote(ctx.store.settings(), &usage)?;
    let quota = ctx.converter.to_quota(cost.total_cost);
    let derivation = explain(&usage, &cost);

    if ctx.cli.json {
        println!("{}", output_cost_json(&usage, &cost, quota, &derivation));
    } else {
        print_cost_table(&usage, &cost, quota, &derivation, ctx.table);
    }
    Ok(())
}

fn handle_to_currency(quota: i64, ctx: &CommandContext<'_>) {
    let amount = ctx.converter.to_currency(quota);
    if ctx.cli.json {
        println!("{}", output_conversion_json(Some(quota), amount, ctx.converter));
        return;
    }
    if !ctx.converter.is_configured() && !ctx.cli.quiet() {
        eprintln!("QuotaPerUnit not configured, showing raw quota");
    }
    println!("{}", format_quota(quota, ctx.converter, ctx.table.precision));
}

fn handle_to_quota(amount: f64, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    if !ctx.converter.is_configured() {
        return Err(AppError::UnitNotConfigured);
    }
    let quota = ctx
        .converter
        .to_quota(amount)
        .ok_or(AppError::AmountOutOfRange { amount })?;
    if ctx.cli.json {
        println!(
            "{}",
            output_conversion_json(Some(quota), Some(amount), ctx.converter)
        );
    } else {
        println!("{quota}");
    }
    Ok(())
}

fn handle_rates(model: Option<&str>, group: &str, ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let settings = ctx.store.settings();
    let group_ratio = resolve_group_ratio(group, &settings.group_ratio)?;
    let models = match model {
        Some(name) => vec![name.to_string()],
        None => priced_models(settings),
    };
    if models.is_empty() {
        println!("No priced models in rate settings.");
        return Ok(());
    }

    let rows: Vec<_> = models
        .into_iter()
        .map(|name| {
            let resolved = ctx.store.resolve(&name, group);
            (name, resolved)
        })
        .collect();

    if ctx.cli.json {
        println!("{}", output_rates_json(&rows));
    } else {
        print_rates_table(&rows, group_ratio, ctx.table);
    }
    Ok(())
}

fn handle_logs(patterns: &[String], ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let files = find_log_files(patterns)?;
    let audit = audit_logs(&files, ctx.store.settings(), ctx.converter, ctx.cli.quiet());
    if audit.rows.is_empty() {
        println!("No usage records found.");
        return Ok(());
    }

    if ctx.cli.json {
        println!(
            "{}",
            output_audit_json(&audit, ctx.table.timezone, ctx.converter)
        );
    } else {
        print_audit_table(&audit, ctx.table);
    }
    Ok(())
}

pub(crate) fn run(cli: &Cli) -> Result<(), AppError> {
    let timezone = Timezone::parse(cli.timezone.as_deref())?;
    let number_format = NumberFormat::from_locale(cli.locale.as_deref())?;

    let store = if needs_rate_settings(cli) {
        RateStore::load(&store_options(cli))?
    } else {
        RateStore::default()
    };
    let converter = QuotaConverter::new(cli.quota_per_unit.or(store.settings().quota_per_unit));

    let ctx = CommandContext {
        cli,
        store,
        converter,
        table: TableOptions {
            use_color: cli.use_color(),
            precision: cli.precision(),
            number_format,
            converter,
            timezone,
        },
    };

    match &cli.command {
        Commands::Cost(args) => handle_cost(args, &ctx),
        Commands::ToCurrency { quota } => {
            handle_to_currency(*quota, &ctx);
            Ok(())
        }
        Commands::ToQuota { amount } => handle_to_quota(*amount, &ctx),
        Commands::Rates { model, group } => handle_rates(model.as_deref(), group, &ctx),
        Commands::Logs { files } => handle_logs(files, &ctx),
    }
}

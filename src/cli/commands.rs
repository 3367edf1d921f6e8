//! CLI subcommand definitions

use clap::{Args, Subcommand};

use crate::engine::UsageEvent;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Estimate the cost of one call and show how it is derived
    Cost(CostArgs),
    /// Convert a raw quota amount to currency
    ToCurrency {
        /// Quota units
        #[arg(allow_negative_numbers = true)]
        quota: i64,
    },
    /// Convert a currency amount to quota units
    ToQuota {
        /// Currency amount (e.g. 1.9)
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },
    /// Show resolved rates for one model or every priced model
    Rates {
        /// Only this model
        #[arg(short, long)]
        model: Option<String>,
        /// Caller group (empty for the default group)
        #[arg(short, long, default_value = "")]
        group: String,
    },
    /// Recompute costs for exported usage-log records (JSON Lines)
    Logs {
        /// Log files or glob patterns
        #[arg(required = true, value_name = "FILE")]
        files: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub(crate) struct CostArgs {
    /// Model name
    #[arg(short, long)]
    pub(crate) model: String,
    /// Caller group (empty for the default group)
    #[arg(short, long, default_value = "")]
    pub(crate) group: String,
    /// Prompt (input) tokens, cached tokens included
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) input: i64,
    /// Completion (output) tokens
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) completion: i64,
    /// Input tokens served from the prompt cache
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) cache: i64,
    /// Audio input tokens
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) audio_input: i64,
    /// Audio completion tokens
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) audio_completion: i64,
}

impl From<&CostArgs> for UsageEvent {
    fn from(args: &CostArgs) -> Self {
        UsageEvent {
            model_name: args.model.clone(),
            group: args.group.clone(),
            input_tokens: args.input,
            completion_tokens: args.completion,
            cache_tokens: args.cache,
            audio_input_tokens: args.audio_input,
            audio_completion_tokens: args.audio_completion,
        }
    }
}

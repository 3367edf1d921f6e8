mod cache;
mod provider;
mod resolver;
mod store;
mod types;

pub(crate) use resolver::{
    check_rate, is_unset_price, parse_settings_document, priced_models, resolve_group_ratio,
    resolve_rates,
};
pub(crate) use store::{RateStore, StoreOptions};
pub(crate) use types::{RateSettings, RateTable};

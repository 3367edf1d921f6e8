mod app;
mod cli;
mod config;
mod consts;
mod engine;
mod error;
mod logs;
mod output;
mod rates;
mod utils;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.quiet()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let cli = cli.with_config(&config);
    utils::set_debug(cli.debug);

    if let Err(e) = app::run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

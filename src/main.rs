//! `lessc` 入口。

use std::{process, str::FromStr};

use clap::Parser;
use log::{debug, error, LevelFilter};

use less_engine::cli::{run, Cli};

fn main() {
    let cli = Cli::parse();

    let log_level = LevelFilter::from_str(&cli.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", cli.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
    debug!(cli:?; "Parsed arguments");

    if let Err(err) = run(&cli) {
        error!("{err}");
        process::exit(1);
    }
}

use std::{io, process::ExitCode};

use address_tally::{app, config::Config};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    let result = app::run(&config, &mut io::stdout().lock());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.log();
            println!("{err}");
            ExitCode::FAILURE
        }
    }
}

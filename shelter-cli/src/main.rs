//! Entry point for the `shelter-map` command-line interface.
#![forbid(unsafe_code)]

use shelter_cli::CliError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    init_logging();
    if let Err(err) = shelter_cli::run() {
        if let CliError::ArgumentParsing(clap_err) = &err {
            clap_err.exit();
        }
        eprintln!("shelter-map: {err}");
        std::process::exit(1);
    }
}

/// Route `log` and `tracing` records to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("shelter-map: failed to initialise logging: {err}");
    }
}

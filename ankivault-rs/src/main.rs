//! ankivault CLI entry point.

use ankivault::cli::output::Output;
use ankivault::cli::{sync, Cli};
use ankivault::config::Config;
use ankivault::error::{exit_code, SyncError};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let output = Output::new(cli.output_format(), cli.quiet);
    match run(&cli, &output) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            tracing::debug!(error = ?e, "sync failed");
            output.error(&e.to_string());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli, output: &Output) -> Result<(), SyncError> {
    let mut config = Config::load(cli.config.as_deref())?;
    sync::apply_overrides(&mut config, cli);
    sync::run(cli, &config, output)
}

/// Logs go to stderr so the report on stdout stays parseable.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

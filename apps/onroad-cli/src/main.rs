//! # onroad CLI
//!
//! Command-line front end for the on-road price engine.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  parse args ──► init tracing ──► load onroad.toml (+ env overrides)     │
//! │                                        │                                │
//! │                                        ▼                                │
//! │              App::open (JSON storage file, PricingContext)              │
//! │                                        │                                │
//! │                                        ▼                                │
//! │       quote │ batch │ location show|set|clear │ rates ──► stdout        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod error;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use onroad_engine::PricingConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::App;
use crate::error::{CliError, CliResult};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(report_failure(&mut std::io::stderr(), &e)),
    }
}

fn run(cli: &Cli) -> CliResult<String> {
    let config = PricingConfig::load(cli.config.clone())?;
    let app = App::open(config, cli.storage.clone())?;
    app.run(&cli.command)
}

/// Writes the failure to `out` once and returns the exit code.
fn report_failure(out: &mut impl Write, e: &CliError) -> u8 {
    let _ = writeln!(out, "error: {}", e);
    e.exit_code() as u8
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `--verbose` - `info,onroad=debug` unless `RUST_LOG` is set
/// - Default: WARN level, logs on stderr
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info,onroad=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_is_reported_once() {
        let mut out = Vec::new();
        let code = report_failure(&mut out, &CliError::NoStoragePath);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "error: No storage location available; pass --storage\n");
        assert_eq!(code, 1);
    }
}

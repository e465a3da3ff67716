//! sdoc CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure

use std::process::ExitCode;

use clap::Parser;
use sdoc_spec::SpecError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args, cli.config.as_deref()),
        Commands::Cddl(args) => commands::cddl::execute(args, cli.config.as_deref()),
        Commands::Refs(args) => commands::refs::execute(args, cli.config.as_deref()),
        Commands::Metadata(args) => commands::metadata::execute(args, cli.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Install the console subscriber, keeping any one already installed.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sdoc={level},sdoc_spec={level},warn")));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .try_init();
    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<SpecError>() {
        Some(SpecError::Rejected(_)) => ExitCodes::VALIDATION_FAILURE,
        Some(
            SpecError::NotFound(_)
            | SpecError::DocumentNotFound(_)
            | SpecError::MetadataNotFound { .. }
            | SpecError::DefinitionNotFound(_),
        ) => ExitCodes::INVALID_ARGS,
        _ => ExitCodes::GENERAL_ERROR,
    }
}

mod cli;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use simrun_host::{BackendInvoker, BackendStatus, Error as HostError, RunArgs};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::resolve_config;

/// Exit code for failures of the integration itself, kept apart from backend statuses.
const INTEGRATION_FAILURE_EXIT: u8 = 125;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = run(&cli);
    match &result {
        Ok(status) if !status.is_success() => {
            error!(
                target: "simrun",
                backend = %cli.backend.display(),
                status = status.code(),
                "simulation failed"
            );
        }
        Ok(_) => {}
        Err(err) => {
            eprintln!("simrun: {err:#}");
            if let Some(hint) = hint_for(err) {
                eprintln!("hint: {hint}");
            }
        }
    }
    ExitCode::from(exit_code_for(&result))
}

/// Backend statuses pass through; failures of the integration itself exit 125.
fn exit_code_for(result: &Result<BackendStatus>) -> u8 {
    match result {
        Ok(status) => status.exit_code(),
        Err(_) => INTEGRATION_FAILURE_EXIT,
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<BackendStatus> {
    let config = resolve_config(cli)?;
    let invoker = BackendInvoker::new(config);

    let handle = invoker
        .load(&cli.backend)
        .with_context(|| format!("load backend {}", cli.backend.display()))?;

    let input = cli.input_path();
    let status = invoker
        .run_to_completion(&handle, &RunArgs::from_path(input))
        .with_context(|| format!("invoke backend {}", handle.path().display()))?;
    info!(
        target: "simrun",
        backend = %handle.path().display(),
        input = %input.display(),
        status = status.code(),
        "backend returned"
    );
    Ok(status)
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    match err.downcast_ref::<HostError>()? {
        HostError::BackendNotFound { .. } => {
            Some("check the backend path, or pass --search-dir for a logical name")
        }
        HostError::BackendLoad { .. } => Some(
            "the file exists but is not a loadable backend: check architecture, dependent libraries, and --entry-symbol",
        ),
        HostError::Invocation { .. } => Some("the backend was loaded but could not be called"),
        HostError::Config { .. } | HostError::IoAt { .. } => None,
    }
}

use std::process::ExitCode;

use anyhow::Context;
use cacerts_core::{
    config::BUGREPORT_MAILTO, error::generic_help_message, UpdaterConfig, UpdaterError,
};
use cacerts_packages::{CommandOptions, UpdateAttempt, YumBackend};
use cacerts_scheduler::{RunController, RunOutcome, TimestampStore, UpdatePolicy};
use clap::Parser;
use tracing::{error, info, Instrument};

mod cli;
mod logging;

use cli::Cli;

fn main() -> ExitCode {
    // clap prints usage and exits 2 on malformed flags.
    let cli = Cli::parse();

    // Logging is not up yet, so configuration problems go straight to stderr.
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            if let Some(help) = e.help() {
                eprintln!("{help}");
            }
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = logging::init(cli.log_level(), &config) {
        eprintln!("{e}");
        return ExitCode::from(e.exit_code());
    }

    let code = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
    {
        Ok(runtime) => runtime.block_on(supervise(config)),
        Err(e) => report_internal(&e),
    };
    ExitCode::from(code)
}

/// Run the update as a task so a panic is caught here, and stop early on
/// Ctrl-C. Returns the process exit status.
async fn supervise(config: UpdaterConfig) -> u8 {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    let task = tokio::spawn(execute(config).instrument(span));

    let joined = tokio::select! {
        joined = task => joined,
        _ = interrupted() => return report_error(&UpdaterError::Interrupted),
    };

    match joined {
        Ok(outcome) => report_outcome(&outcome),
        Err(e) => report_internal(&anyhow::Error::new(e).context("update run aborted")),
    }
}

async fn execute(config: UpdaterConfig) -> RunOutcome {
    let backend = YumBackend::new(CommandOptions::new(
        config.enable_repos.clone(),
        config.command_timeout_secs,
    ));
    let attempt = UpdateAttempt::new(Box::new(backend), config.packages());
    let mut controller = RunController::new(
        TimestampStore::new(&config.state_path),
        attempt,
        UpdatePolicy::from_config(&config),
    );
    controller.run(chrono::Utc::now()).await
}

/// Resolves on SIGINT. If the handler cannot be installed, never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn report_outcome(outcome: &RunOutcome) -> u8 {
    info!(%outcome, "run finished");
    match outcome.reportable_error() {
        Some(e) => report_error(e),
        None => 0,
    }
}

fn report_error(e: &UpdaterError) -> u8 {
    error!(code = e.code(), "{e}");
    if let Some(help) = e.help() {
        info!("{help}");
    }
    if e.is_update_failure() {
        info!("{}", generic_help_message());
    }
    e.exit_code()
}

/// The tool itself broke, as opposed to the update failing.
fn report_internal(e: &anyhow::Error) -> u8 {
    let internal = UpdaterError::Internal(format!("{e:#}"));
    error!(code = internal.code(), "Unhandled exception: {e:?}");
    error!(
        "Please send a bug report regarding this error with as much information as you can \
         provide about the circumstances to {BUGREPORT_MAILTO}"
    );
    internal.exit_code()
}

// src/bin/duet.rs

use colored::Colorize;
use duet::cli::{self, router::ParseError};
use duet::system::executor::{ProcessRunner, SystemRunner};
use std::env;
use std::sync::Arc;

/// Exit code reported when the run is interrupted with Ctrl+C.
const INTERRUPTED: i32 = 130;

/// The main entry point of the `duet` application.
/// Sets up logging and the runtime, runs one invocation and maps its result to an exit code.
fn main() {
    env_logger::init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("\n{}: failed to start the async runtime: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    };
    let code = runtime.block_on(run_cli());
    // Dropping the runtime kills any background child still registered.
    drop(runtime);
    std::process::exit(code);
}

async fn run_cli() -> i32 {
    let raw: Vec<String> = env::args().skip(1).collect();
    let start_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("\n{}: cannot read the current directory: {}", "Error".red().bold(), e);
            return 1;
        }
    };
    let runner = Arc::new(SystemRunner::new());

    let result = tokio::select! {
        result = cli::run(&raw, runner.clone(), &start_dir) => result,
        _ = tokio::signal::ctrl_c() => {
            log::debug!("Interrupted, stopping background processes.");
            if let Err(e) = runner.shutdown().await {
                log::warn!("Failed to stop background processes: {}", e);
            }
            return INTERRUPTED;
        }
    };

    if let Err(e) = runner.shutdown().await {
        log::warn!("Failed to stop background processes: {}", e);
    }

    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            // Clap renders its own errors, and `--help`/`--version` exit with 0.
            if let Some(ParseError::Clap(clap_error)) = e.downcast_ref::<ParseError>() {
                if let Err(print_error) = clap_error.print() {
                    log::warn!("Failed to print usage: {}", print_error);
                }
                return clap_error.exit_code();
            }
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            1
        }
    }
}

// src/cli/dispatcher.rs

use crate::cli::args::ParsedArguments;
use crate::cli::context::{Handler, Session, TargetScope};
use crate::cli::registry::{self, Command};
use crate::models::Target;
use anyhow::{Context, Result, anyhow};
use colored::Colorize;

/// How a dispatched invocation ended, when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The name did not resolve to a registered command.
    UnknownCommand(String),
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::UnknownCommand(_) => 1,
        }
    }
}

/// Resolves `args.command` and runs it.
pub async fn run(session: &Session, args: &ParsedArguments) -> Result<Outcome> {
    let Some(command) = registry::find_command(&args.command) else {
        eprintln!(
            "{} Unknown command '{}'. Run 'duet --help' to list the available commands.",
            "Error:".red().bold(),
            args.command.yellow()
        );
        return Ok(Outcome::UnknownCommand(args.command.clone()));
    };

    println!("\n{} {}", "▶".cyan(), command.name.as_str().bold());
    dispatch_command(session, &command, args).await?;
    Ok(Outcome::Completed)
}

/// Runs the enabled target handlers of `command`.
///
/// Parallel commands wait for every target to settle before reporting; sequential ones run
/// native then web and stop at the first failure.
pub async fn dispatch_command(session: &Session, command: &Command, args: &ParsedArguments) -> Result<()> {
    let native = command.native.filter(|_| args.flags.rust);
    let web = command.web.filter(|_| args.flags.js);
    if native.is_none() && web.is_none() {
        log::debug!("No enabled target for '{}'.", command.name);
        return Ok(());
    }

    let native_scope = session.scope(Target::Native);
    let web_scope = session.scope(Target::Web);

    if !command.parallel {
        run_handler(native, &native_scope, args).await?;
        return run_handler(web, &web_scope, args).await;
    }

    println!("{}", "--- Starting parallel targets ---".dimmed());
    let (native_result, web_result) = tokio::join!(
        run_handler(native, &native_scope, args),
        run_handler(web, &web_scope, args)
    );
    println!("{}", "--- Parallel targets finished ---".dimmed());

    let errors: Vec<anyhow::Error> = [native_result, web_result]
        .into_iter()
        .filter_map(Result::err)
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    let details = errors
        .iter()
        .map(|e| format!("  - {:#}", e))
        .collect::<Vec<_>>()
        .join("\n");
    Err(anyhow!(
        "{} target(s) of '{}' failed:\n{}",
        errors.len(),
        command.name,
        details
    ))
}

async fn run_handler(handler: Option<Handler>, scope: &TargetScope<'_>, args: &ParsedArguments) -> Result<()> {
    let Some(handler) = handler else {
        return Ok(());
    };
    log::debug!("Running {} target in '{}'", scope.target(), scope.cwd().display());
    handler(scope, args)
        .await
        .with_context(|| format!("The {} target failed", scope.target()))
}

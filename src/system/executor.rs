// src/system/executor.rs

use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::process::{Child, Command as TokioCommand};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with a non-zero status ({status}).")]
    NonZeroExitStatus { command: String, status: String },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Boxed future returned by [`ProcessRunner`] methods.
pub type RunFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ExecutionError>> + Send + 'a>>;

/// A fully described external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The invocation rendered as a shell-quoted command line, for display only.
    pub fn command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| {
            // Arguments containing NUL bytes cannot be quoted; show them raw.
            let mut raw = self.program.clone();
            for arg in &self.args {
                raw.push(' ');
                raw.push_str(arg);
            }
            raw
        })
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// The seam between orchestration logic and the operating system.
///
/// Everything that spawns a process goes through this trait, which lets tests swap in
/// a recording double (see `system::testing`).
pub trait ProcessRunner: Send + Sync {
    /// Runs the invocation with inherited stdio and waits for it to finish.
    fn run<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, ()>;

    /// Runs the invocation and returns its captured standard output.
    fn capture<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, String>;

    /// Starts the invocation without waiting for it. The runner owns the child from here on.
    fn spawn_background(&self, invocation: &Invocation) -> Result<(), ExecutionError>;

    /// Terminates every background process started through this runner.
    fn shutdown(&self) -> RunFuture<'_, ()>;
}

/// The real runner, backed by `tokio::process`.
///
/// Background children are kept in a registry and spawned with `kill_on_drop`, so they
/// never outlive the orchestrator even when `shutdown` is not reached.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner {
    background: Arc<Mutex<Vec<Child>>>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_command(invocation: &Invocation, program: &str, args: &[String]) -> TokioCommand {
        let mut command = TokioCommand::new(program);
        command
            .args(args)
            .current_dir(dunce::simplified(&invocation.cwd))
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }

    /// Spawns the invocation, falling back to `cmd /C` on Windows when the program is not
    /// found directly (npm and npx are batch scripts there).
    fn spawn_with_fallback(
        invocation: &Invocation,
        configure: impl Fn(&mut TokioCommand),
    ) -> Result<Child, ExecutionError> {
        if invocation.program.trim().is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }

        let mut command = Self::build_command(invocation, &invocation.program, &invocation.args);
        configure(&mut command);

        match command.spawn() {
            Ok(child) => Ok(child),
            Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
                log::debug!(
                    "Command '{}' not found. Retrying with cmd /C.",
                    invocation.program
                );
                let mut shell_args = vec!["/C".to_string(), invocation.program.clone()];
                shell_args.extend(invocation.args.iter().cloned());
                let mut command = Self::build_command(invocation, "cmd", &shell_args);
                configure(&mut command);
                command
                    .spawn()
                    .map_err(|e| ExecutionError::CommandFailed(invocation.command_line(), e))
            }
            Err(e) => Err(ExecutionError::CommandFailed(invocation.command_line(), e)),
        }
    }
}

fn check_status(invocation: &Invocation, status: ExitStatus) -> Result<(), ExecutionError> {
    if status.success() {
        return Ok(());
    }
    Err(ExecutionError::NonZeroExitStatus {
        command: invocation.command_line(),
        status: status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |code| format!("code {}", code)),
    })
}

impl ProcessRunner for SystemRunner {
    fn run<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, ()> {
        Box::pin(async move {
            log::debug!("Running '{}' in '{}'", invocation, invocation.cwd.display());
            let mut child = Self::spawn_with_fallback(invocation, |command| {
                command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            })?;
            let status = child
                .wait()
                .await
                .map_err(|e| ExecutionError::CommandFailed(invocation.command_line(), e))?;
            check_status(invocation, status)
        })
    }

    fn capture<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, String> {
        Box::pin(async move {
            log::debug!("Capturing '{}' in '{}'", invocation, invocation.cwd.display());
            let child = Self::spawn_with_fallback(invocation, |command| {
                command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::inherit());
            })?;
            let output = child
                .wait_with_output()
                .await
                .map_err(|e| ExecutionError::CommandFailed(invocation.command_line(), e))?;
            check_status(invocation, output.status)?;

            String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
                command: invocation.command_line(),
                source: e,
            })
        })
    }

    fn spawn_background(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        log::debug!(
            "Starting background process '{}' in '{}'",
            invocation,
            invocation.cwd.display()
        );
        let child = Self::spawn_with_fallback(invocation, |command| {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true);
        })?;

        match self.background.lock() {
            Ok(mut registry) => registry.push(child),
            // A poisoned registry still owns its children; keep tracking them.
            Err(poisoned) => poisoned.into_inner().push(child),
        }
        Ok(())
    }

    fn shutdown(&self) -> RunFuture<'_, ()> {
        Box::pin(async move {
            let children: Vec<Child> = match self.background.lock() {
                Ok(mut registry) => registry.drain(..).collect(),
                Err(poisoned) => poisoned.into_inner().drain(..).collect(),
            };
            for mut child in children {
                let pid = child.id();
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to stop background process {:?}: {}", pid, e);
                } else {
                    log::debug!("Stopped background process {:?}", pid);
                }
            }
            Ok(())
        })
    }
}

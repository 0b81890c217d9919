// src/cli/context.rs

use crate::cli::args::ParsedArguments;
use crate::core::config_loader::ProjectConfig;
use crate::core::paths::ProjectPaths;
use crate::models::Target;
use crate::system::executor::{Invocation, ProcessRunner};
use anyhow::Result;
use colored::Colorize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by every target handler.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A per-target unit of work. Handlers receive their working directory through the scope
/// and never change the process-wide one.
pub type Handler = for<'a> fn(&'a TargetScope<'a>, &'a ParsedArguments) -> HandlerFuture<'a>;

/// Resolved state shared by every handler of one invocation.
pub struct Session {
    pub paths: ProjectPaths,
    pub config: ProjectConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl Session {
    pub fn new(paths: ProjectPaths, config: ProjectConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            paths,
            config,
            runner,
        }
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    /// An owned handle on the runner, for work that outlives a handler call.
    pub fn runner_handle(&self) -> Arc<dyn ProcessRunner> {
        Arc::clone(&self.runner)
    }

    /// The working directory a target's commands run in.
    pub fn target_root(&self, target: Target) -> &Path {
        match target {
            Target::Native => &self.paths.native_root,
            Target::Web => &self.paths.web_root,
        }
    }

    pub fn scope(&self, target: Target) -> TargetScope<'_> {
        TargetScope {
            target,
            cwd: self.target_root(target).to_path_buf(),
            session: self,
        }
    }
}

/// A target bound to its working directory.
///
/// Every invocation created through the scope carries that directory explicitly, so two
/// scopes can run concurrently without interfering.
pub struct TargetScope<'a> {
    target: Target,
    cwd: PathBuf,
    session: &'a Session,
}

impl<'a> TargetScope<'a> {
    pub fn target(&self) -> Target {
        self.target
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn session(&self) -> &'a Session {
        self.session
    }

    pub fn paths(&self) -> &'a ProjectPaths {
        &self.session.paths
    }

    pub fn config(&self) -> &'a ProjectConfig {
        &self.session.config
    }

    /// A new invocation of `program` in this scope's directory.
    pub fn invocation(&self, program: &str) -> Invocation {
        Invocation::new(program, &self.cwd)
    }

    /// Echoes and runs an invocation, failing on a non-zero exit.
    pub async fn run(&self, invocation: Invocation) -> Result<()> {
        println!(
            "{} {} {}",
            format!("[{}]", self.target).dimmed(),
            "→".blue(),
            invocation.command_line().green()
        );
        self.session.runner().run(&invocation).await?;
        Ok(())
    }

    /// Like [`TargetScope::run`], with the toolchain passthrough arguments appended.
    pub async fn run_with_toolchain_args(&self, invocation: Invocation, args: &ParsedArguments) -> Result<()> {
        self.run(invocation.args(args.toolchain_args.iter().cloned())).await
    }
}

// src/cli/handlers/watch.rs

use super::build;
use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};
use crate::constants::ROOT_ENV_VAR;
use crate::core::paths::ProjectPaths;
use crate::system::executor::{Invocation, ProcessRunner};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Rebuilds the native target on every change, optionally with the backend running.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        if args.flags.backend {
            // Detached on purpose: the backend process itself is owned by the runner.
            drop(start_backend(scope.session().runner_handle(), scope.paths()));
        }

        let exe = std::env::current_exe().context("Cannot locate the duet executable")?;
        let rebuild = rebuild_command(&exe, build::selected_crate(scope, args), args)?;
        // Rebuilds run from the native root; pin the project root so they resolve the same paths.
        let watch = scope
            .invocation("cargo")
            .args(["watch", "-s"])
            .arg(rebuild)
            .env(ROOT_ENV_VAR, scope.paths().root.to_string_lossy());
        scope.run(watch).await
    })
}

pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move { scope.run(scope.invocation("npm").args(["run", "watch"])).await })
}

/// The shell command `cargo watch` runs on change: a dev build of the native target only.
pub(crate) fn rebuild_command(exe: &Path, krate: &str, args: &ParsedArguments) -> Result<String> {
    let exe = exe.to_string_lossy();
    let crate_flag = format!("--crate={}", krate);
    let mut words = vec![&*exe, "build", "--js=false", "--dev", crate_flag.as_str()];
    if !args.toolchain_args.is_empty() {
        words.push("--");
        words.extend(args.toolchain_args.iter().map(String::as_str));
    }
    shlex::try_join(words).context("Cannot quote the rebuild command")
}

/// Builds the backend package, then starts the backend binary in the background.
///
/// Failures are logged, never raised: the watch loop does not depend on the backend.
pub(crate) fn start_backend(runner: Arc<dyn ProcessRunner>, paths: &ProjectPaths) -> JoinHandle<()> {
    let setup = Invocation::new("npm", &paths.backend_package).args(["run", "build"]);
    let launch = Invocation::new(paths.backend_binary.to_string_lossy(), &paths.root);

    tokio::spawn(async move {
        println!("{}", t!("watch.info.backend_building").cyan());
        if let Err(e) = runner.run(&setup).await {
            log::warn!("Backend setup failed, continuing without it: {}", e);
            return;
        }
        match runner.spawn_background(&launch) {
            Ok(()) => println!("{} {}", t!("watch.info.backend_started").cyan(), launch.program),
            Err(e) => log::warn!("Backend failed to start: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::test_support::{session, session_with};
    use crate::models::Target;
    use crate::system::testing::RecordingRunner;

    #[test]
    fn test_rebuild_command_forwards_crate_and_toolchain_args() {
        let mut args = ParsedArguments::default();
        args.toolchain_args = vec!["--features".into(), "a b".into()];
        let line = rebuild_command(Path::new("/opt/duet"), "foo", &args).unwrap();
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec!["/opt/duet", "build", "--js=false", "--dev", "--crate=foo", "--", "--features", "a b"]
        );
    }

    #[tokio::test]
    async fn test_backend_is_built_then_started_in_background() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());

        start_backend(session.runner_handle(), &session.paths).await.unwrap();

        let invocations = runner.invocations();
        let setup = &invocations[0];
        assert_eq!(setup.command_line(), "npm run build");
        assert_eq!(setup.cwd, session.paths.backend_package);
        let background = runner.background();
        assert_eq!(background.len(), 1);
        assert_eq!(
            background[0].program,
            session.paths.backend_binary.to_string_lossy()
        );
    }

    #[tokio::test]
    async fn test_backend_setup_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session_with(dir.path(), RecordingRunner::new().failing("npm"));

        start_backend(session.runner_handle(), &session.paths).await.unwrap();
        assert!(runner.background().is_empty());
    }

    #[tokio::test]
    async fn test_watch_native_without_backend() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        let mut args = ParsedArguments::default();
        args.flags.backend = false;

        native(&session.scope(Target::Native), &args).await.unwrap();
        tokio::task::yield_now().await;

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].args[..2], ["watch", "-s"]);
        let rebuild = shlex::split(&invocations[0].args[2]).unwrap();
        assert_eq!(rebuild[1..], ["build", "--js=false", "--dev", "--crate=ide"]);
        assert!(runner.background().is_empty());
    }

    #[tokio::test]
    async fn test_rebuilds_are_pinned_to_the_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        let mut args = ParsedArguments::default();
        args.flags.backend = false;

        native(&session.scope(Target::Native), &args).await.unwrap();

        let invocations = runner.invocations();
        let watch = &invocations[0];
        assert_eq!(watch.cwd, session.paths.native_root);
        let root = session.paths.root.to_string_lossy().into_owned();
        assert_eq!(watch.env, vec![(ROOT_ENV_VAR.to_string(), root)]);
    }
}

// src/cli/mod.rs

//! Command-line front end: argument routing, the command registry, dispatch and the
//! per-command handlers.

pub mod args;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod registry;
pub mod router;

use crate::core::build_state::BuildStateTracker;
use crate::core::config_loader;
use crate::core::install_cache::{self, DependencyInstallCache};
use crate::core::paths::ProjectPaths;
use crate::system::executor::ProcessRunner;
use anyhow::Result;
use args::ParsedArguments;
use context::Session;
use dispatcher::Outcome;
use registry::CommandName;
use std::path::Path;
use std::sync::Arc;

/// Runs one orchestrator invocation from raw arguments (program name excluded).
///
/// Arguments are parsed before anything touches the disk. The build-state and install steps
/// then run for every command, known or not, before dispatch.
pub async fn run(raw: &[String], runner: Arc<dyn ProcessRunner>, start_dir: &Path) -> Result<Outcome> {
    let args = router::parse(raw)?;
    registry::validate()?;

    let root = config_loader::locate_root(start_dir);
    let config = config_loader::load(&root)?;
    let paths = ProjectPaths::resolve(&root, &config)?;
    let session = Session::new(paths, config, runner);

    prepare(&session, &args).await?;
    dispatcher::run(&session, &args).await
}

/// The invocation-wide state steps: build-state reconciliation, then either the
/// dependency install (every command) or marker removal (`clean`).
pub async fn prepare(session: &Session, args: &ParsedArguments) -> Result<()> {
    let paths = &session.paths;
    let tracker = BuildStateTracker::new(
        &paths.build_info,
        &paths.build_init_marker,
        &paths.root,
        session.runner(),
    );
    if tracker.reconcile(args.target_platform()).await? {
        log::debug!("Build state written to '{}'", paths.build_info.display());
    }

    let command = registry::find_command(&args.command).map(|cmd| cmd.name);
    if command == Some(CommandName::Clean) {
        install_cache::remove_markers(&[
            paths.install_marker.as_path(),
            paths.build_init_marker.as_path(),
        ])
        .await?;
    } else {
        DependencyInstallCache::new(&paths.install_marker, &paths.web_root, session.runner())
            .ensure_installed()
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildState, Platform};
    use crate::system::testing::RecordingRunner;

    fn raw(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn git_runner() -> RecordingRunner {
        RecordingRunner::new().with_capture("git", "abc1234\n")
    }

    fn read_state(path: &Path) -> BuildState {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_build_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("duet.toml"), "[native]\nout_name = \"app\"\n").unwrap();
        let runner = Arc::new(git_runner());
        let wasm = dir.path().join("dist").join("wasm");
        std::fs::create_dir_all(&wasm).unwrap();
        std::fs::write(wasm.join("app.js"), "export default init;").unwrap();
        std::fs::write(wasm.join("app_bg.wasm"), b"\0asm").unwrap();

        let outcome = run(
            &raw("build --dev --target=linux --crate=foo -- --flagA -- --flagB"),
            runner.clone(),
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Completed);

        let invocations = runner.invocations();
        let programs: Vec<&str> = invocations.iter().map(|i| i.program.as_str()).collect();
        assert_eq!(programs, vec!["git", "npm", "wasm-pack", "npm"]);
        assert_eq!(invocations[1].args, vec!["install"]);
        assert_eq!(invocations[2].cwd, dir.path().join("src/rust"));
        assert!(invocations[2].args.contains(&"foo".to_string()));
        assert!(invocations[2].args.ends_with(&["--dev".to_string(), "--flagA".to_string()]));
        assert_eq!(invocations[3].args, vec!["run", "build"]);
        assert_eq!(invocations[3].cwd, dir.path().join("src/js"));

        let state = read_state(&dir.path().join("dist/build.json"));
        assert_eq!(state.target, Platform::Linux);
        assert_eq!(state.build_version, "abc1234");
        assert!(dir.path().join("dist/init").exists());
        assert!(wasm.join("app.wasm").exists());
    }

    #[tokio::test]
    async fn test_clean_removes_markers_instead_of_installing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(git_runner());

        run(&raw("clean --target=win"), runner.clone(), dir.path())
            .await
            .unwrap();

        assert_eq!(
            runner.command_lines(),
            vec!["git rev-parse --short HEAD", "cargo clean", "npm run clean"]
        );
        assert!(!dir.path().join("dist/init").exists());
        assert!(!dir.path().join("dist/build-init").exists());
        assert_eq!(read_state(&dir.path().join("dist/build.json")).target, Platform::Windows);
    }

    #[tokio::test]
    async fn test_next_run_after_clean_restores_init_marker() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(git_runner());

        run(&raw("clean --target=linux"), runner.clone(), dir.path())
            .await
            .unwrap();
        assert!(!dir.path().join("dist/build-init").exists());

        run(&raw("check --target=linux"), runner.clone(), dir.path())
            .await
            .unwrap();
        assert!(dir.path().join("dist/build-init").exists());
    }

    #[tokio::test]
    async fn test_unknown_command_still_runs_state_steps() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(git_runner());

        let outcome = run(&raw("deploy --target=macos"), runner.clone(), dir.path())
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::UnknownCommand("deploy".into()));
        assert_eq!(runner.command_lines(), vec!["git rev-parse --short HEAD", "npm install"]);
        assert_eq!(read_state(&dir.path().join("dist/build.json")).target, Platform::MacOs);
    }

    #[tokio::test]
    async fn test_parse_error_happens_before_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(git_runner());

        let err = run(&raw("build --bogus"), runner.clone(), dir.path())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<router::ParseError>().is_some());
        assert!(runner.invocations().is_empty());
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_version_query_failure_aborts_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(RecordingRunner::new().failing("git"));

        assert!(run(&raw("check"), runner.clone(), dir.path()).await.is_err());
        assert_eq!(runner.command_lines(), vec!["git rev-parse --short HEAD"]);
    }

    #[tokio::test]
    async fn test_install_runs_once_across_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(git_runner());

        run(&raw("check --target=linux"), runner.clone(), dir.path()).await.unwrap();
        run(&raw("check --target=linux"), runner.clone(), dir.path()).await.unwrap();

        let installs = runner
            .command_lines()
            .into_iter()
            .filter(|line| line == "npm install")
            .count();
        assert_eq!(installs, 1);
    }
}

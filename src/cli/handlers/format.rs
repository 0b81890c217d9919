// src/cli/handlers/format.rs

use super::lint::WEB_SOURCES;
use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};
use crate::core::toml_format;
use anyhow::Context;
use colored::Colorize;

/// Runs `cargo fmt`, then normalizes every TOML file under the native root.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope
            .run_with_toolchain_args(scope.invocation("cargo").arg("fmt"), args)
            .await?;

        let root = scope.cwd().to_path_buf();
        println!("{}", t!("format.info.toml").cyan());
        let summary = tokio::task::spawn_blocking(move || toml_format::format_tree(&root))
            .await
            .context("The TOML formatting task panicked")??;
        for path in &summary.rewritten {
            println!("  {} {}", "✎".yellow(), path.display());
        }
        println!(
            "{} {} TOML file(s) checked, {} rewritten.",
            "✔".green(),
            summary.found,
            summary.rewritten.len()
        );
        Ok(())
    })
}

pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope
            .run(scope.invocation("npx").args(["prettier", "--write", WEB_SOURCES]))
            .await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::test_support::session;
    use crate::models::Target;
    use std::fs;

    #[tokio::test]
    async fn test_format_native_rewrites_toml_files() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        let manifest = session.paths.native_root.join("Cargo.toml");
        fs::create_dir_all(&session.paths.native_root).unwrap();
        fs::write(&manifest, "[workspace]  \r\nmembers = []\n\n\n").unwrap();

        native(&session.scope(Target::Native), &ParsedArguments::default())
            .await
            .unwrap();

        assert_eq!(runner.command_lines(), vec!["cargo fmt"]);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "[workspace]\nmembers = []\n");
    }

    #[tokio::test]
    async fn test_format_native_fails_on_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _runner) = session(dir.path());
        fs::create_dir_all(&session.paths.native_root).unwrap();
        fs::write(session.paths.native_root.join("broken.toml"), "[oops").unwrap();

        let result = native(&session.scope(Target::Native), &ParsedArguments::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_format_web_runs_prettier() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        web(&session.scope(Target::Web), &ParsedArguments::default())
            .await
            .unwrap();
        let invocations = runner.invocations();
        assert_eq!(invocations[0].program, "npx");
        assert_eq!(invocations[0].args, vec!["prettier", "--write", "src/**/*.js"]);
    }
}

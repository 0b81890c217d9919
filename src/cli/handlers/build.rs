// src/cli/handlers/build.rs

use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};
use crate::core::post_processor::{ArtifactPostProcessor, WasmPackGluePatcher};
use anyhow::{Context, Result};
use colored::Colorize;

/// The crate to build: `--crate` when given, the configured default otherwise.
pub(crate) fn selected_crate<'a>(scope: &TargetScope<'a>, args: &'a ParsedArguments) -> &'a str {
    args.option_str("crate")
        .unwrap_or(&scope.config().native.default_crate)
}

pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(build_native(scope, args))
}

pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move { scope.run(scope.invocation("npm").args(["run", "build"])).await })
}

/// Compiles the selected crate to WebAssembly and post-processes the artifact.
///
/// Shared by `start` (forced dev) and `dist` (forced release).
pub(crate) async fn build_native(scope: &TargetScope<'_>, args: &ParsedArguments) -> Result<()> {
    let config = scope.config();
    let wasm = &scope.paths().wasm;
    let krate = selected_crate(scope, args);
    let mode = args.build_mode();

    println!("{} '{}' ({})", t!("build.info.building").cyan(), krate.yellow(), mode);
    let mut wasm_pack = scope.invocation("wasm-pack").args([
        "build".to_string(),
        "--target".to_string(),
        "web".to_string(),
        "--out-dir".to_string(),
        wasm.root.to_string_lossy().into_owned(),
        "--out-name".to_string(),
        config.native.out_name.clone(),
        krate.to_string(),
    ]);
    if mode.is_dev() {
        wasm_pack = wasm_pack.arg("--dev");
    } else if args.flags.release {
        wasm_pack = wasm_pack.arg("--release");
    }
    scope.run_with_toolchain_args(wasm_pack, args).await?;

    let patcher = WasmPackGluePatcher::new().context("Invalid glue substitution pattern")?;
    let processor = ArtifactPostProcessor::new(wasm, config.dist.size_budget_mb, &patcher);
    if let Some(size_mb) = processor.process(mode).await? {
        println!(
            "{} {} {}MB / {}MB",
            "✔".green(),
            t!("build.info.size_ok"),
            size_mb,
            config.dist.size_budget_mb
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::Session;
    use crate::cli::context::test_support::{session, session_with};
    use crate::core::post_processor::PostProcessError;
    use crate::models::Target;
    use crate::system::testing::RecordingRunner;
    use std::fs;

    /// Lays down what a successful wasm-pack run leaves behind.
    fn fake_wasm_output(session: &Session, payload: &[u8]) {
        let wasm = &session.paths.wasm;
        fs::create_dir_all(&wasm.root).unwrap();
        fs::write(&wasm.glue, "export default init;\n").unwrap();
        fs::write(&wasm.raw, payload).unwrap();
    }

    fn with_crate(name: &str) -> ParsedArguments {
        let mut args = ParsedArguments::default();
        args.options
            .insert("crate".into(), crate::cli::args::OptionValue::Str(name.into()));
        args
    }

    #[tokio::test]
    async fn test_dev_build_skips_compression() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        fake_wasm_output(&session, b"\0asm");
        let mut args = with_crate("foo");
        args.flags.dev = true;
        args.toolchain_args = vec!["--flagA".into()];

        build_native(&session.scope(Target::Native), &args).await.unwrap();

        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        let wasm_pack = &invocations[0];
        assert_eq!(wasm_pack.program, "wasm-pack");
        assert_eq!(wasm_pack.cwd, session.paths.native_root);
        assert_eq!(wasm_pack.args.get(7).map(String::as_str), Some("foo"));
        assert_eq!(&wasm_pack.args[8..], ["--dev", "--flagA"]);

        let wasm = &session.paths.wasm;
        assert!(wasm.main.exists());
        assert!(!wasm.raw.exists());
        assert!(!wasm.compressed.exists());
        assert!(fs::read_to_string(&wasm.glue).unwrap().contains("after_load"));
    }

    #[tokio::test]
    async fn test_release_build_compresses_and_checks_budget() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        fake_wasm_output(&session, &[7u8; 4096]);
        let mut args = ParsedArguments::default();
        args.flags.release = true;

        build_native(&session.scope(Target::Native), &args).await.unwrap();

        let invocations = runner.invocations();
        let wasm_pack = &invocations[0];
        assert!(wasm_pack.args.contains(&"ide".to_string()));
        assert_eq!(wasm_pack.args.last().map(String::as_str), Some("--release"));
        assert!(session.paths.wasm.compressed.exists());
    }

    #[tokio::test]
    async fn test_release_build_fails_when_artifact_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _runner) = session(dir.path());

        let err = build_native(&session.scope(Target::Native), &ParsedArguments::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostProcessError>(),
            Some(PostProcessError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_compile_skips_post_processing() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _runner) = session_with(dir.path(), RecordingRunner::new().failing("wasm-pack"));
        fake_wasm_output(&session, b"\0asm");

        assert!(build_native(&session.scope(Target::Native), &ParsedArguments::default())
            .await
            .is_err());
        assert!(session.paths.wasm.raw.exists());
    }

    #[tokio::test]
    async fn test_web_build() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        web(&session.scope(Target::Web), &ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(runner.command_lines(), vec!["npm run build"]);
    }
}

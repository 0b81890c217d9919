// src/cli/handlers/start.rs

use super::build;
use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};

/// Builds the native target in dev mode, whatever the flags say.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move { build::build_native(scope, &args.with_dev(true)).await })
}

/// Launches the web application with the backend location appended to its arguments.
pub fn web<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        let mut start = scope
            .invocation("npm")
            .args(["run", "start", "--"])
            .args(args.app_args.iter().cloned())
            .arg("--backend-path")
            .arg(scope.paths().backend_binary.to_string_lossy());
        if args.flags.dev {
            start = start.arg("--dev");
        }
        scope.run(start).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::context::test_support::session;
    use crate::models::Target;

    #[tokio::test]
    async fn test_start_web_injects_backend_path_after_app_args() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        let mut args = ParsedArguments::default();
        args.app_args = vec!["--port".into(), "8080".into()];
        args.flags.dev = true;

        web(&session.scope(Target::Web), &args).await.unwrap();

        let invocations = runner.invocations();
        let invocation = &invocations[0];
        let backend = session.paths.backend_binary.to_string_lossy().into_owned();
        assert_eq!(
            invocation.args,
            vec!["run", "start", "--", "--port", "8080", "--backend-path", backend.as_str(), "--dev"]
        );
        assert_eq!(invocation.cwd, session.paths.web_root);
    }

    #[tokio::test]
    async fn test_start_native_forces_dev_build() {
        let dir = tempfile::tempdir().unwrap();
        let (session, runner) = session(dir.path());
        let wasm = &session.paths.wasm;
        std::fs::create_dir_all(&wasm.root).unwrap();
        std::fs::write(&wasm.glue, "export default init;").unwrap();
        std::fs::write(&wasm.raw, b"\0asm").unwrap();

        native(&session.scope(Target::Native), &ParsedArguments::default())
            .await
            .unwrap();

        assert!(runner.invocations()[0].args.contains(&"--dev".to_string()));
        assert!(!wasm.compressed.exists());
    }
}

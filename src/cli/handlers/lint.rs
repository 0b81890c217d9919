// src/cli/handlers/lint.rs

use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};

/// Glob handed to prettier by `lint` and `format`.
pub(crate) const WEB_SOURCES: &str = "src/**/*.js";

/// Runs clippy with warnings promoted to errors.
///
/// Toolchain arguments go to cargo, before the `--` that separates clippy's own flags.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        let clippy = scope
            .invocation("cargo")
            .arg("clippy")
            .args(args.toolchain_args.iter().cloned())
            .args(["--", "-D", "warnings"]);
        scope.run(clippy).await
    })
}

pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope
            .run(scope.invocation("npx").args(["prettier", "--check", WEB_SOURCES]))
            .await
    })
}

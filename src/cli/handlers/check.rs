// src/cli/handlers/check.rs

use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};

/// The main handler for the `check` command: compile-without-link validation.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope
            .run_with_toolchain_args(scope.invocation("cargo").arg("check"), args)
            .await
    })
}

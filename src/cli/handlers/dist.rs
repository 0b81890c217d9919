// src/cli/handlers/dist.rs

use super::build;
use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};

/// Release build of the native target; `--dev` is ignored so the size gate always runs.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move { build::build_native(scope, &args.with_dev(false)).await })
}

/// Packages the web application for distribution.
pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move { scope.run(scope.invocation("npm").args(["run", "dist"])).await })
}

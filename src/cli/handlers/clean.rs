// src/cli/handlers/clean.rs

use crate::cli::args::ParsedArguments;
use crate::cli::context::{HandlerFuture, TargetScope};
use crate::core::install_cache;

/// Removes the native build outputs.
pub fn native<'a>(scope: &'a TargetScope<'a>, args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope
            .run_with_toolchain_args(scope.invocation("cargo").arg("clean"), args)
            .await
    })
}

/// Removes the web build outputs and both workspace markers.
pub fn web<'a>(scope: &'a TargetScope<'a>, _args: &'a ParsedArguments) -> HandlerFuture<'a> {
    Box::pin(async move {
        scope.run(scope.invocation("npm").args(["run", "clean"])).await?;
        let paths = scope.paths();
        install_cache::remove_markers(&[
            paths.install_marker.as_path(),
            paths.build_init_marker.as_path(),
        ])
        .await?;
        Ok(())
    })
}

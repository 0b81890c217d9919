// src/cli/handlers/mod.rs

// One module per command. Each exposes a `native` and/or a `web` function matching
// `context::Handler`; the registry decides which of them exist.

pub mod build;
pub mod check;
pub mod clean;
pub mod dist;
pub mod format;
pub mod lint;
pub mod start;
pub mod watch;

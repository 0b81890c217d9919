//! # System Interaction Layer
//!
//! The boundary between orchestration logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns external programs through the [`executor::ProcessRunner`] trait.
//!   The tokio-backed [`executor::SystemRunner`] inherits stdio, captures output when asked,
//!   retries through `cmd /C` on Windows, and owns the background processes started by
//!   `watch` so they are torn down when the orchestrator exits.

pub mod executor;

#[cfg(test)]
pub(crate) mod testing;

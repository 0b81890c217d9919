// src/cli/args.rs

use crate::models::{BuildMode, Platform};
use std::collections::BTreeMap;

/// Declared type and default of a command-specific option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// `--name[=<bool>]`, plus a `--no-name` negation.
    Bool { default: bool },
    /// `--name=<value>`.
    Str { default: Option<&'static str> },
}

/// One entry of a command's extra option schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: OptionKind,
}

/// A parsed command-specific option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Str(String),
}

/// Flags every command understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorFlags {
    /// Run the native target (`--rust`).
    pub rust: bool,
    /// Run the web target (`--js`).
    pub js: bool,
    pub release: bool,
    pub dev: bool,
    /// Explicit `--target`; `None` means the host platform.
    pub target: Option<Platform>,
    /// Start the companion backend during `watch`.
    pub backend: bool,
}

impl Default for OrchestratorFlags {
    fn default() -> Self {
        Self {
            rust: true,
            js: true,
            release: false,
            dev: false,
            target: None,
            backend: true,
        }
    }
}

/// Everything one invocation was asked to do.
///
/// Produced once by the router and passed read-only to the dispatcher and every handler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedArguments {
    /// Canonical command name (aliases already resolved), or the unknown name as typed.
    pub command: String,
    pub flags: OrchestratorFlags,
    /// Command-specific options, with declared defaults filled in.
    pub options: BTreeMap<String, OptionValue>,
    /// Tokens between the first and second `--`, forwarded to the native toolchain.
    pub toolchain_args: Vec<String>,
    /// Tokens after the second `--`, forwarded to the built application.
    pub app_args: Vec<String>,
}

impl ParsedArguments {
    /// Value of a boolean option; `false` when the command does not declare it.
    pub fn option_bool(&self, name: &str) -> bool {
        matches!(self.options.get(name), Some(OptionValue::Bool(true)))
    }

    /// Value of a string option, if given or defaulted.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn target_platform(&self) -> Platform {
        self.flags.target.unwrap_or_else(Platform::current)
    }

    pub fn build_mode(&self) -> BuildMode {
        if self.flags.dev {
            BuildMode::Dev
        } else {
            BuildMode::Release
        }
    }

    /// A copy with the build mode forced, as `start` (dev) and `dist` (release) require.
    pub fn with_dev(&self, dev: bool) -> Self {
        let mut args = self.clone();
        args.flags.dev = dev;
        if dev {
            args.flags.release = false;
        }
        args
    }
}

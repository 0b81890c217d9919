// src/cli/registry.rs

use crate::cli::args::{OptionKind, OptionSpec};
use crate::cli::context::Handler;
use crate::cli::handlers;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{0}' is registered more than once.")]
    DuplicateName(String),
    #[error("Command '{0}' has no handler for any target.")]
    NoHandlers(String),
}

/// The closed set of commands the orchestrator knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Clean,
    Check,
    Build,
    Start,
    Test,
    Lint,
    Format,
    Watch,
    Dist,
}

impl CommandName {
    pub const ALL: [Self; 9] = [
        Self::Clean,
        Self::Check,
        Self::Build,
        Self::Start,
        Self::Test,
        Self::Lint,
        Self::Format,
        Self::Watch,
        Self::Dist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Check => "check",
            Self::Build => "build",
            Self::Start => "start",
            Self::Test => "test",
            Self::Lint => "lint",
            Self::Format => "format",
            Self::Watch => "watch",
            Self::Dist => "dist",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command and its per-target handlers.
///
/// A missing handler means "nothing to do for that target", never an error.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: CommandName,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub native: Option<Handler>,
    pub web: Option<Handler>,
    /// Run both targets concurrently instead of native then web.
    pub parallel: bool,
    pub options: &'static [OptionSpec],
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("native", &self.native.is_some())
            .field("web", &self.web.is_some())
            .field("parallel", &self.parallel)
            .field("options", &self.options)
            .finish()
    }
}

const CRATE_OPTION: OptionSpec = OptionSpec {
    name: "crate",
    help: t!("option.crate"),
    kind: OptionKind::Str { default: None },
};

const BUILD_OPTIONS: &[OptionSpec] = &[CRATE_OPTION];

const TEST_OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "native",
        help: t!("option.test_native"),
        kind: OptionKind::Bool { default: true },
    },
    OptionSpec {
        name: "wasm",
        help: t!("option.test_wasm"),
        kind: OptionKind::Bool { default: true },
    },
];

/// The registry entry for `name`.
pub fn command(name: CommandName) -> Command {
    let base = Command {
        name,
        aliases: &[],
        description: "",
        native: None,
        web: None,
        parallel: false,
        options: &[],
    };
    match name {
        CommandName::Clean => Command {
            description: t!("command.clean"),
            native: Some(handlers::clean::native),
            web: Some(handlers::clean::web),
            ..base
        },
        CommandName::Check => Command {
            description: t!("command.check"),
            native: Some(handlers::check::native),
            ..base
        },
        CommandName::Build => Command {
            description: t!("command.build"),
            native: Some(handlers::build::native),
            web: Some(handlers::build::web),
            options: BUILD_OPTIONS,
            ..base
        },
        CommandName::Start => Command {
            description: t!("command.start"),
            native: Some(handlers::start::native),
            web: Some(handlers::start::web),
            options: BUILD_OPTIONS,
            ..base
        },
        CommandName::Test => Command {
            description: t!("command.test"),
            native: Some(handlers::test::native),
            options: TEST_OPTIONS,
            ..base
        },
        CommandName::Lint => Command {
            description: t!("command.lint"),
            native: Some(handlers::lint::native),
            web: Some(handlers::lint::web),
            ..base
        },
        CommandName::Format => Command {
            aliases: &["fmt", "toml-fmt"],
            description: t!("command.format"),
            native: Some(handlers::format::native),
            web: Some(handlers::format::web),
            ..base
        },
        CommandName::Watch => Command {
            description: t!("command.watch"),
            native: Some(handlers::watch::native),
            web: Some(handlers::watch::web),
            parallel: true,
            options: BUILD_OPTIONS,
            ..base
        },
        CommandName::Dist => Command {
            description: t!("command.dist"),
            native: Some(handlers::dist::native),
            web: Some(handlers::dist::web),
            options: BUILD_OPTIONS,
            ..base
        },
    }
}

/// Every registered command, in help order.
pub fn commands() -> impl Iterator<Item = Command> {
    CommandName::ALL.into_iter().map(command)
}

/// Looks a command up by name or alias.
pub fn find_command(name: &str) -> Option<Command> {
    commands().find(|cmd| cmd.name.as_str() == name || cmd.aliases.contains(&name))
}

/// Checks the registry for clashing names and handler-less commands.
pub fn validate() -> Result<(), RegistryError> {
    let mut seen = HashSet::new();
    for cmd in commands() {
        for name in std::iter::once(cmd.name.as_str()).chain(cmd.aliases.iter().copied()) {
            if !seen.insert(name) {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
        }
        if cmd.native.is_none() && cmd.web.is_none() {
            return Err(RegistryError::NoHandlers(cmd.name.to_string()));
        }
    }
    Ok(())
}

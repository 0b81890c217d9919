// src/cli/router.rs

use crate::cli::args::{OptionKind, OptionSpec, OptionValue, OrchestratorFlags, ParsedArguments};
use crate::cli::registry;
use crate::constants::ARG_DELIMITER;
use crate::models::Platform;
use clap::builder::styling::AnsiColor;
use clap::builder::{BoolishValueParser, PossibleValuesParser, Str, Styles, TypedValueParser};
use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

const BIN_NAME: &str = "duet";

#[derive(Error, Debug)]
pub enum ParseError {
    /// Unknown flags, malformed values, and `--help`/`--version` requests.
    #[error(transparent)]
    Clap(#[from] clap::Error),
    #[error("No command given.")]
    MissingCommand,
}

/// The raw token sequence cut at the first two `--` delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    /// The command name and its flags.
    pub own: &'a [String],
    pub toolchain: &'a [String],
    /// Everything after the second delimiter, further `--` tokens included.
    pub app: &'a [String],
}

/// Splits `tokens` on the first two delimiter tokens.
pub fn split_segments(tokens: &[String]) -> Segments<'_> {
    let mut parts = tokens.splitn(3, |token| token == ARG_DELIMITER);
    Segments {
        own: parts.next().unwrap_or_default(),
        toolchain: parts.next().unwrap_or_default(),
        app: parts.next().unwrap_or_default(),
    }
}

/// A boolean flag shared by every command.
struct GlobalFlag {
    id: &'static str,
    aliases: &'static [&'static str],
    help: &'static str,
}

const GLOBAL_FLAGS: &[GlobalFlag] = &[
    GlobalFlag {
        id: "rust",
        aliases: &["native"],
        help: t!("flag.rust"),
    },
    GlobalFlag {
        id: "js",
        aliases: &["web"],
        help: t!("flag.js"),
    },
    GlobalFlag {
        id: "release",
        aliases: &[],
        help: t!("flag.release"),
    },
    GlobalFlag {
        id: "dev",
        aliases: &[],
        help: t!("flag.dev"),
    },
    GlobalFlag {
        id: "backend",
        aliases: &[],
        help: t!("flag.backend"),
    },
];

fn negation(name: &str) -> String {
    format!("no-{}", name)
}

/// `--<id>[=<bool>]` plus its hidden `--no-<id>` counterpart.
fn bool_args(id: &'static str, aliases: &[&'static str], help: &'static str) -> [Arg; 2] {
    let value = Arg::new(id)
        .long(id)
        .visible_aliases(aliases.iter().copied())
        .help(help)
        .value_name("BOOL")
        .value_parser(BoolishValueParser::new())
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .action(ArgAction::Set);
    let negated = Arg::new(negation(id))
        .long(negation(id))
        .aliases(aliases.iter().map(|alias| negation(alias)))
        .action(ArgAction::SetTrue)
        .conflicts_with(id)
        .hide(true);
    [value, negated]
}

fn option_args(spec: &OptionSpec) -> Vec<Arg> {
    match spec.kind {
        OptionKind::Bool { .. } => bool_args(spec.name, &[], spec.help).into(),
        OptionKind::Str { default } => {
            let mut arg = Arg::new(spec.name)
                .long(spec.name)
                .help(spec.help)
                .value_name("VALUE")
                .num_args(1);
            if let Some(default) = default {
                arg = arg.default_value(default);
            }
            vec![arg]
        }
    }
}

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Yellow.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Green.on_default())
}

/// The parser for one command: global flags plus the command's own options.
///
/// A global flag alias is dropped when an option claims the same name, which is how
/// `test --native` stays the test sub-flag instead of meaning `--rust`.
fn command_parser(name: impl Into<Str>, options: &[OptionSpec]) -> Command {
    let claimed: Vec<String> = options
        .iter()
        .flat_map(|spec| [spec.name.to_string(), negation(spec.name)])
        .collect();
    let is_free = |name: &&'static str| !claimed.iter().any(|c| c == name);

    let mut command = Command::new(name).styles(styles());
    for flag in GLOBAL_FLAGS {
        let aliases: Vec<&'static str> = flag.aliases.iter().copied().filter(is_free).collect();
        command = command.args(bool_args(flag.id, &aliases, flag.help));
    }
    command = command.arg(
        Arg::new("target")
            .long("target")
            .value_name("PLATFORM")
            .help(t!("flag.target"))
            .value_parser(
                PossibleValuesParser::new(Platform::ALL.map(Platform::as_str))
                    .try_map(|value| value.parse::<Platform>()),
            ),
    );
    command
        .args(options.iter().flat_map(option_args))
        .mut_arg("dev", |arg| arg.conflicts_with("release"))
}

/// Renders the semantic tags of the help template into ANSI styles.
fn render_help_template(template: &str) -> String {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();
    let style = |code: &'static str| if use_colors { code } else { "" };

    let title = style("\x1b[1;33m");
    let hl = style("\x1b[1;36m");
    let cmd = style("\x1b[36m");
    let dim = style("\x1b[2m");
    let reset = style("\x1b[0m");

    template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset)
}

/// The top-level parser: one subcommand per registered command.
///
/// Unregistered names are accepted as external subcommands so that the invocation-wide
/// state steps still run before the dispatcher reports them.
pub fn root_parser() -> Command {
    Command::new(BIN_NAME)
        .version(clap::crate_version!())
        .about(t!("cli.about"))
        .help_template(render_help_template(t!("cli.help.template")))
        .styles(styles())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .allow_external_subcommands(true)
        .external_subcommand_value_parser(clap::value_parser!(String))
        .subcommands(registry::commands().map(|cmd| {
            command_parser(cmd.name.as_str(), cmd.options)
                .about(cmd.description)
                .visible_aliases(cmd.aliases.iter().copied())
        }))
}

fn bool_value(matches: &ArgMatches, id: &str, default: bool) -> bool {
    if matches.get_flag(&negation(id)) {
        return false;
    }
    matches.get_one::<bool>(id).copied().unwrap_or(default)
}

fn extract(
    command: String,
    matches: &ArgMatches,
    options: &[OptionSpec],
    segments: Segments<'_>,
) -> ParsedArguments {
    let defaults = OrchestratorFlags::default();
    let flags = OrchestratorFlags {
        rust: bool_value(matches, "rust", defaults.rust),
        js: bool_value(matches, "js", defaults.js),
        release: bool_value(matches, "release", defaults.release),
        dev: bool_value(matches, "dev", defaults.dev),
        target: matches.get_one::<Platform>("target").copied(),
        backend: bool_value(matches, "backend", defaults.backend),
    };

    let options = options
        .iter()
        .filter_map(|spec| {
            let value = match spec.kind {
                OptionKind::Bool { default } => Some(OptionValue::Bool(bool_value(matches, spec.name, default))),
                OptionKind::Str { .. } => matches.get_one::<String>(spec.name).cloned().map(OptionValue::Str),
            };
            value.map(|value| (spec.name.to_string(), value))
        })
        .collect();

    ParsedArguments {
        command,
        flags,
        options,
        toolchain_args: segments.toolchain.to_vec(),
        app_args: segments.app.to_vec(),
    }
}

/// Turns the raw arguments (program name excluded) into [`ParsedArguments`].
///
/// Only the segment before the first delimiter is interpreted; the passthrough segments
/// are copied verbatim.
pub fn parse(raw: &[String]) -> Result<ParsedArguments, ParseError> {
    let segments = split_segments(raw);
    let tokens = std::iter::once(BIN_NAME).chain(segments.own.iter().map(String::as_str));
    let matches = root_parser().try_get_matches_from(tokens)?;

    let (name, sub_matches) = matches.subcommand().ok_or(ParseError::MissingCommand)?;
    let parsed = match registry::find_command(name) {
        Some(cmd) => extract(cmd.name.as_str().to_string(), sub_matches, cmd.options, segments),
        None => {
            // Unknown command: still honor the global flags, `--target` in particular.
            let rest: Vec<String> = sub_matches
                .get_many::<String>("")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            let generic = command_parser(name.to_string(), &[])
                .no_binary_name(true)
                .try_get_matches_from(rest)?;
            extract(name.to_string(), &generic, &[], segments)
        }
    };
    log::debug!("Parsed arguments: {:?}", parsed);
    Ok(parsed)
}

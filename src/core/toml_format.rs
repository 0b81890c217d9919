// src/core/toml_format.rs

use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into while looking for configuration files.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

/// Outcome of a formatting pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormatSummary {
    pub found: usize,
    pub rewritten: Vec<PathBuf>,
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Every `*.toml` file below `root`, sorted for a stable processing order.
pub fn find_toml_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = entry.with_context(|| format!("Failed to walk '{}'", root.display()))?;
        let is_toml = entry.path().extension().is_some_and(|ext| ext == "toml");
        if entry.file_type().is_file() && is_toml {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Where a line ends relative to TOML multi-line strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringState {
    Outside,
    /// Inside `"""`.
    Basic,
    /// Inside `'''`.
    Literal,
}

/// Index just past a closing delimiter at `at`. Up to two extra quotes belong to the value.
fn past_closing(bytes: &[u8], at: usize, quote: u8) -> usize {
    let run = bytes[at..].iter().take(5).take_while(|&&b| b == quote).count();
    at + run
}

/// Index just past a single-line string whose body starts at `from`.
fn past_inline(bytes: &[u8], mut from: usize, quote: u8, escapes: bool) -> usize {
    while from < bytes.len() {
        match bytes[from] {
            b'\\' if escapes => from += 2,
            b if b == quote => return from + 1,
            _ => from += 1,
        }
    }
    bytes.len()
}

/// Carries `state` across one line and returns the state at its end.
fn scan_line(line: &str, mut state: StringState) -> StringState {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        match state {
            StringState::Outside if rest.starts_with(b"\"\"\"") => {
                state = StringState::Basic;
                i += 3;
            }
            StringState::Outside if rest.starts_with(b"'''") => {
                state = StringState::Literal;
                i += 3;
            }
            StringState::Outside => match bytes[i] {
                b'#' => break,
                b'"' => i = past_inline(bytes, i + 1, b'"', true),
                b'\'' => i = past_inline(bytes, i + 1, b'\'', false),
                _ => i += 1,
            },
            StringState::Basic if bytes[i] == b'\\' => i += 2,
            StringState::Basic if rest.starts_with(b"\"\"\"") => {
                i = past_closing(bytes, i, b'"');
                state = StringState::Outside;
            }
            StringState::Literal if rest.starts_with(b"'''") => {
                i = past_closing(bytes, i, b'\'');
                state = StringState::Outside;
            }
            StringState::Basic | StringState::Literal => i += 1,
        }
    }
    state
}

/// Normalizes the layout of a TOML document without touching its values:
/// `\n` line endings, no trailing whitespace, at most one consecutive blank line,
/// no leading blank lines and exactly one final newline.
///
/// Lines inside multi-line strings are kept as they are.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;
    let mut state = StringState::Outside;
    for line in text.lines() {
        let starts_inside = state != StringState::Outside;
        state = scan_line(line, state);
        let line = if state == StringState::Outside {
            line.trim_end()
        } else {
            line
        };
        if line.is_empty() && !starts_inside {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Formats one file in place. Returns `true` when the file content changed.
///
/// # Errors
/// Fails if the file cannot be read or written, if it is not valid TOML, or if
/// normalizing it would change any of its values.
pub fn format_file(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let before = text
        .parse::<toml::Table>()
        .with_context(|| format!("'{}' is not valid TOML", path.display()))?;

    let formatted = normalize(&text);
    if formatted == text {
        return Ok(false);
    }
    let after = formatted
        .parse::<toml::Table>()
        .with_context(|| format!("Normalizing '{}' produced invalid TOML", path.display()))?;
    ensure!(
        before == after,
        "Refusing to rewrite '{}': normalizing would change its values",
        path.display()
    );
    fs::write(path, formatted).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(true)
}

/// Formats every TOML file under `root`.
pub fn format_tree(root: &Path) -> Result<FormatSummary> {
    let files = find_toml_files(root)?;
    let mut summary = FormatSummary {
        found: files.len(),
        ..FormatSummary::default()
    };
    for file in files {
        log::debug!("Formatting '{}'", file.display());
        if format_file(&file)? {
            summary.rewritten.push(file);
        }
    }
    Ok(summary)
}

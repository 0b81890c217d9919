// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- TARGETS & PLATFORMS ---

/// One of the two independently built halves of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The compiled target, built with cargo / wasm-pack.
    Native,
    /// The JavaScript front-end, built with npm.
    Web,
}

impl Target {
    /// Human readable label used in console output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The closed set of platforms a distribution can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "macos")]
    MacOs,
    #[serde(rename = "win")]
    Windows,
}

impl Platform {
    /// Every supported identifier, in the order shown by `--help`.
    pub const ALL: [Self; 3] = [Self::Linux, Self::MacOs, Self::Windows];

    /// The platform this binary is running on. Unknown unix flavours count as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// The identifier written to the build state file and accepted by `--target`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "win",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<_> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("'{}' is not a supported platform (expected one of: {})", s, valid.join(", "))
            })
    }
}

/// How the native target is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Fast, unoptimized build. Skips compression and the size gate.
    Dev,
    /// Optimized build subject to the artifact size budget.
    Release,
}

impl BuildMode {
    pub fn is_dev(self) -> bool {
        matches!(self, Self::Dev)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dev => "dev",
            Self::Release => "release",
        })
    }
}

// --- PERSISTED STATE ---

/// The record persisted in `<dist>/build.json`.
///
/// Keys this tool does not own are kept in `extra` so a rewrite never drops them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildState {
    pub target: Platform,
    pub build_version: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BuildState {
    /// Returns `true` when the record already describes `target` at `build_version`.
    pub fn matches(&self, target: Platform, build_version: &str) -> bool {
        self.target == target && self.build_version == build_version
    }
}

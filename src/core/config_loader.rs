//! # Config Loader
//!
//! Locates the project root and reads the optional `duet.toml` found there. Every field
//! is optional: a project without the file gets the conventional layout
//! (`src/rust`, `src/js`, `dist`) and the default artifact size budget.
use crate::constants::{
    DEFAULT_CRATE, DEFAULT_OUT_NAME, DEFAULT_SIZE_BUDGET_MB, PROJECT_CONFIG_FILENAME, ROOT_ENV_VAR,
};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

// --- `duet.toml` MODELS ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NativeSection {
    /// Root of the cargo workspace, relative to the project root.
    pub root: String,
    pub default_crate: String,
    pub out_name: String,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            root: "src/rust".to_string(),
            default_crate: DEFAULT_CRATE.to_string(),
            out_name: DEFAULT_OUT_NAME.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WebSection {
    pub root: String,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            root: "src/js".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DistSection {
    pub root: String,
    pub size_budget_mb: f64,
}

impl Default for DistSection {
    fn default() -> Self {
        Self {
            root: "dist".to_string(),
            size_budget_mb: DEFAULT_SIZE_BUDGET_MB,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BackendSection {
    /// The npm package whose `build` script fetches the backend binary.
    pub package: String,
    /// The backend executable, without the platform extension.
    pub binary: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            package: "src/js/lib/project-manager".to_string(),
            binary: "dist/bin/project-manager/bin/project-manager".to_string(),
        }
    }
}

/// Represents the deserialized structure of a `duet.toml` file.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub native: NativeSection,
    pub web: WebSection,
    pub dist: DistSection,
    pub backend: BackendSection,
}

impl ProjectConfig {
    fn validate(self) -> Result<Self, ConfigError> {
        let budget = self.dist.size_budget_mb;
        if !budget.is_finite() || budget <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "dist.size_budget_mb",
                reason: format!("expected a positive number of MiB, got {}", budget),
            });
        }
        if self.native.default_crate.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "native.default_crate",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses configuration text. Exposed separately from [`load`] for tests.
pub fn parse(text: &str, path: &Path) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()
}

/// Loads `<root>/duet.toml`, or the defaults when the file does not exist.
pub fn load(root: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = root.join(PROJECT_CONFIG_FILENAME);
    match fs::read_to_string(&path) {
        Ok(text) => {
            log::debug!("Loading project configuration from '{}'", path.display());
            parse(&text, &path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No '{}' found, using the default layout.", PROJECT_CONFIG_FILENAME);
            Ok(ProjectConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

/// Finds the project root.
///
/// `DUET_ROOT` wins when set. Otherwise the nearest ancestor of `start` holding a
/// `duet.toml` is used, and `start` itself when none does.
pub fn locate_root(start: &Path) -> PathBuf {
    if let Some(root) = env::var_os(ROOT_ENV_VAR) {
        let root = PathBuf::from(root);
        log::debug!("Project root pinned by {}: '{}'", ROOT_ENV_VAR, root.display());
        return dunce::simplified(&root).to_path_buf();
    }
    discover_root(start)
}

fn discover_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_CONFIG_FILENAME).is_file())
        .unwrap_or(start)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(dir.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.native.default_crate, "ide");
        assert_eq!(config.dist.size_budget_mb, 4.28);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let text = r#"
            [native]
            root = "rust"

            [dist]
            size_budget_mb = 6.5
        "#;
        let config = parse(text, Path::new("duet.toml")).unwrap();
        assert_eq!(config.native.root, "rust");
        assert_eq!(config.native.default_crate, "ide");
        assert_eq!(config.web.root, "src/js");
        assert_eq!(config.dist.size_budget_mb, 6.5);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = parse("[native]\nrot = 'typo'\n", Path::new("duet.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_non_positive_budget_is_rejected() {
        let result = parse("[dist]\nsize_budget_mb = 0.0\n", Path::new("duet.toml"));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "dist.size_budget_mb", .. })));
    }

    #[test]
    fn test_discover_root_walks_up_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();
        let nested = dir.path().join("src").join("rust");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_root(&nested), dir.path());
    }

    #[test]
    fn test_discover_root_falls_back_to_start() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_root(dir.path()), dir.path());
    }
}

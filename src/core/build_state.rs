// src/core/build_state.rs

use crate::models::{BuildState, Platform};
use crate::system::executor::{ExecutionError, Invocation, ProcessRunner};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildStateError {
    #[error("Could not determine the build version from git: {0}")]
    VersionQuery(#[source] ExecutionError),
    #[error("git returned an empty revision for '{0}'")]
    EmptyRevision(PathBuf),
    #[error("Filesystem error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize the build state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What an existing record holds: a state this tool understands, or only keys to carry over.
enum Recorded {
    State(BuildState),
    Foreign(Map<String, Value>),
}

/// Keeps `<dist>/build.json` in sync with the target platform and the current revision.
///
/// The file is only written when its content would change; downstream tools key their
/// caches on its modification time.
pub struct BuildStateTracker<'a> {
    state_path: &'a Path,
    init_marker: &'a Path,
    repo_root: &'a Path,
    runner: &'a dyn ProcessRunner,
}

impl<'a> BuildStateTracker<'a> {
    pub fn new(
        state_path: &'a Path,
        init_marker: &'a Path,
        repo_root: &'a Path,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            state_path,
            init_marker,
            repo_root,
            runner,
        }
    }

    /// Short revision of the commit checked out in the repository.
    pub async fn current_build_version(&self) -> Result<String, BuildStateError> {
        let query = Invocation::new("git", self.repo_root).args(["rev-parse", "--short", "HEAD"]);
        let output = self
            .runner
            .capture(&query)
            .await
            .map_err(BuildStateError::VersionQuery)?;
        let revision = output.trim();
        if revision.is_empty() {
            return Err(BuildStateError::EmptyRevision(self.repo_root.to_path_buf()));
        }
        Ok(revision.to_string())
    }

    /// Brings the persisted record up to date. Returns `true` if the file was written.
    pub async fn reconcile(&self, target: Platform) -> Result<bool, BuildStateError> {
        let build_version = self.current_build_version().await?;

        let extra = match self.read().await? {
            Some(Recorded::State(state)) if state.matches(target, &build_version) => {
                log::debug!(
                    "Build state is current ({} @ {}), leaving '{}' untouched.",
                    target,
                    build_version,
                    self.state_path.display()
                );
                self.ensure_init_marker().await?;
                return Ok(false);
            }
            Some(Recorded::State(state)) => state.extra,
            Some(Recorded::Foreign(mut keys)) => {
                keys.remove("target");
                keys.remove("buildVersion");
                keys
            }
            None => Map::new(),
        };

        let state = BuildState {
            target,
            build_version,
            extra,
        };
        self.write(&state).await?;
        self.ensure_init_marker().await?;
        Ok(true)
    }

    /// Reads the current record. A missing record is `None`, and so is one that is not a
    /// JSON object, which then gets rewritten.
    async fn read(&self) -> Result<Option<Recorded>, BuildStateError> {
        let bytes = match tokio::fs::read(self.state_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(BuildStateError::Io {
                    path: self.state_path.to_path_buf(),
                    source,
                });
            }
        };
        if let Ok(state) = serde_json::from_slice::<BuildState>(&bytes) {
            return Ok(Some(Recorded::State(state)));
        }
        match serde_json::from_slice::<Map<String, Value>>(&bytes) {
            Ok(keys) => {
                log::warn!(
                    "Unrecognized build state in '{}', it will be rewritten.",
                    self.state_path.display()
                );
                Ok(Some(Recorded::Foreign(keys)))
            }
            Err(e) => {
                log::warn!(
                    "Ignoring malformed build state '{}': {}",
                    self.state_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn write(&self, state: &BuildState) -> Result<(), BuildStateError> {
        if let Some(parent) = self.state_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BuildStateError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let json = serde_json::to_string_pretty(state)?;
        log::debug!("Writing build state to '{}': {}", self.state_path.display(), json);
        tokio::fs::write(self.state_path, json)
            .await
            .map_err(|source| BuildStateError::Io {
                path: self.state_path.to_path_buf(),
                source,
            })
    }

    /// Recreates the init marker when it is missing, e.g. after `clean`.
    async fn ensure_init_marker(&self) -> Result<(), BuildStateError> {
        if tokio::fs::try_exists(self.init_marker).await.unwrap_or(false) {
            return Ok(());
        }
        tokio::fs::write(self.init_marker, b"")
            .await
            .map_err(|source| BuildStateError::Io {
                path: self.init_marker.to_path_buf(),
                source,
            })
    }
}

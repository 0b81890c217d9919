// src/core/install_cache.rs

use crate::system::executor::{ExecutionError, Invocation, ProcessRunner};
use colored::Colorize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Installing web dependencies failed: {0}")]
    Install(#[source] ExecutionError),
    #[error("Filesystem error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the web dependency installation at most once per workspace state.
///
/// The marker file's presence means "installed"; `clean` removes it.
pub struct DependencyInstallCache<'a> {
    marker: &'a Path,
    web_root: &'a Path,
    runner: &'a dyn ProcessRunner,
}

impl<'a> DependencyInstallCache<'a> {
    pub fn new(marker: &'a Path, web_root: &'a Path, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            marker,
            web_root,
            runner,
        }
    }

    /// Installs dependencies unless the marker exists. Returns `true` if an install ran.
    pub async fn ensure_installed(&self) -> Result<bool, InstallError> {
        let installed = tokio::fs::try_exists(self.marker)
            .await
            .map_err(|source| self.io_error(self.marker, source))?;
        if installed {
            log::debug!("Install marker '{}' present, skipping install.", self.marker.display());
            return Ok(false);
        }

        println!("{}", t!("install.info.installing").cyan());
        let install = Invocation::new("npm", self.web_root).arg("install");
        println!("{} {}", "→".blue(), install.command_line().green());
        self.runner
            .run(&install)
            .await
            .map_err(InstallError::Install)?;

        if let Some(parent) = self.marker.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(parent, source))?;
        }
        tokio::fs::write(self.marker, b"")
            .await
            .map_err(|source| self.io_error(self.marker, source))?;
        Ok(true)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> InstallError {
        InstallError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Deletes sentinel files, treating already-absent files as success.
///
/// Each path is handled independently so a missing first marker never keeps the second
/// one around.
pub async fn remove_markers(markers: &[&Path]) -> Result<(), InstallError> {
    for marker in markers {
        match tokio::fs::remove_file(marker).await {
            Ok(()) => log::debug!("Removed marker '{}'", marker.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Marker '{}' already absent", marker.display());
            }
            Err(source) => {
                return Err(InstallError::Io {
                    path: marker.to_path_buf(),
                    source,
                });
            }
        }
    }
    Ok(())
}

// src/core/post_processor.rs

use crate::core::paths::WasmPaths;
use crate::models::BuildMode;
use colored::Colorize;
use flate2::{Compression, write::GzEncoder};
use regex::Regex;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Error, Debug)]
pub enum PostProcessError {
    #[error("Output file size exceeds the limit ({size_mb}MB > {limit_mb}MB).")]
    SizeBudgetExceeded { size_mb: f64, limit_mb: f64 },
    #[error("Filesystem error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Compression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PostProcessError + '_ {
    move |source| PostProcessError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// --- Glue patching ---

/// Result of running a [`GluePatcher`] over the generated glue code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub code: String,
    /// Names of substitutions whose pattern matched nothing.
    pub unmatched: Vec<&'static str>,
}

/// Rewrites the JavaScript glue emitted by the native toolchain.
///
/// Kept behind a trait so the workaround can be dropped once the toolchain is fixed
/// upstream without touching the rest of the pipeline.
pub trait GluePatcher: Send + Sync {
    fn patch(&self, code: &str) -> PatchReport;
}

#[derive(Debug)]
struct Substitution {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

/// Workaround for wasm-pack glue that fetches and instantiates the module itself
/// (rustwasm/wasm-pack#790). The loader instantiates the module, so the glue must only
/// return its import table and expose `after_load` to receive the instance.
#[derive(Debug)]
pub struct WasmPackGluePatcher {
    substitutions: Vec<Substitution>,
    trailer: &'static str,
}

impl WasmPackGluePatcher {
    pub fn new() -> Result<Self, regex::Error> {
        let table: [(&'static str, &'static str, &'static str); 3] = [
            (
                "url-fetch branch",
                r"(?s)if \(\(typeof URL.*\}\);",
                "return imports",
            ),
            (
                "module detection branch",
                r"(?s)if \(typeof module.*let result",
                "let result",
            ),
            (
                "default export",
                r"export default init;",
                "export default init",
            ),
        ];
        let substitutions = table
            .into_iter()
            .map(|(name, pattern, replacement)| {
                Ok(Substitution {
                    name,
                    pattern: Regex::new(pattern)?,
                    replacement,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            substitutions,
            trailer: "\nexport function after_load(w,m) { wasm = w; init.__wbindgen_wasm_module = m;}",
        })
    }
}

impl GluePatcher for WasmPackGluePatcher {
    fn patch(&self, code: &str) -> PatchReport {
        let mut code = code.to_string();
        let mut unmatched = Vec::new();
        for sub in &self.substitutions {
            if sub.pattern.is_match(&code) {
                code = sub
                    .pattern
                    .replace_all(&code, regex::NoExpand(sub.replacement))
                    .into_owned();
            } else {
                unmatched.push(sub.name);
            }
        }
        code.push_str(self.trailer);
        PatchReport { code, unmatched }
    }
}

// --- Size budget ---

/// Converts a byte count to mebibytes, rounded to two decimals.
pub fn size_in_mb(bytes: u64) -> f64 {
    (100.0 * bytes as f64 / BYTES_PER_MB).round() / 100.0
}

/// Fails when `bytes`, expressed in rounded mebibytes, exceeds `limit_mb`.
pub fn check_size_budget(bytes: u64, limit_mb: f64) -> Result<f64, PostProcessError> {
    let size_mb = size_in_mb(bytes);
    if size_mb > limit_mb {
        return Err(PostProcessError::SizeBudgetExceeded { size_mb, limit_mb });
    }
    Ok(size_mb)
}

// --- Pipeline ---

/// Runs the steps that follow a successful native build.
///
/// Patching and renaming always run; compression and the size gate only in release mode.
pub struct ArtifactPostProcessor<'a> {
    paths: &'a WasmPaths,
    limit_mb: f64,
    patcher: &'a dyn GluePatcher,
}

impl<'a> ArtifactPostProcessor<'a> {
    pub fn new(paths: &'a WasmPaths, limit_mb: f64, patcher: &'a dyn GluePatcher) -> Self {
        Self {
            paths,
            limit_mb,
            patcher,
        }
    }

    /// Returns the compressed size in MiB for release builds, `None` for dev builds.
    pub async fn process(&self, mode: BuildMode) -> Result<Option<f64>, PostProcessError> {
        self.patch_glue().await?;
        self.publish().await?;
        if mode.is_dev() {
            return Ok(None);
        }

        println!("{}", t!("build.info.compressing").cyan());
        self.compress().await?;

        println!("{}", t!("build.info.checking_size").cyan());
        self.enforce_budget().await.map(Some)
    }

    pub async fn patch_glue(&self) -> Result<(), PostProcessError> {
        let glue = &self.paths.glue;
        let code = tokio::fs::read_to_string(glue).await.map_err(io_error(glue))?;
        let report = self.patcher.patch(&code);
        for name in &report.unmatched {
            log::warn!(
                "Glue substitution '{}' matched nothing in '{}'; the toolchain output may have changed.",
                name,
                glue.display()
            );
        }
        tokio::fs::write(glue, report.code).await.map_err(io_error(glue))
    }

    /// Moves the raw toolchain output to its canonical published name.
    pub async fn publish(&self) -> Result<(), PostProcessError> {
        tokio::fs::rename(&self.paths.raw, &self.paths.main)
            .await
            .map_err(io_error(&self.paths.raw))
    }

    pub async fn compress(&self) -> Result<(), PostProcessError> {
        let source = self.paths.main.clone();
        let target = self.paths.compressed.clone();
        tokio::task::spawn_blocking(move || gzip_file(&source, &target)).await?
    }

    pub async fn enforce_budget(&self) -> Result<f64, PostProcessError> {
        let compressed = &self.paths.compressed;
        let metadata = tokio::fs::metadata(compressed)
            .await
            .map_err(io_error(compressed))?;
        let size_mb = check_size_budget(metadata.len(), self.limit_mb)?;
        log::debug!("Compressed artifact is {}MB (limit {}MB)", size_mb, self.limit_mb);
        Ok(size_mb)
    }
}

fn gzip_file(source: &Path, target: &Path) -> Result<(), PostProcessError> {
    let input = File::open(source).map_err(io_error(source))?;
    let output = File::create(target).map_err(io_error(target))?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut BufReader::new(input), &mut encoder).map_err(io_error(target))?;
    encoder
        .finish()
        .and_then(|mut writer| writer.flush())
        .map_err(io_error(target))
}

// src/core/paths.rs

use crate::constants::{
    BUILD_INFO_FILENAME, BUILD_INIT_MARKER_FILENAME, INSTALL_MARKER_FILENAME, WASM_DIR,
};
use crate::core::config_loader::{ConfigError, ProjectConfig};
use std::path::{Path, PathBuf};

/// Files produced by the native toolchain inside `<dist>/wasm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmPaths {
    pub root: PathBuf,
    /// Generated JavaScript glue (`<name>.js`).
    pub glue: PathBuf,
    /// Raw binary as emitted by the toolchain (`<name>_bg.wasm`).
    pub raw: PathBuf,
    /// Canonical published name (`<name>.wasm`).
    pub main: PathBuf,
    /// Compressed sibling of `main` (`<name>.wasm.gz`).
    pub compressed: PathBuf,
}

/// Every location the orchestrator reads or writes, resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub native_root: PathBuf,
    pub web_root: PathBuf,
    pub dist_root: PathBuf,
    pub build_info: PathBuf,
    pub install_marker: PathBuf,
    pub build_init_marker: PathBuf,
    pub wasm: WasmPaths,
    pub backend_package: PathBuf,
    pub backend_binary: PathBuf,
}

impl ProjectPaths {
    /// Resolves the layout described by `config` under `root`.
    ///
    /// # Errors
    /// Returns an error if a configured path references an undefined environment variable.
    pub fn resolve(root: &Path, config: &ProjectConfig) -> Result<Self, ConfigError> {
        let root = dunce::simplified(root).to_path_buf();
        let native_root = resolve_path(&root, "native.root", &config.native.root)?;
        let web_root = resolve_path(&root, "web.root", &config.web.root)?;
        let dist_root = resolve_path(&root, "dist.root", &config.dist.root)?;
        let backend_package = resolve_path(&root, "backend.package", &config.backend.package)?;
        let mut backend_binary = resolve_path(&root, "backend.binary", &config.backend.binary)?;
        if cfg!(target_os = "windows") && backend_binary.extension().is_none() {
            backend_binary.set_extension("exe");
        }

        let name = &config.native.out_name;
        let wasm_root = dist_root.join(WASM_DIR);
        let wasm = WasmPaths {
            glue: wasm_root.join(format!("{}.js", name)),
            raw: wasm_root.join(format!("{}_bg.wasm", name)),
            main: wasm_root.join(format!("{}.wasm", name)),
            compressed: wasm_root.join(format!("{}.wasm.gz", name)),
            root: wasm_root,
        };

        let paths = Self {
            build_info: dist_root.join(BUILD_INFO_FILENAME),
            install_marker: dist_root.join(INSTALL_MARKER_FILENAME),
            build_init_marker: dist_root.join(BUILD_INIT_MARKER_FILENAME),
            root,
            native_root,
            web_root,
            dist_root,
            wasm,
            backend_package,
            backend_binary,
        };
        log::debug!("Resolved project paths: {:?}", paths);
        Ok(paths)
    }
}

/// Expands `~` and environment variables, then anchors relative results at `root`.
fn resolve_path(root: &Path, key: &'static str, template: &str) -> Result<PathBuf, ConfigError> {
    let expanded = shellexpand::full(template).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    let path = PathBuf::from(expanded.as_ref());
    Ok(if path.is_absolute() {
        path
    } else {
        root.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let root = Path::new("/work/project");
        let paths = ProjectPaths::resolve(root, &ProjectConfig::default()).unwrap();
        assert_eq!(paths.native_root, root.join("src/rust"));
        assert_eq!(paths.web_root, root.join("src/js"));
        assert_eq!(paths.build_info, root.join("dist").join("build.json"));
        assert_eq!(paths.install_marker, root.join("dist").join("init"));
        assert_eq!(paths.wasm.glue, root.join("dist").join("wasm").join("ide.js"));
        assert_eq!(paths.wasm.raw, root.join("dist").join("wasm").join("ide_bg.wasm"));
        assert_eq!(paths.wasm.compressed, root.join("dist").join("wasm").join("ide.wasm.gz"));
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let mut config = ProjectConfig::default();
        config.dist.root = "/var/tmp/out".to_string();
        let paths = ProjectPaths::resolve(Path::new("/work"), &config).unwrap();
        assert_eq!(paths.dist_root, PathBuf::from("/var/tmp/out"));
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let mut config = ProjectConfig::default();
        config.web.root = "$DUET_SURELY_UNDEFINED_VAR_1234/js".to_string();
        let result = ProjectPaths::resolve(Path::new("/work"), &config);
        assert!(matches!(result, Err(ConfigError::Invalid { key: "web.root", .. })));
    }
}

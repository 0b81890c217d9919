// src/constants.rs

/// The name of the optional project configuration file (at the project root).
pub const PROJECT_CONFIG_FILENAME: &str = "duet.toml";

/// Environment variable that pins the project root, bypassing discovery.
pub const ROOT_ENV_VAR: &str = "DUET_ROOT";

/// Token separating orchestrator flags, toolchain arguments and application arguments.
pub const ARG_DELIMITER: &str = "--";

/// The crate built when `--crate` is not given and the config does not override it.
pub const DEFAULT_CRATE: &str = "ide";

/// Base name of the produced artifact files (`<name>.js`, `<name>.wasm`, ...).
pub const DEFAULT_OUT_NAME: &str = "ide";

/// Maximum size of the compressed artifact, in mebibytes.
pub const DEFAULT_SIZE_BUDGET_MB: f64 = 4.28;

/// Persisted build state record (inside the build-output root).
pub const BUILD_INFO_FILENAME: &str = "build.json";

/// Sentinel marking web dependencies as installed (inside the build-output root).
pub const INSTALL_MARKER_FILENAME: &str = "init";

/// Sentinel marking the build state as initialized (inside the build-output root).
pub const BUILD_INIT_MARKER_FILENAME: &str = "build-init";

/// Directory (inside the build-output root) receiving the native toolchain output.
pub const WASM_DIR: &str = "wasm";

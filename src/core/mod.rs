// src/core/mod.rs

pub mod build_state;
pub mod config_loader;
pub mod install_cache;
pub mod paths;
pub mod post_processor;
pub mod toml_format;

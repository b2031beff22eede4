//! Subcommand implementations.

pub mod completion;
pub mod create;
pub mod inspect;
pub mod template;
pub mod validate;

use crate::error::add_package_context;
use anyhow::Result;
use dias_core::PackagerConfig;
use std::path::Path;

/// Loads `--config` if given, then applies `DIAS_*` environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<PackagerConfig> {
    let config = match path {
        Some(path) => add_package_context(PackagerConfig::from_toml_file(path), path)?,
        None => PackagerConfig::default(),
    };
    Ok(config.apply_env_overrides())
}

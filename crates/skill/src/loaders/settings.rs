//! Runtime settings loader.

use std::path::Path;

use logic_graph::RuntimeSettings;

use crate::loaders::{LoadResult, read_file};

/// Loader for runtime settings from TOML files.
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<RuntimeSettings> {
        let content = read_file(path)?;
        RuntimeSettings::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse settings TOML at {}: {}", path.display(), e)
        })
    }
}

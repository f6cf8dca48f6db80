//! Content loaders for reading skill data from files.
//!
//! Settings are TOML, the skill catalog and the scripts are RON.

pub mod content;
pub mod scripts;
pub mod settings;
pub mod skills;

pub use content::{Content, ContentLoader};
pub use scripts::ScriptLoader;
pub use settings::SettingsLoader;
pub use skills::SkillLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

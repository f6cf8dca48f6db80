//! Skill catalog loader.

use std::collections::BTreeSet;
use std::path::Path;

use crate::data::{SkillCatalog, SkillData};
use crate::loaders::{LoadResult, read_file};

/// Loader for the skill catalog from RON files.
pub struct SkillLoader;

impl SkillLoader {
    /// Load the skill catalog from a RON file.
    ///
    /// Fails on duplicate skill ids.
    pub fn load(path: &Path) -> LoadResult<Vec<SkillData>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<SkillData>> {
        let catalog: SkillCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse skill catalog RON: {}", e))?;

        let mut seen = BTreeSet::new();
        for skill in &catalog.skills {
            if !seen.insert(skill.id) {
                anyhow::bail!("Duplicate {} ({}) in skill catalog", skill.id, skill.name);
            }
        }
        Ok(catalog.skills)
    }
}

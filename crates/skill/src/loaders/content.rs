//! Content loader for a whole skill data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use logic_graph::{NodeRegistry, RuntimeSettings};
use tracing::{info, warn};

use crate::data::SkillData;
use crate::library::ScriptLibrary;
use crate::loaders::{LoadResult, ScriptLoader, SettingsLoader, SkillLoader};

/// Everything a host needs to run skills.
#[derive(Debug)]
pub struct Content {
    pub settings: RuntimeSettings,
    pub skills: Vec<Arc<SkillData>>,
    pub scripts: ScriptLibrary,
}

impl Content {
    pub fn skill(&self, name: &str) -> Option<&Arc<SkillData>> {
        self.skills.iter().find(|skill| skill.name == name)
    }
}

/// Loads all skill content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── settings.toml
/// ├── skills.ron
/// └── scripts/
///     ├── fireball.ron
///     └── mend.ron
/// ```
pub struct ContentLoader {
    data_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load runtime settings from `settings.toml`, or defaults when the
    /// file is absent.
    pub fn load_settings(&self) -> LoadResult<RuntimeSettings> {
        let path = self.data_dir.join("settings.toml");
        if !path.exists() {
            return Ok(RuntimeSettings::default());
        }
        SettingsLoader::load(&path)
    }

    /// Load the skill catalog from `skills.ron`.
    pub fn load_skills(&self) -> LoadResult<Vec<SkillData>> {
        SkillLoader::load(&self.data_dir.join("skills.ron"))
    }

    /// Load scripts from `scripts/`.
    pub fn load_scripts(&self, registry: &NodeRegistry) -> LoadResult<ScriptLibrary> {
        ScriptLoader::load_dir(&self.data_dir.join("scripts"), registry)
    }

    /// Load settings, skills and scripts. Skills whose script did not load
    /// are kept and reported; casting them fails.
    pub fn load(&self, registry: &NodeRegistry) -> LoadResult<Content> {
        let settings = self.load_settings()?;
        let skills: Vec<Arc<SkillData>> =
            self.load_skills()?.into_iter().map(Arc::new).collect();
        let scripts = self.load_scripts(registry)?;

        for skill in skills.iter().filter(|skill| !scripts.contains(&skill.script)) {
            warn!(
                target: "skill::loaders",
                skill = %skill.id,
                script = %skill.script,
                "skill references a missing script"
            );
        }
        info!(
            target: "skill::loaders",
            dir = %self.data_dir.display(),
            skills = skills.len(),
            scripts = scripts.len(),
            "content loaded"
        );

        Ok(Content {
            settings,
            skills,
            scripts,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

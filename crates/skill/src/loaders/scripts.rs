//! Script loader.
//!
//! Each script is one RON file holding a `ConfigElement` tree. The file
//! stem is the script name.

use std::path::{Path, PathBuf};

use logic_graph::{ConfigParser, NodeRegistry, Script};
use tracing::{debug, error};

use crate::library::ScriptLibrary;
use crate::loaders::{LoadResult, read_file};

/// Loader for logic-graph scripts from RON files.
pub struct ScriptLoader;

impl ScriptLoader {
    /// Load and validate a single script against `registry`.
    pub fn load(path: &Path, registry: &NodeRegistry) -> LoadResult<Script> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid script file name {}", path.display()))?;
        let content = read_file(path)?;
        ConfigParser::new(registry)
            .parse_script_str(name, &content)
            .map_err(|e| anyhow::anyhow!("Failed to parse script {}: {}", path.display(), e))
    }

    /// Load every `*.ron` script in `dir`.
    ///
    /// A script that fails to load is logged and left out; the others are
    /// still returned. Only an unreadable directory is an error.
    pub fn load_dir(dir: &Path, registry: &NodeRegistry) -> LoadResult<ScriptLibrary> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            anyhow::anyhow!("Failed to read script directory {}: {}", dir.display(), e)
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        paths.sort();

        let mut library = ScriptLibrary::new();
        for path in paths {
            match Self::load(&path, registry) {
                Ok(script) => {
                    debug!(target: "skill::loaders", script = script.name(), "script loaded");
                    library.insert(script);
                }
                Err(err) => {
                    error!(target: "skill::loaders", path = %path.display(), %err, "script skipped");
                }
            }
        }
        Ok(library)
    }
}

//! Parsed scripts keyed by name.

use std::collections::BTreeMap;

use logic_graph::Script;

/// Scripts shared by every caster of a host. Loaded once, read-only after.
#[derive(Clone, Debug, Default)]
pub struct ScriptLibrary {
    scripts: BTreeMap<String, Script>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `script` under its own name, returning the script it replaced.
    pub fn insert(&mut self, script: Script) -> Option<Script> {
        self.scripts.insert(script.name().to_string(), script)
    }

    pub fn with(mut self, script: Script) -> Self {
        self.insert(script);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scripts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

//! Per-execution variable environment (blackboard).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::{Value, VarType};

/// Named, typed variables owned by one agent.
///
/// Reads are two-step: [`has`](Self::has) checks presence with the declared
/// type, [`get`](Self::get) performs the typed read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarEnv {
    vars: HashMap<String, Value>,
}

impl VarEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with<T: VarType>(mut self, id: impl Into<String>, value: T) -> Self {
        self.set(id, value);
        self
    }

    /// Returns true if `id` is present and holds a `T`.
    pub fn has<T: VarType>(&self, id: &str) -> bool {
        self.vars.get(id).is_some_and(|v| v.kind() == T::KIND)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vars.contains_key(id)
    }

    pub fn get<T: VarType>(&self, id: &str) -> Option<T> {
        self.vars.get(id).and_then(T::from_value)
    }

    pub fn get_value(&self, id: &str) -> Option<&Value> {
        self.vars.get(id)
    }

    /// Sets `id`, replacing any previous value regardless of its type.
    pub fn set<T: VarType>(&mut self, id: impl Into<String>, value: T) {
        self.vars.insert(id.into(), value.into_value());
    }

    pub fn set_value(&mut self, id: impl Into<String>, value: Value) {
        self.vars.insert(id.into(), value);
    }

    pub fn remove(&mut self, id: &str) -> Option<Value> {
        self.vars.remove(id)
    }

    /// Merges `other` into this environment; `other` wins on conflicts.
    pub fn extend(&mut self, other: VarEnv) {
        self.vars.extend(other.vars);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for VarEnv {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EntityId;

    #[test]
    fn presence_is_checked_by_type() {
        let vars = VarEnv::new().with("hp", 10).with("target", EntityId(4));

        assert!(vars.has::<i32>("hp"));
        assert!(!vars.has::<f32>("hp"));
        assert!(!vars.has::<i32>("mp"));
        assert_eq!(vars.get::<EntityId>("target"), Some(EntityId(4)));
        assert_eq!(vars.get::<i64>("hp"), None);
    }

    #[test]
    fn set_replaces_across_types() {
        let mut vars = VarEnv::new().with("x", 1);
        vars.set("x", "one".to_string());
        assert_eq!(vars.get::<String>("x").as_deref(), Some("one"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn extend_prefers_incoming() {
        let mut vars = VarEnv::new().with("a", 1).with("b", 2);
        vars.extend(VarEnv::new().with("b", 3).with("c", true));

        assert_eq!(vars.get::<i32>("a"), Some(1));
        assert_eq!(vars.get::<i32>("b"), Some(3));
        assert_eq!(vars.get::<bool>("c"), Some(true));
    }

    #[test]
    fn deserializes_from_ron_map() {
        let vars: VarEnv = ron::from_str(r#"{ "hp": Int(5), "name": Str("orc") }"#).unwrap();
        assert_eq!(vars.get::<i32>("hp"), Some(5));
        assert_eq!(vars.get::<String>("name").as_deref(), Some("orc"));
    }
}

//! Node type registry.
//!
//! Maps type names used in markup to config constructors, runtime node
//! constructors and categories. Built once at startup and shared through an
//! `Arc` by the config parser and every node factory.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::category::NodeCategory;
use crate::config::NodeConfig;
use crate::error::RegistryError;
use crate::node::AnyNode;

/// Constructs an empty config body for a registered type.
pub type ConfigCtor = Arc<dyn Fn() -> Box<dyn NodeConfig> + Send + Sync>;

/// Allocates an uninitialized runtime node for a registered type.
pub type NodeCtor = Arc<dyn Fn() -> AnyNode + Send + Sync>;

/// A runtime node type that can be registered under its own name.
pub trait RegisteredNode: 'static {
    const TYPE_NAME: &'static str;
    const CATEGORY: NodeCategory;

    type Config: NodeConfig + Default;

    /// Allocates an uninitialized instance.
    fn instantiate() -> AnyNode;
}

#[derive(Clone)]
struct NodeEntry {
    category: NodeCategory,
    implementation: TypeId,
    new_config: ConfigCtor,
    new_node: NodeCtor,
}

/// Catalog of node types available to scripts.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, NodeEntry>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in node type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtins(&mut registry);
        registry
    }

    /// Registers `N` under its own type name.
    pub fn register<N: RegisteredNode>(&mut self) -> Result<(), RegistryError> {
        self.register_with(
            N::TYPE_NAME,
            N::CATEGORY,
            TypeId::of::<N>(),
            Arc::new(|| Box::new(N::Config::default()) as Box<dyn NodeConfig>),
            Arc::new(N::instantiate),
        )
    }

    /// Registers a type from explicit constructors.
    ///
    /// Re-registering a name with the same implementation is a no-op. A
    /// different implementation is reported and the first registration kept.
    pub fn register_with(
        &mut self,
        name: &str,
        category: NodeCategory,
        implementation: TypeId,
        new_config: ConfigCtor,
        new_node: NodeCtor,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.entries.get(name) {
            if existing.implementation == implementation && existing.category == category {
                return Ok(());
            }
            warn!(
                target: "logic_graph::registry",
                name,
                "node type registered twice with different implementations, keeping the first"
            );
            return Err(RegistryError::DuplicateType {
                name: name.to_string(),
            });
        }

        debug!(target: "logic_graph::registry", name, %category, "registered node type");
        self.entries.insert(
            name.to_string(),
            NodeEntry {
                category,
                implementation,
                new_config,
                new_node,
            },
        );
        Ok(())
    }

    /// Returns a fresh config body for `name`, or `None` if unregistered.
    pub fn create_config_instance(&self, name: &str) -> Option<Box<dyn NodeConfig>> {
        self.entries.get(name).map(|entry| (entry.new_config)())
    }

    /// Allocates an uninitialized runtime node for `name`.
    pub fn instantiate(&self, name: &str) -> Option<AnyNode> {
        self.entries.get(name).map(|entry| (entry.new_node)())
    }

    /// Category of `name`; [`NodeCategory::Unknown`] if unregistered.
    pub fn category(&self, name: &str) -> NodeCategory {
        self.entries
            .get(name)
            .map(|entry| entry.category)
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

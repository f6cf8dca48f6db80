//! Immutable node configurations.
//!
//! A config is parsed once from a [`ConfigElement`] (or built in code) and
//! then shared by every runtime node created from it, across agents.

mod element;
mod parser;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use element::{ConfigElement, ROLE_BHV, ROLE_CONDITION, ROLE_EXIT_BHV};
pub use parser::ConfigParser;

use crate::category::NodeCategory;
use crate::error::ConfigResult;
use crate::registry::RegisteredNode;

/// Type-erasure helpers for config bodies.
pub trait ConfigAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> ConfigAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Body of a node config.
///
/// `parse` fills a default-constructed config from markup. Child configs are
/// parsed through `parser` so that their category is validated against the
/// slot they fill.
pub trait NodeConfig: ConfigAny + fmt::Debug {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()>;
}

/// A parsed config together with the registered type it instantiates.
#[derive(Clone, Debug)]
pub struct SharedConfig {
    type_name: Arc<str>,
    category: NodeCategory,
    body: Arc<dyn NodeConfig>,
}

impl SharedConfig {
    pub fn new<C: NodeConfig>(
        type_name: impl Into<Arc<str>>,
        category: NodeCategory,
        body: C,
    ) -> Self {
        Self::from_parts(type_name, category, Arc::new(body))
    }

    pub fn from_parts(
        type_name: impl Into<Arc<str>>,
        category: NodeCategory,
        body: Arc<dyn NodeConfig>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            category,
            body,
        }
    }

    /// Config for the statically known node type `N`.
    pub fn of<N: RegisteredNode>(body: N::Config) -> Self {
        Self::new(N::TYPE_NAME, N::CATEGORY, body)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn body(&self) -> &dyn NodeConfig {
        &*self.body
    }

    pub fn downcast_ref<T: NodeConfig>(&self) -> Option<&T> {
        ConfigAny::as_any(&*self.body).downcast_ref()
    }

    /// Shared handle to the body as its concrete type.
    pub fn downcast<T: NodeConfig>(&self) -> Option<Arc<T>> {
        ConfigAny::into_any(Arc::clone(&self.body)).downcast().ok()
    }
}

/// A named, parsed script: the root config of one agent tree.
#[derive(Clone, Debug)]
pub struct Script {
    name: String,
    root: SharedConfig,
}

impl Script {
    pub fn new(name: impl Into<String>, root: SharedConfig) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &SharedConfig {
        &self.root
    }
}

use std::sync::Arc;

use tracing::{error, warn};

use super::{ConfigElement, Script, SharedConfig};
use crate::category::NodeCategory;
use crate::error::{ConfigError, ConfigResult};
use crate::registry::NodeRegistry;

/// Builds [`SharedConfig`] trees from markup, validating child categories
/// against the registry.
#[derive(Clone, Copy)]
pub struct ConfigParser<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> ConfigParser<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r NodeRegistry {
        self.registry
    }

    /// Parses `element` as whatever type its tag names.
    ///
    /// Unregistered tags are a recoverable miss: they are logged and yield
    /// `None` so the caller can skip the entry.
    pub fn parse(&self, element: &ConfigElement) -> ConfigResult<Option<SharedConfig>> {
        let Some(mut body) = self.registry.create_config_instance(&element.tag) else {
            warn!(
                target: "logic_graph::config",
                tag = %element.tag,
                "unregistered node type, entry skipped"
            );
            return Ok(None);
        };

        body.parse(element, self)?;
        Ok(Some(SharedConfig::from_parts(
            element.tag.as_str(),
            self.registry.category(&element.tag),
            Arc::from(body),
        )))
    }

    /// Parses `element` to fill slot `role` of `owner`, which expects
    /// `expected`. A category mismatch is fatal.
    pub fn parse_expect(
        &self,
        owner: &ConfigElement,
        role: &str,
        element: &ConfigElement,
        expected: NodeCategory,
    ) -> ConfigResult<Option<SharedConfig>> {
        let actual = self.registry.category(&element.tag);
        if actual != NodeCategory::Unknown && !actual.satisfies(expected) {
            let err = ConfigError::CategoryMismatch {
                tag: owner.tag.clone(),
                role: role.to_string(),
                expected,
                found: element.tag.clone(),
                actual,
            };
            error!(target: "logic_graph::config", %err, "script rejected");
            return Err(err);
        }
        self.parse(element)
    }

    /// Parses the element in role wrapper `role` of `owner`, if present.
    pub fn parse_role(
        &self,
        owner: &ConfigElement,
        role: &str,
        expected: NodeCategory,
    ) -> ConfigResult<Option<SharedConfig>> {
        match owner.role(role)? {
            Some(element) => self.parse_expect(owner, role, element, expected),
            None => Ok(None),
        }
    }

    /// Like [`parse_role`](Self::parse_role) but the slot must end up filled.
    pub fn parse_required_role(
        &self,
        owner: &ConfigElement,
        role: &'static str,
        expected: NodeCategory,
    ) -> ConfigResult<SharedConfig> {
        self.parse_role(owner, role, expected)?.ok_or_else(|| {
            let err = ConfigError::MissingChild {
                tag: owner.tag.clone(),
                role,
            };
            error!(target: "logic_graph::config", %err, "script rejected");
            err
        })
    }

    /// Parses every non-role child of `owner` as an `expected` entry.
    /// Unregistered entries are skipped.
    pub fn parse_list(
        &self,
        owner: &ConfigElement,
        expected: NodeCategory,
    ) -> ConfigResult<Vec<SharedConfig>> {
        let mut configs = Vec::new();
        for element in owner.entries() {
            if let Some(config) = self.parse_expect(owner, expected.as_ref(), element, expected)? {
                configs.push(config);
            }
        }
        Ok(configs)
    }

    /// Parses a script root. Unlike nested entries, an unregistered root is
    /// fatal: there would be nothing left to run.
    pub fn parse_script(&self, name: &str, root: &ConfigElement) -> ConfigResult<Script> {
        match self.parse(root) {
            Ok(Some(config)) => Ok(Script::new(name, config)),
            Ok(None) => {
                let err = ConfigError::UnknownRoot(root.tag.clone());
                error!(target: "logic_graph::config", script = name, %err, "script rejected");
                Err(err)
            }
            Err(err) => {
                error!(target: "logic_graph::config", script = name, %err, "script rejected");
                Err(err)
            }
        }
    }

    /// Parses a script from RON markup text.
    pub fn parse_script_str(&self, name: &str, text: &str) -> ConfigResult<Script> {
        let root = ConfigElement::from_ron(text)?;
        self.parse_script(name, &root)
    }
}

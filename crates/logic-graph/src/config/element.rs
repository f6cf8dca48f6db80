//! Markup element tree scripts are written in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::value::{ValueConfig, VarType};

/// Role wrapper holding a config's behavior.
pub const ROLE_BHV: &str = "Bhv";
/// Role wrapper holding a state's exit behavior.
pub const ROLE_EXIT_BHV: &str = "ExitBhv";
/// Role wrapper holding a condition.
pub const ROLE_CONDITION: &str = "Condition";

const ROLES: [&str; 3] = [ROLE_BHV, ROLE_EXIT_BHV, ROLE_CONDITION];

/// One markup element: a tag naming a registered node type, ordered string
/// attributes and ordered child elements.
///
/// ```text
/// (
///     tag: "StateTransition",
///     attrs: [("TrueStateID", "cast"), ("CheckOnTick", "0.5")],
///     children: [
///         (tag: "Condition", children: [(tag: "TriggerCond", attrs: [("Tag", "OnReleaseSkill")])]),
///     ],
/// )
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigElement {
    pub tag: String,
    #[serde(default)]
    pub attrs: Vec<(String, String)>,
    #[serde(default)]
    pub children: Vec<ConfigElement>,
}

impl ConfigElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: ConfigElement) -> Self {
        self.children.push(child);
        self
    }

    /// Wraps `child` in the role element `role`.
    pub fn with_role(self, role: &str, child: ConfigElement) -> Self {
        self.with_child(ConfigElement::new(role).with_child(child))
    }

    pub fn from_ron(text: &str) -> ConfigResult<Self> {
        ron::from_str(text).map_err(|e| ConfigError::Format(e.to_string()))
    }

    /// Returns true if this element is one of the role wrappers.
    pub fn is_role(&self) -> bool {
        ROLES.contains(&self.tag.as_str())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attr(&self, name: &'static str) -> ConfigResult<&str> {
        self.attr(name).ok_or_else(|| ConfigError::MissingAttribute {
            tag: self.tag.clone(),
            attr: name,
        })
    }

    /// Parses an optional attribute with `FromStr`.
    pub fn parse_attr<T: FromStr>(
        &self,
        name: &str,
        expected: &'static str,
    ) -> ConfigResult<Option<T>> {
        self.attr(name)
            .map(|text| {
                text.trim()
                    .parse()
                    .map_err(|_| self.invalid_literal(name, text, expected))
            })
            .transpose()
    }

    /// Reads an optional [`ValueConfig`] attribute; absent means `default`.
    pub fn value<T: VarType>(&self, name: &str, default: T) -> ConfigResult<ValueConfig<T>> {
        match self.attr(name) {
            None => Ok(ValueConfig::literal(default)),
            Some(text) => ValueConfig::parse(text, default)
                .ok_or_else(|| self.invalid_literal(name, text, T::KIND.name())),
        }
    }

    /// Reads a required [`ValueConfig`] attribute. A variable binding falls
    /// back to `T::default()`.
    pub fn required_value<T: VarType + Default>(
        &self,
        name: &'static str,
    ) -> ConfigResult<ValueConfig<T>> {
        let text = self.required_attr(name)?;
        ValueConfig::parse(text, T::default())
            .ok_or_else(|| self.invalid_literal(name, text, T::KIND.name()))
    }

    /// Returns the single element inside role wrapper `role`, if present.
    ///
    /// A repeated wrapper, or one that does not hold exactly one element, is
    /// an error.
    pub fn role(&self, role: &str) -> ConfigResult<Option<&ConfigElement>> {
        let mut wrappers = self.children.iter().filter(|c| c.tag == role);
        let Some(wrapper) = wrappers.next() else {
            return Ok(None);
        };

        let repeated = wrappers.count();
        if repeated > 0 || wrapper.children.len() != 1 {
            return Err(ConfigError::RoleArity {
                tag: self.tag.clone(),
                role: role.to_string(),
                count: if repeated > 0 {
                    repeated + 1
                } else {
                    wrapper.children.len()
                },
            });
        }
        Ok(wrapper.children.first())
    }

    /// Fails on any role wrapper other than `allowed`.
    pub fn only_roles(&self, allowed: &[&str]) -> ConfigResult<()> {
        match self
            .children
            .iter()
            .find(|c| c.is_role() && !allowed.contains(&c.tag.as_str()))
        {
            Some(stray) => Err(self.invalid(format!("unexpected role `{}`", stray.tag))),
            None => Ok(()),
        }
    }

    /// Child elements that are not role wrappers, in declared order.
    pub fn entries(&self) -> impl Iterator<Item = &ConfigElement> {
        self.children.iter().filter(|c| !c.is_role())
    }

    pub fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            tag: self.tag.clone(),
            message: message.into(),
        }
    }

    fn invalid_literal(&self, name: &str, text: &str, expected: &'static str) -> ConfigError {
        ConfigError::InvalidLiteral {
            tag: self.tag.clone(),
            attr: name.to_string(),
            value: text.to_string(),
            expected,
        }
    }
}

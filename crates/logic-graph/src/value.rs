//! Typed values and constant-or-variable parameter bindings.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::NodeContext;
use crate::host::EntityId;
use crate::var_env::VarEnv;

/// Attribute prefix marking a blackboard variable reference (`BB#hp`).
pub const VAR_PREFIX: &str = "BB#";

/// A value stored in a [`VarEnv`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Str(String),
    Entity(EntityId),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Entity(_) => ValueKind::Entity,
        }
    }

    /// Numeric view used by comparisons. `None` for strings and entities.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(v) => Some(f64::from(*v)),
            Value::Long(v) => Some(*v as f64),
            Value::Float(v) => Some(f64::from(*v)),
            Value::Str(_) | Value::Entity(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Entity(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    String => Str,
    EntityId => Entity,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

/// Declared type of a variable, as written in markup (`Type="int"`).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Float,
    #[strum(to_string = "string", serialize = "str")]
    Str,
    Entity,
}

impl ValueKind {
    /// Markup name of this kind.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Parses `text` as a literal of this kind.
    pub fn parse_literal(self, text: &str) -> Option<Value> {
        match self {
            ValueKind::Bool => bool::parse_literal(text).map(Value::Bool),
            ValueKind::Int => i32::parse_literal(text).map(Value::Int),
            ValueKind::Long => i64::parse_literal(text).map(Value::Long),
            ValueKind::Float => f32::parse_literal(text).map(Value::Float),
            ValueKind::Str => String::parse_literal(text).map(Value::Str),
            ValueKind::Entity => EntityId::parse_literal(text).map(Value::Entity),
        }
    }
}

/// Rust types that can live in a [`VarEnv`] and be bound by a [`ValueConfig`].
///
/// Lookups are strict: an `Int` variable is not visible as `f32`.
pub trait VarType: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;

    fn into_value(self) -> Value;

    /// Parses a markup literal. Surrounding whitespace is ignored.
    fn parse_literal(text: &str) -> Option<Self>;
}

macro_rules! impl_var_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl VarType for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn parse_literal(text: &str) -> Option<Self> {
                    text.trim().parse().ok()
                }
            }
        )*
    };
}

impl_var_type! {
    i32 => Int,
    i64 => Long,
    f32 => Float,
}

impl VarType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn parse_literal(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl VarType for String {
    const KIND: ValueKind = ValueKind::Str;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    /// Strings are taken verbatim.
    fn parse_literal(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl VarType for EntityId {
    const KIND: ValueKind = ValueKind::Entity;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Entity(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Entity(self)
    }

    /// Accepts `12` and `#12`.
    fn parse_literal(text: &str) -> Option<Self> {
        let text = text.trim();
        text.strip_prefix('#')
            .unwrap_or(text)
            .parse()
            .ok()
            .map(EntityId)
    }
}

/// A node parameter that is either a literal or a blackboard reference.
///
/// A bound variable wins when the node's [`VarEnv`] holds it with the
/// declared type; otherwise the literal default is used.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueConfig<T> {
    default: T,
    var: Option<String>,
}

impl<T: VarType> ValueConfig<T> {
    pub fn literal(value: T) -> Self {
        Self {
            default: value,
            var: None,
        }
    }

    pub fn variable(id: impl Into<String>, default: T) -> Self {
        Self {
            default,
            var: Some(id.into()),
        }
    }

    /// Parses a markup attribute value.
    ///
    /// `BB#<id>` binds to variable `<id>` with `default` as fallback; any
    /// other text must parse as a literal of `T`. Returns `None` for an
    /// empty variable id or an unparsable literal.
    pub fn parse(text: &str, default: T) -> Option<Self> {
        match text.trim().strip_prefix(VAR_PREFIX) {
            Some(id) if id.is_empty() => None,
            Some(id) => Some(Self::variable(id, default)),
            None => T::parse_literal(text).map(Self::literal),
        }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn var_id(&self) -> Option<&str> {
        self.var.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.var.is_some()
    }

    /// Resolves against `vars`: presence check first, then a typed read.
    pub fn resolve(&self, vars: &VarEnv) -> T {
        let Some(id) = self.var.as_deref() else {
            return self.default.clone();
        };
        if !vars.has::<T>(id) {
            match vars.get_value(id) {
                Some(found) => warn!(
                    target: "logic_graph::value",
                    var = id,
                    expected = %T::KIND,
                    found = %found.kind(),
                    "variable has another type, using default"
                ),
                None => warn!(
                    target: "logic_graph::value",
                    var = id,
                    kind = %T::KIND,
                    "variable not set, using default"
                ),
            }
            return self.default.clone();
        }
        vars.get::<T>(id).unwrap_or_else(|| self.default.clone())
    }

    /// Resolves against the executing node's variable environment.
    pub fn get_value(&self, ctx: &NodeContext) -> T {
        self.resolve(ctx.vars())
    }
}

impl<T: VarType + Default> Default for ValueConfig<T> {
    fn default() -> Self {
        Self::literal(T::default())
    }
}

impl<T: VarType> From<T> for ValueConfig<T> {
    fn from(value: T) -> Self {
        Self::literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_int_resolves_from_env() {
        let hp = ValueConfig::<i32>::parse("BB#hp", 7).unwrap();
        assert_eq!(hp.var_id(), Some("hp"));

        let vars = VarEnv::new().with("hp", 42);
        assert_eq!(hp.resolve(&vars), 42);
    }

    #[test]
    fn missing_variable_falls_back_to_default() {
        let hp = ValueConfig::<i32>::parse("BB#hp", 7).unwrap();
        assert_eq!(hp.resolve(&VarEnv::new()), 7);
    }

    #[test]
    fn mistyped_variable_falls_back_to_default() {
        let hp = ValueConfig::<i32>::parse("BB#hp", 7).unwrap();
        let vars = VarEnv::new().with("hp", 42.0f32);
        assert_eq!(hp.resolve(&vars), 7);
    }

    #[test]
    fn literals_parse_with_their_type() {
        assert_eq!(
            ValueConfig::<f32>::parse(" 1.5 ", 0.0),
            Some(ValueConfig::literal(1.5))
        );
        assert_eq!(
            ValueConfig::<i64>::parse("9000000000", 0),
            Some(ValueConfig::literal(9_000_000_000))
        );
        assert_eq!(
            ValueConfig::<String>::parse("hello", String::new())
                .map(|v| v.resolve(&VarEnv::new())),
            Some("hello".to_string())
        );
        assert!(ValueConfig::<i32>::parse("1.5", 0).is_none());
        assert!(ValueConfig::<i32>::parse("BB#", 0).is_none());
    }

    #[test]
    fn entity_literals() {
        assert_eq!(EntityId::parse_literal("#12"), Some(EntityId(12)));
        assert_eq!(EntityId::parse_literal("3"), Some(EntityId(3)));
        assert_eq!(EntityId::parse_literal("x"), None);
    }

    #[test]
    fn kinds_parse_from_markup_names() {
        assert_eq!("int".parse::<ValueKind>().ok(), Some(ValueKind::Int));
        assert_eq!("string".parse::<ValueKind>().ok(), Some(ValueKind::Str));
        assert_eq!("Float".parse::<ValueKind>().ok(), Some(ValueKind::Float));
        assert_eq!(
            ValueKind::Bool.parse_literal("TRUE"),
            Some(Value::Bool(true))
        );
    }
}

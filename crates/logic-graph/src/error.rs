//! Error types for the logic-graph runtime.
//!
//! Errors follow the three failure classes of the runtime:
//!
//! - **Load-time** ([`ConfigError`], [`RegistryError`]): structurally invalid
//!   scripts. Loading of the affected script is aborted.
//! - **Lookup misses**: unregistered types, absent variables, unknown state
//!   ids. These never surface as errors during a tick; they are logged and
//!   degrade to a no-op.
//! - **Instantiation** ([`NodeError`], [`AgentError`]): a runtime tree could
//!   not be built from an otherwise valid config.

use std::path::PathBuf;

use thiserror::Error;

use crate::NodeCategory;

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type NodeResult<T> = Result<T, NodeError>;

/// Fatal configuration error reported while loading a script.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("<{tag}> is missing required attribute `{attr}`")]
    MissingAttribute { tag: String, attr: &'static str },

    #[error("<{tag}> attribute `{attr}` = {value:?} is not a valid {expected}")]
    InvalidLiteral {
        tag: String,
        attr: String,
        value: String,
        expected: &'static str,
    },

    #[error("<{tag}> expects {expected} in `{role}`, found <{found}> ({actual})")]
    CategoryMismatch {
        tag: String,
        role: String,
        expected: NodeCategory,
        found: String,
        actual: NodeCategory,
    },

    #[error("<{tag}> is missing required child `{role}`")]
    MissingChild { tag: String, role: &'static str },

    #[error("<{tag}> `{role}` must hold exactly one element, found {count}")]
    RoleArity {
        tag: String,
        role: String,
        count: usize,
    },

    #[error("script root <{0}> is not a registered node type")]
    UnknownRoot(String),

    #[error("<{tag}> declares state `{id}` more than once")]
    DuplicateStateId { tag: String, id: String },

    #[error("<{tag}> initial state `{id}` is not declared")]
    UnknownInitialState { tag: String, id: String },

    #[error("<{tag}> {message}")]
    Invalid { tag: String, message: String },

    #[error("malformed script markup: {0}")]
    Format(String),

    #[error("failed to read script {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inconsistent node registration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node type `{name}` is already registered with a different implementation")]
    DuplicateType { name: String },
}

/// A runtime node could not be initialized from its config.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("{node} cannot be initialized from a <{found}> config")]
    ConfigType { node: &'static str, found: String },

    #[error("{node} could not create its required `{role}` child")]
    MissingChild {
        node: &'static str,
        role: &'static str,
    },
}

/// An agent could not be built for a script.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("root <{type_name}> of script `{script}` could not be instantiated")]
    RootCreation { script: String, type_name: String },

    #[error("root <{type_name}> of script `{script}` is not a behavior")]
    RootNotBehavior { script: String, type_name: String },
}

//! Data-driven logic graph runtime for skill and AI scripts.
//!
//! Scripts are trees of node configs, parsed once from markup (or built in
//! code) and shared by every runtime instance. An [`Agent`] builds a private
//! runtime tree from a script and ticks it with a frame delta time.
//!
//! - **Behaviors** run across ticks and report the part of `dt` they did not
//!   consume, so a sequence can finish several short steps in one tick.
//! - **Conditions** evaluate to a boolean; some of them tick or latch on
//!   events and agent triggers.
//! - **FSMs** run one state at a time. A state ticks its behavior and
//!   evaluates its outgoing transitions only once that behavior is done.
//!
//! # Architecture
//!
//! - [`NodeRegistry`]: type name to config constructor, node constructor
//!   and [`NodeCategory`]
//! - [`ConfigParser`]: markup to [`SharedConfig`] with category validation
//! - [`NodeFactory`]: sole allocator of runtime nodes, one per agent
//! - [`NodeContext`]: what every node sees (owner, [`VarEnv`], host services)
//! - [`Agent`]: owns the root behavior, forwards triggers, disposes the tree

pub mod agent;
pub mod behavior;
pub mod builder;
pub mod category;
pub mod composite;
pub mod condition;
pub mod config;
pub mod context;
pub mod decorator;
pub mod error;
pub mod events;
pub mod factory;
pub mod fsm;
pub mod host;
pub mod node;
pub mod nodes;
pub mod registry;
pub mod settings;
pub mod status;
pub mod value;
pub mod var_env;

pub use agent::Agent;
pub use behavior::{BehaviorLogic, BehaviorNode, Bhv, FiniteTime, FiniteTimeLogic};
pub use category::NodeCategory;
pub use condition::{Cond, ConditionLogic, ConditionNode};
pub use config::{ConfigElement, ConfigParser, NodeConfig, Script, SharedConfig};
pub use context::{AgentEnv, NodeContext};
pub use error::{AgentError, ConfigError, ConfigResult, NodeError, NodeResult, RegistryError};
pub use events::{EventBus, GameEvent};
pub use factory::NodeFactory;
pub use fsm::{Fsm, FsmBhv, StateNode, StateTransitionNode};
pub use host::{
    EntityAccess, EntityFlags, EntityId, EntityRecord, MemoryEntities, Position, ProcessTag,
};
pub use node::{AnyNode, CustomNode};
pub use registry::{NodeRegistry, RegisteredNode};
pub use settings::RuntimeSettings;
pub use status::Lifecycle;
pub use value::{Value, ValueConfig, ValueKind, VarType};
pub use var_env::VarEnv;

//! Runtime node lifecycle.

use tracing::warn;

use crate::behavior::BehaviorNode;
use crate::condition::ConditionNode;
use crate::config::SharedConfig;
use crate::context::NodeContext;
use crate::error::NodeResult;
use crate::fsm::{StateNode, StateTransitionNode};
use crate::status::Lifecycle;

/// Lifecycle shared by every runtime node.
///
/// Owners drive the transitions (see [`Lifecycle`]). Calls that are invalid
/// for the current status are logged and ignored, never panicking inside a
/// tick.
pub trait CustomNode: Send {
    fn type_name(&self) -> &'static str;

    fn lifecycle(&self) -> Lifecycle;

    /// Binds the node to `config` and creates its declared children.
    fn initialize(&mut self, config: &SharedConfig, ctx: &mut NodeContext) -> NodeResult<()>;

    fn activate(&mut self, ctx: &mut NodeContext);

    fn deactivate(&mut self, ctx: &mut NodeContext);

    /// Restores pre-run state without releasing the node.
    fn reset(&mut self, ctx: &mut NodeContext);

    /// Releases owned children through the factory. Terminal.
    fn destroy(&mut self, ctx: &mut NodeContext);

    /// Host-initiated trigger forwarded down the active part of the tree.
    fn on_trigger(&mut self, _tag: &str, _ctx: &mut NodeContext) {}
}

/// A runtime node as produced by the factory, tagged by the slot kind it
/// can fill.
pub enum AnyNode {
    Behavior(Box<dyn BehaviorNode>),
    Condition(Box<dyn ConditionNode>),
    State(Box<dyn StateNode>),
    Transition(Box<StateTransitionNode>),
}

impl AnyNode {
    pub fn kind(&self) -> &'static str {
        match self {
            AnyNode::Behavior(_) => "behavior",
            AnyNode::Condition(_) => "condition",
            AnyNode::State(_) => "state",
            AnyNode::Transition(_) => "transition",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AnyNode::Behavior(n) => n.type_name(),
            AnyNode::Condition(n) => n.type_name(),
            AnyNode::State(n) => n.type_name(),
            AnyNode::Transition(n) => n.type_name(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            AnyNode::Behavior(n) => n.lifecycle(),
            AnyNode::Condition(n) => n.lifecycle(),
            AnyNode::State(n) => n.lifecycle(),
            AnyNode::Transition(n) => n.lifecycle(),
        }
    }

    pub fn initialize(&mut self, config: &SharedConfig, ctx: &mut NodeContext) -> NodeResult<()> {
        match self {
            AnyNode::Behavior(n) => n.initialize(config, ctx),
            AnyNode::Condition(n) => n.initialize(config, ctx),
            AnyNode::State(n) => n.initialize(config, ctx),
            AnyNode::Transition(n) => n.initialize(config, ctx),
        }
    }

    pub fn destroy(&mut self, ctx: &mut NodeContext) {
        match self {
            AnyNode::Behavior(n) => n.destroy(ctx),
            AnyNode::Condition(n) => n.destroy(ctx),
            AnyNode::State(n) => n.destroy(ctx),
            AnyNode::Transition(n) => n.destroy(ctx),
        }
    }
}

/// Lifecycle bookkeeping embedded in node implementations.
///
/// Each guard returns whether the requested transition is valid and, if so,
/// performs it. Invalid requests are logged at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeCore {
    status: Lifecycle,
}

impl NodeCore {
    pub fn status(&self) -> Lifecycle {
        self.status
    }

    pub fn can_initialize(&self, node: &'static str) -> bool {
        if self.status == Lifecycle::Uninitialized {
            return true;
        }
        self.reject(node, "initialize");
        false
    }

    pub fn mark_ready(&mut self) {
        self.status = Lifecycle::Ready;
    }

    /// `Ready -> Active`. Activating an active node is a silent no-op.
    pub fn activate(&mut self, node: &'static str) -> bool {
        match self.status {
            Lifecycle::Ready => {
                self.status = Lifecycle::Active;
                true
            }
            Lifecycle::Active => false,
            _ => {
                self.reject(node, "activate");
                false
            }
        }
    }

    /// `Active -> Ready`. Deactivating a ready node is a silent no-op.
    pub fn deactivate(&mut self, node: &'static str) -> bool {
        match self.status {
            Lifecycle::Active => {
                self.status = Lifecycle::Ready;
                true
            }
            Lifecycle::Ready => false,
            _ => {
                self.reject(node, "deactivate");
                false
            }
        }
    }

    pub fn can_reset(&self, node: &'static str) -> bool {
        if self.status.is_live() {
            return true;
        }
        self.reject(node, "reset");
        false
    }

    pub fn can_update(&self, node: &'static str) -> bool {
        if self.status.is_active() {
            return true;
        }
        self.reject(node, "update");
        false
    }

    /// Moves to `Destroyed`. Returns false if the node already was.
    pub fn begin_destroy(&mut self, node: &'static str) -> bool {
        if self.status.is_destroyed() {
            self.reject(node, "destroy");
            return false;
        }
        self.status = Lifecycle::Destroyed;
        true
    }

    fn reject(&self, node: &'static str, call: &'static str) {
        warn!(
            target: "logic_graph::node",
            node,
            call,
            status = %self.status,
            "lifecycle call ignored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_follow_lifecycle() {
        let mut core = NodeCore::default();
        assert!(!core.can_update("T"));
        assert!(!core.activate("T"));
        assert!(core.can_initialize("T"));

        core.mark_ready();
        assert!(!core.can_initialize("T"));
        assert!(core.can_reset("T"));
        assert!(core.activate("T"));
        assert!(!core.activate("T"));
        assert!(core.can_update("T"));
        assert!(core.deactivate("T"));
        assert!(!core.can_update("T"));

        assert!(core.begin_destroy("T"));
        assert!(!core.begin_destroy("T"));
        assert!(!core.can_reset("T"));
        assert_eq!(core.status(), Lifecycle::Destroyed);
    }
}

//! Creation and destruction of runtime nodes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{trace, warn};

use crate::behavior::BehaviorNode;
use crate::condition::ConditionNode;
use crate::config::SharedConfig;
use crate::context::NodeContext;
use crate::fsm::{StateNode, StateTransitionNode};
use crate::node::AnyNode;
use crate::registry::NodeRegistry;

/// Sole allocator of runtime nodes for one agent.
///
/// Every node obtained here must be handed back to one of the `destroy_*`
/// methods; the factory only counts live nodes and does not reclaim
/// orphans.
#[derive(Debug)]
pub struct NodeFactory {
    registry: Arc<NodeRegistry>,
    live: AtomicUsize,
}

impl NodeFactory {
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            live: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Nodes created and not yet destroyed.
    pub fn live_nodes(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Allocates and initializes the node `config` declares.
    ///
    /// Returns `None` for unregistered types and for nodes that fail to
    /// initialize; both are logged.
    pub fn create_custom_node(
        &self,
        config: &SharedConfig,
        ctx: &mut NodeContext,
    ) -> Option<AnyNode> {
        let Some(mut node) = self.registry.instantiate(config.type_name()) else {
            warn!(
                target: "logic_graph::factory",
                type_name = config.type_name(),
                "unregistered node type"
            );
            return None;
        };

        if let Err(err) = node.initialize(config, ctx) {
            warn!(
                target: "logic_graph::factory",
                type_name = config.type_name(),
                %err,
                "node initialization failed"
            );
            node.destroy(ctx);
            return None;
        }

        self.live.fetch_add(1, Ordering::Relaxed);
        trace!(
            target: "logic_graph::factory",
            type_name = config.type_name(),
            kind = node.kind(),
            "node created"
        );
        Some(node)
    }

    /// Destroys `node` and its children.
    pub fn destroy_custom_node(&self, mut node: AnyNode, ctx: &mut NodeContext) {
        node.destroy(ctx);
        // Saturate: a miscounted release must not wrap the counter.
        let _ = self
            .live
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        trace!(
            target: "logic_graph::factory",
            type_name = node.type_name(),
            "node destroyed"
        );
    }

    pub fn create_behavior(
        &self,
        config: &SharedConfig,
        ctx: &mut NodeContext,
    ) -> Option<Box<dyn BehaviorNode>> {
        match self.create_custom_node(config, ctx)? {
            AnyNode::Behavior(node) => Some(node),
            other => self.reject(other, "behavior", ctx),
        }
    }

    pub fn create_condition(
        &self,
        config: &SharedConfig,
        ctx: &mut NodeContext,
    ) -> Option<Box<dyn ConditionNode>> {
        match self.create_custom_node(config, ctx)? {
            AnyNode::Condition(node) => Some(node),
            other => self.reject(other, "condition", ctx),
        }
    }

    pub fn create_state(
        &self,
        config: &SharedConfig,
        ctx: &mut NodeContext,
    ) -> Option<Box<dyn StateNode>> {
        match self.create_custom_node(config, ctx)? {
            AnyNode::State(node) => Some(node),
            other => self.reject(other, "state", ctx),
        }
    }

    pub fn create_transition(
        &self,
        config: &SharedConfig,
        ctx: &mut NodeContext,
    ) -> Option<Box<StateTransitionNode>> {
        match self.create_custom_node(config, ctx)? {
            AnyNode::Transition(node) => Some(node),
            other => self.reject(other, "transition", ctx),
        }
    }

    pub fn destroy_behavior(&self, node: Box<dyn BehaviorNode>, ctx: &mut NodeContext) {
        self.destroy_custom_node(AnyNode::Behavior(node), ctx);
    }

    pub fn destroy_condition(&self, node: Box<dyn ConditionNode>, ctx: &mut NodeContext) {
        self.destroy_custom_node(AnyNode::Condition(node), ctx);
    }

    pub fn destroy_state(&self, node: Box<dyn StateNode>, ctx: &mut NodeContext) {
        self.destroy_custom_node(AnyNode::State(node), ctx);
    }

    pub fn destroy_transition(&self, node: Box<StateTransitionNode>, ctx: &mut NodeContext) {
        self.destroy_custom_node(AnyNode::Transition(node), ctx);
    }

    fn reject<T>(&self, node: AnyNode, wanted: &'static str, ctx: &mut NodeContext) -> Option<T> {
        warn!(
            target: "logic_graph::factory",
            type_name = node.type_name(),
            found = node.kind(),
            wanted,
            "node does not fit its slot"
        );
        self.destroy_custom_node(node, ctx);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::context::test_support;

    #[test]
    fn unregistered_type_is_a_miss() {
        let (mut ctx, _) = test_support::context();
        let config = builder::wait(1.0);
        let factory = NodeFactory::new(Arc::new(NodeRegistry::new()));

        assert!(factory.create_behavior(&config, &mut ctx).is_none());
        assert_eq!(factory.live_nodes(), 0);
    }

    #[test]
    fn slot_mismatch_is_released() {
        let (mut ctx, _) = test_support::context();
        let factory = Arc::clone(ctx.factory());

        assert!(
            factory
                .create_condition(&builder::wait(1.0), &mut ctx)
                .is_none()
        );
        assert_eq!(factory.live_nodes(), 0);
    }

    #[test]
    fn children_are_counted_and_released() {
        let (mut ctx, _) = test_support::context();
        let factory = Arc::clone(ctx.factory());
        let config = builder::sequence(vec![builder::wait(1.0), builder::wait(2.0)]);

        let node = factory.create_behavior(&config, &mut ctx).unwrap();
        assert_eq!(factory.live_nodes(), 3);

        factory.destroy_behavior(node, &mut ctx);
        assert_eq!(factory.live_nodes(), 0);
    }
}

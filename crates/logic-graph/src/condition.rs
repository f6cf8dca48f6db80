//! Condition nodes: boolean evaluation, optionally ticking.

use std::sync::Arc;

use crate::category::NodeCategory;
use crate::config::{NodeConfig, SharedConfig};
use crate::context::NodeContext;
use crate::error::{NodeError, NodeResult};
use crate::node::{AnyNode, CustomNode, NodeCore};
use crate::registry::RegisteredNode;
use crate::status::Lifecycle;

/// A runtime node evaluating to a boolean.
pub trait ConditionNode: CustomNode {
    /// Advances time-dependent state. Most conditions ignore it.
    fn update(&mut self, dt: f32, ctx: &mut NodeContext);

    /// Evaluates the condition. Inactive conditions evaluate to false.
    fn check(&mut self, ctx: &NodeContext) -> bool;
}

/// Node-specific part of a condition.
pub trait ConditionLogic: Send + Sized + 'static {
    const TYPE_NAME: &'static str;
    const CATEGORY: NodeCategory = NodeCategory::Condition;

    type Config: NodeConfig + Default;

    fn new(config: Arc<Self::Config>, ctx: &mut NodeContext) -> NodeResult<Self>;

    fn on_activate(&mut self, _ctx: &mut NodeContext) {}

    fn on_deactivate(&mut self, _ctx: &mut NodeContext) {}

    fn on_reset(&mut self, _ctx: &mut NodeContext) {}

    fn on_update(&mut self, _dt: f32, _ctx: &mut NodeContext) {}

    fn evaluate(&mut self, ctx: &NodeContext) -> bool;

    fn on_trigger(&mut self, _tag: &str, _ctx: &mut NodeContext) {}

    fn on_destroy(&mut self, _ctx: &mut NodeContext) {}
}

/// Lifecycle wrapper turning a [`ConditionLogic`] into a [`ConditionNode`].
pub struct Cond<L: ConditionLogic> {
    core: NodeCore,
    logic: Option<L>,
}

impl<L: ConditionLogic> Cond<L> {
    pub fn new() -> Self {
        Self {
            core: NodeCore::default(),
            logic: None,
        }
    }

    pub fn logic(&self) -> Option<&L> {
        self.logic.as_ref()
    }
}

impl<L: ConditionLogic> Default for Cond<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ConditionLogic> RegisteredNode for Cond<L> {
    const TYPE_NAME: &'static str = L::TYPE_NAME;
    const CATEGORY: NodeCategory = L::CATEGORY;

    type Config = L::Config;

    fn instantiate() -> AnyNode {
        AnyNode::Condition(Box::new(Self::new()))
    }
}

impl<L: ConditionLogic> CustomNode for Cond<L> {
    fn type_name(&self) -> &'static str {
        L::TYPE_NAME
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core.status()
    }

    fn initialize(&mut self, config: &SharedConfig, ctx: &mut NodeContext) -> NodeResult<()> {
        if !self.core.can_initialize(L::TYPE_NAME) {
            return Ok(());
        }
        let config = config
            .downcast::<L::Config>()
            .ok_or_else(|| NodeError::ConfigType {
                node: L::TYPE_NAME,
                found: config.type_name().to_string(),
            })?;
        self.logic = Some(L::new(config, ctx)?);
        self.core.mark_ready();
        Ok(())
    }

    fn activate(&mut self, ctx: &mut NodeContext) {
        if self.core.activate(L::TYPE_NAME)
            && let Some(logic) = self.logic.as_mut()
        {
            logic.on_activate(ctx);
        }
    }

    fn deactivate(&mut self, ctx: &mut NodeContext) {
        if self.core.deactivate(L::TYPE_NAME)
            && let Some(logic) = self.logic.as_mut()
        {
            logic.on_deactivate(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut NodeContext) {
        if self.core.can_reset(L::TYPE_NAME)
            && let Some(logic) = self.logic.as_mut()
        {
            logic.on_reset(ctx);
        }
    }

    fn destroy(&mut self, ctx: &mut NodeContext) {
        if !self.core.begin_destroy(L::TYPE_NAME) {
            return;
        }
        if let Some(mut logic) = self.logic.take() {
            logic.on_destroy(ctx);
        }
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        if self.core.status().is_active()
            && let Some(logic) = self.logic.as_mut()
        {
            logic.on_trigger(tag, ctx);
        }
    }
}

impl<L: ConditionLogic> ConditionNode for Cond<L> {
    fn update(&mut self, dt: f32, ctx: &mut NodeContext) {
        if self.core.can_update(L::TYPE_NAME)
            && let Some(logic) = self.logic.as_mut()
        {
            logic.on_update(dt.max(0.0), ctx);
        }
    }

    fn check(&mut self, ctx: &NodeContext) -> bool {
        if !self.core.status().is_active() {
            return false;
        }
        self.logic.as_mut().is_some_and(|logic| logic.evaluate(ctx))
    }
}

//! Logical combinators over child conditions.

use std::sync::Arc;

use tracing::warn;

use crate::category::NodeCategory;
use crate::condition::{Cond, ConditionLogic, ConditionNode};
use crate::config::{ConfigElement, ConfigParser, NodeConfig, ROLE_CONDITION, SharedConfig};
use crate::context::NodeContext;
use crate::error::{ConfigResult, NodeError, NodeResult};

pub type NotCond = Cond<Not>;
pub type AllCond = Cond<All>;
pub type AnyCond = Cond<AnyOf>;

/// Config of [`NotCond`]: the negated condition in a `Condition` role.
#[derive(Debug, Default)]
pub struct NotCfg {
    pub condition: Option<SharedConfig>,
}

impl NodeConfig for NotCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        self.condition = Some(parser.parse_required_role(
            element,
            ROLE_CONDITION,
            NodeCategory::Condition,
        )?);
        Ok(())
    }
}

/// Config of [`AllCond`] and [`AnyCond`]: child conditions as plain entries.
#[derive(Debug, Default)]
pub struct ConditionListCfg {
    pub conditions: Vec<SharedConfig>,
}

impl NodeConfig for ConditionListCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        self.conditions = parser.parse_list(element, NodeCategory::Condition)?;
        Ok(())
    }
}

/// Children shared by all combinators.
struct Children(Vec<Box<dyn ConditionNode>>);

impl Children {
    fn create(owner: &'static str, configs: &[SharedConfig], ctx: &mut NodeContext) -> Self {
        let nodes = configs
            .iter()
            .filter_map(|config| {
                let node = ctx.create_condition(config);
                if node.is_none() {
                    warn!(
                        target: "logic_graph::node",
                        node = owner,
                        child = config.type_name(),
                        "child skipped"
                    );
                }
                node
            })
            .collect();
        Self(nodes)
    }

    fn activate(&mut self, ctx: &mut NodeContext) {
        self.0.iter_mut().for_each(|c| c.activate(ctx));
    }

    fn deactivate(&mut self, ctx: &mut NodeContext) {
        self.0.iter_mut().for_each(|c| c.deactivate(ctx));
    }

    fn reset(&mut self, ctx: &mut NodeContext) {
        self.0.iter_mut().for_each(|c| c.reset(ctx));
    }

    fn update(&mut self, dt: f32, ctx: &mut NodeContext) {
        self.0.iter_mut().for_each(|c| c.update(dt, ctx));
    }

    fn trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        self.0.iter_mut().for_each(|c| c.on_trigger(tag, ctx));
    }

    fn destroy(&mut self, ctx: &mut NodeContext) {
        for child in self.0.drain(..) {
            ctx.destroy_condition(child);
        }
    }
}

macro_rules! forward_children {
    () => {
        fn on_activate(&mut self, ctx: &mut NodeContext) {
            self.children.activate(ctx);
        }

        fn on_deactivate(&mut self, ctx: &mut NodeContext) {
            self.children.deactivate(ctx);
        }

        fn on_reset(&mut self, ctx: &mut NodeContext) {
            self.children.reset(ctx);
        }

        fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) {
            self.children.update(dt, ctx);
        }

        fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
            self.children.trigger(tag, ctx);
        }

        fn on_destroy(&mut self, ctx: &mut NodeContext) {
            self.children.destroy(ctx);
        }
    };
}

/// Negates its child.
pub struct Not {
    children: Children,
}

impl ConditionLogic for Not {
    const TYPE_NAME: &'static str = "NotCond";

    type Config = NotCfg;

    fn new(config: Arc<NotCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        let children = Children::create(Self::TYPE_NAME, config.condition.as_slice(), ctx);
        if children.0.is_empty() {
            return Err(NodeError::MissingChild {
                node: Self::TYPE_NAME,
                role: ROLE_CONDITION,
            });
        }
        Ok(Self { children })
    }

    forward_children!();

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        !self.children.0.iter_mut().all(|c| c.check(ctx))
    }
}

/// True when every child is true; true for no children.
pub struct All {
    children: Children,
}

impl ConditionLogic for All {
    const TYPE_NAME: &'static str = "AllCond";

    type Config = ConditionListCfg;

    fn new(config: Arc<ConditionListCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            children: Children::create(Self::TYPE_NAME, &config.conditions, ctx),
        })
    }

    forward_children!();

    /// Short-circuits on the first false child.
    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        self.children.0.iter_mut().all(|c| c.check(ctx))
    }
}

/// True when any child is true; false for no children.
pub struct AnyOf {
    children: Children,
}

impl ConditionLogic for AnyOf {
    const TYPE_NAME: &'static str = "AnyCond";

    type Config = ConditionListCfg;

    fn new(config: Arc<ConditionListCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            children: Children::create(Self::TYPE_NAME, &config.conditions, ctx),
        })
    }

    forward_children!();

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        self.children.0.iter_mut().any(|c| c.check(ctx))
    }
}

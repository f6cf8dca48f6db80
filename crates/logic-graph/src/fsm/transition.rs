use std::sync::Arc;

use tracing::warn;

use crate::category::NodeCategory;
use crate::condition::ConditionNode;
use crate::config::{ConfigElement, ConfigParser, NodeConfig, ROLE_CONDITION, SharedConfig};
use crate::context::NodeContext;
use crate::error::{ConfigResult, NodeError, NodeResult};
use crate::node::{AnyNode, CustomNode, NodeCore};
use crate::registry::RegisteredNode;
use crate::status::Lifecycle;
use crate::value::ValueConfig;

/// Config of a [`StateTransitionNode`].
#[derive(Debug, Default)]
pub struct StateTransitionCfg {
    pub condition: Option<SharedConfig>,
    /// Target when the condition holds; `None` stays.
    pub true_state: Option<String>,
    /// Target when the condition fails; `None` stays.
    pub false_state: Option<String>,
    /// Seconds between evaluations; 0 evaluates on every check.
    pub check_interval: ValueConfig<f32>,
}

impl StateTransitionCfg {
    pub fn new(condition: SharedConfig) -> Self {
        Self {
            condition: Some(condition),
            ..Self::default()
        }
    }

    pub fn on_true(mut self, state: impl Into<String>) -> Self {
        self.true_state = Some(state.into());
        self
    }

    pub fn on_false(mut self, state: impl Into<String>) -> Self {
        self.false_state = Some(state.into());
        self
    }

    pub fn every(mut self, seconds: f32) -> Self {
        self.check_interval = ValueConfig::literal(seconds);
        self
    }
}

impl NodeConfig for StateTransitionCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        let target = |name: &str| {
            element
                .attr(name)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        };
        self.true_state = target("TrueStateID");
        self.false_state = target("FalseStateID");
        if self.true_state.is_none() && self.false_state.is_none() {
            return Err(element.invalid("requires TrueStateID or FalseStateID"));
        }

        self.check_interval = element.value("CheckOnTick", 0.0)?;
        if !self.check_interval.is_bound() && *self.check_interval.default_value() < 0.0 {
            return Err(element.invalid("CheckOnTick must not be negative"));
        }

        self.condition = Some(parser.parse_required_role(
            element,
            ROLE_CONDITION,
            NodeCategory::Condition,
        )?);
        Ok(())
    }
}

/// Evaluates one condition and resolves to a target state id.
///
/// With a positive check interval the condition is evaluated at most once
/// per interval of accumulated `dt`; otherwise on every check.
pub struct StateTransitionNode {
    core: NodeCore,
    config: Option<Arc<StateTransitionCfg>>,
    condition: Option<Box<dyn ConditionNode>>,
    interval: f32,
    cooldown: f32,
    evaluations: u64,
}

impl StateTransitionNode {
    pub const TYPE_NAME: &'static str = "StateTransition";

    pub fn new() -> Self {
        Self {
            core: NodeCore::default(),
            config: None,
            condition: None,
            interval: 0.0,
            cooldown: 0.0,
            evaluations: 0,
        }
    }

    /// Number of times the condition has been evaluated.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    fn rearm(&mut self, ctx: &NodeContext) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        let interval = config.check_interval.get_value(ctx);
        self.interval = if interval < 0.0 {
            warn!(
                target: "logic_graph::fsm",
                interval,
                "negative check interval clamped to zero"
            );
            0.0
        } else {
            interval
        };
        self.cooldown = self.interval;
    }

    /// Ticks the condition and, unless throttled, evaluates it.
    ///
    /// Returns the id of the state to switch to.
    pub fn check(&mut self, dt: f32, ctx: &mut NodeContext) -> Option<String> {
        if !self.core.can_update(Self::TYPE_NAME) {
            return None;
        }
        let dt = dt.max(0.0);
        let condition = self.condition.as_mut()?;
        condition.update(dt, ctx);

        if self.interval > 0.0 {
            self.cooldown -= dt;
            if self.cooldown > 0.0 && !ctx.is_zero(self.cooldown) {
                return None;
            }
            self.cooldown = self.interval;
        }

        self.evaluations += 1;
        let outcome = condition.check(ctx);
        let config = self.config.as_ref()?;
        if outcome {
            config.true_state.clone()
        } else {
            config.false_state.clone()
        }
    }
}

impl Default for StateTransitionNode {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisteredNode for StateTransitionNode {
    const TYPE_NAME: &'static str = StateTransitionNode::TYPE_NAME;
    const CATEGORY: NodeCategory = NodeCategory::StateTransition;

    type Config = StateTransitionCfg;

    fn instantiate() -> AnyNode {
        AnyNode::Transition(Box::new(Self::new()))
    }
}

impl CustomNode for StateTransitionNode {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core.status()
    }

    fn initialize(&mut self, config: &SharedConfig, ctx: &mut NodeContext) -> NodeResult<()> {
        if !self.core.can_initialize(Self::TYPE_NAME) {
            return Ok(());
        }
        let body = config
            .downcast::<StateTransitionCfg>()
            .ok_or_else(|| NodeError::ConfigType {
                node: Self::TYPE_NAME,
                found: config.type_name().to_string(),
            })?;
        let condition = body
            .condition
            .as_ref()
            .and_then(|c| ctx.create_condition(c))
            .ok_or(NodeError::MissingChild {
                node: Self::TYPE_NAME,
                role: ROLE_CONDITION,
            })?;

        self.condition = Some(condition);
        self.config = Some(body);
        self.rearm(ctx);
        self.core.mark_ready();
        Ok(())
    }

    fn activate(&mut self, ctx: &mut NodeContext) {
        if !self.core.activate(Self::TYPE_NAME) {
            return;
        }
        if let Some(condition) = self.condition.as_mut() {
            condition.activate(ctx);
        }
    }

    fn deactivate(&mut self, ctx: &mut NodeContext) {
        if self.core.deactivate(Self::TYPE_NAME)
            && let Some(condition) = self.condition.as_mut()
        {
            condition.deactivate(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut NodeContext) {
        if !self.core.can_reset(Self::TYPE_NAME) {
            return;
        }
        if let Some(condition) = self.condition.as_mut() {
            condition.reset(ctx);
        }
        self.rearm(ctx);
    }

    fn destroy(&mut self, ctx: &mut NodeContext) {
        if !self.core.begin_destroy(Self::TYPE_NAME) {
            return;
        }
        if let Some(condition) = self.condition.take() {
            ctx.destroy_condition(condition);
        }
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        if self.core.status().is_active()
            && let Some(condition) = self.condition.as_mut()
        {
            condition.on_trigger(tag, ctx);
        }
    }
}

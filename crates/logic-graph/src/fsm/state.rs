use std::sync::Arc;

use tracing::{debug, warn};

use super::transition::StateTransitionNode;
use crate::behavior::BehaviorNode;
use crate::category::NodeCategory;
use crate::config::{ConfigElement, ConfigParser, NodeConfig, ROLE_BHV, ROLE_EXIT_BHV, SharedConfig};
use crate::context::NodeContext;
use crate::error::{ConfigResult, NodeError, NodeResult};
use crate::node::{AnyNode, CustomNode, NodeCore};
use crate::registry::RegisteredNode;
use crate::status::Lifecycle;
use crate::var_env::VarEnv;

/// A state of an [`Fsm`](super::Fsm).
pub trait StateNode: CustomNode {
    fn id(&self) -> &str;

    /// Resets and activates the state.
    fn enter(&mut self, ctx: &mut NodeContext);

    fn update(&mut self, dt: f32, ctx: &mut NodeContext);

    /// True once the state's own logic has completed. Sticky until reset.
    fn is_logic_ended(&self) -> bool;

    fn has_transitions(&self) -> bool;

    /// Evaluates outgoing transitions in declared order, only once the
    /// state's logic has ended. Returns the first resolved target.
    fn check_transitions(&mut self, dt: f32, ctx: &mut NodeContext) -> Option<String>;

    /// Deactivates the state and runs its exit behavior to completion.
    fn exit(&mut self, ctx: &mut NodeContext);
}

/// Config of a [`CustomBhvState`].
#[derive(Debug, Default)]
pub struct CustomBhvStateCfg {
    pub id: String,
    /// Published when the state's logic ends.
    pub end_event: Option<String>,
    pub bhv: Option<SharedConfig>,
    pub exit_bhv: Option<SharedConfig>,
    pub transitions: Vec<SharedConfig>,
}

impl CustomBhvStateCfg {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_bhv(mut self, bhv: SharedConfig) -> Self {
        self.bhv = Some(bhv);
        self
    }

    pub fn with_exit_bhv(mut self, bhv: SharedConfig) -> Self {
        self.exit_bhv = Some(bhv);
        self
    }

    pub fn with_end_event(mut self, event: impl Into<String>) -> Self {
        self.end_event = Some(event.into());
        self
    }

    pub fn with_transition(mut self, transition: SharedConfig) -> Self {
        self.transitions.push(transition);
        self
    }
}

impl NodeConfig for CustomBhvStateCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        self.id = element.required_attr("Id")?.trim().to_string();
        if self.id.is_empty() {
            return Err(element.invalid("Id must not be empty"));
        }
        self.end_event = element.attr("EndEvent").map(str::to_string);
        element.only_roles(&[ROLE_BHV, ROLE_EXIT_BHV])?;
        self.bhv = parser.parse_role(element, ROLE_BHV, NodeCategory::Behavior)?;
        self.exit_bhv = parser.parse_role(element, ROLE_EXIT_BHV, NodeCategory::Behavior)?;
        self.transitions = parser.parse_list(element, NodeCategory::StateTransition)?;
        Ok(())
    }
}

/// State running an optional behavior, an optional exit behavior, and
/// outgoing transitions.
///
/// The state's logic ends when its behavior can stop, or immediately when
/// it has none.
pub struct CustomBhvState {
    core: NodeCore,
    config: Option<Arc<CustomBhvStateCfg>>,
    bhv: Option<Box<dyn BehaviorNode>>,
    exit_bhv: Option<Box<dyn BehaviorNode>>,
    transitions: Vec<Box<StateTransitionNode>>,
    logic_ended: bool,
}

impl CustomBhvState {
    pub const TYPE_NAME: &'static str = "CustomBhvState";

    pub fn new() -> Self {
        Self {
            core: NodeCore::default(),
            config: None,
            bhv: None,
            exit_bhv: None,
            transitions: Vec::new(),
            logic_ended: false,
        }
    }

    fn on_logic_end(&mut self, ctx: &mut NodeContext) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        debug!(target: "logic_graph::fsm", state = %config.id, "state logic ended");
        if let Some(event) = config.end_event.as_deref() {
            ctx.publish(event, VarEnv::new());
        }
    }

    fn run_exit_bhv(&mut self, ctx: &mut NodeContext) {
        let Some(exit) = self.exit_bhv.as_mut() else {
            return;
        };
        let exit_dt = ctx.settings().exit_dt;
        exit.reset(ctx);
        exit.activate(ctx);
        exit.update(exit_dt, ctx);
        if !exit.can_stop(ctx) {
            warn!(
                target: "logic_graph::fsm",
                state = self.config.as_ref().map_or("", |c| c.id.as_str()),
                exit_bhv = exit.type_name(),
                "exit behavior did not complete within exit"
            );
        }
        exit.deactivate(ctx);
    }
}

impl Default for CustomBhvState {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisteredNode for CustomBhvState {
    const TYPE_NAME: &'static str = CustomBhvState::TYPE_NAME;
    const CATEGORY: NodeCategory = NodeCategory::State;

    type Config = CustomBhvStateCfg;

    fn instantiate() -> AnyNode {
        AnyNode::State(Box::new(Self::new()))
    }
}

impl CustomNode for CustomBhvState {
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
            .downcast::<CustomBhvStateCfg>()
            .ok_or_else(|| NodeError::ConfigType {
                node: Self::TYPE_NAME,
                found: config.type_name().to_string(),
            })?;

        let create = |role: &str, cfg: Option<&SharedConfig>, ctx: &mut NodeContext| {
            let cfg = cfg?;
            let node = ctx.create_behavior(cfg);
            if node.is_none() {
                warn!(
                    target: "logic_graph::fsm",
                    state = %body.id,
                    role,
                    child = cfg.type_name(),
                    "state child skipped"
                );
            }
            node
        };
        self.bhv = create(ROLE_BHV, body.bhv.as_ref(), ctx);
        self.exit_bhv = create(ROLE_EXIT_BHV, body.exit_bhv.as_ref(), ctx);

        for transition in &body.transitions {
            match ctx.create_transition(transition) {
                Some(node) => self.transitions.push(node),
                None => warn!(
                    target: "logic_graph::fsm",
                    state = %body.id,
                    "transition skipped"
                ),
            }
        }

        self.config = Some(body);
        self.core.mark_ready();
        Ok(())
    }

    fn activate(&mut self, ctx: &mut NodeContext) {
        if !self.core.activate(Self::TYPE_NAME) {
            return;
        }
        if let Some(bhv) = self.bhv.as_mut() {
            bhv.activate(ctx);
        }
        for transition in &mut self.transitions {
            transition.activate(ctx);
        }
    }

    fn deactivate(&mut self, ctx: &mut NodeContext) {
        if !self.core.deactivate(Self::TYPE_NAME) {
            return;
        }
        if let Some(bhv) = self.bhv.as_mut() {
            bhv.deactivate(ctx);
        }
        for transition in &mut self.transitions {
            transition.deactivate(ctx);
        }
    }

    fn reset(&mut self, ctx: &mut NodeContext) {
        if !self.core.can_reset(Self::TYPE_NAME) {
            return;
        }
        if let Some(bhv) = self.bhv.as_mut() {
            bhv.reset(ctx);
        }
        for transition in &mut self.transitions {
            transition.reset(ctx);
        }
        self.logic_ended = false;
    }

    fn destroy(&mut self, ctx: &mut NodeContext) {
        if !self.core.begin_destroy(Self::TYPE_NAME) {
            return;
        }
        if let Some(bhv) = self.bhv.take() {
            ctx.destroy_behavior(bhv);
        }
        if let Some(exit) = self.exit_bhv.take() {
            ctx.destroy_behavior(exit);
        }
        for transition in self.transitions.drain(..) {
            ctx.destroy_transition(transition);
        }
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        if !self.core.status().is_active() {
            return;
        }
        if let Some(bhv) = self.bhv.as_mut() {
            bhv.on_trigger(tag, ctx);
        }
        for transition in &mut self.transitions {
            transition.on_trigger(tag, ctx);
        }
    }
}

impl StateNode for CustomBhvState {
    fn id(&self) -> &str {
        self.config.as_ref().map_or("", |c| c.id.as_str())
    }

    fn enter(&mut self, ctx: &mut NodeContext) {
        self.reset(ctx);
        self.activate(ctx);
    }

    fn update(&mut self, dt: f32, ctx: &mut NodeContext) {
        if !self.core.can_update(Self::TYPE_NAME) {
            return;
        }
        let finished = match self.bhv.as_mut() {
            Some(bhv) => {
                bhv.update(dt, ctx);
                bhv.can_stop(ctx)
            }
            None => true,
        };
        if finished && !self.logic_ended {
            self.logic_ended = true;
            self.on_logic_end(ctx);
        }
    }

    fn is_logic_ended(&self) -> bool {
        self.logic_ended
    }

    fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    fn check_transitions(&mut self, dt: f32, ctx: &mut NodeContext) -> Option<String> {
        if !self.logic_ended {
            return None;
        }
        self.transitions
            .iter_mut()
            .find_map(|transition| transition.check(dt, ctx))
    }

    fn exit(&mut self, ctx: &mut NodeContext) {
        self.deactivate(ctx);
        self.run_exit_bhv(ctx);
    }
}

//! Finite-state machines.
//!
//! An [`Fsm`] owns its states and runs exactly one of them. A state ticks
//! its behavior until the behavior can stop ("logic ended"); only then are
//! its outgoing transitions evaluated. At most one transition is taken per
//! FSM update and the entered state first ticks on the next update.

mod state;
mod transition;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error, warn};

pub use state::{CustomBhvState, CustomBhvStateCfg, StateNode};
pub use transition::{StateTransitionCfg, StateTransitionNode};

use crate::behavior::{BehaviorLogic, Bhv};
use crate::category::NodeCategory;
use crate::config::{ConfigElement, ConfigParser, NodeConfig, SharedConfig};
use crate::context::NodeContext;
use crate::error::{ConfigError, ConfigResult, NodeError, NodeResult};

/// An FSM usable wherever a behavior is expected.
pub type FsmBhv = Bhv<Fsm>;

/// Config of an [`Fsm`]: the initial state id and the states keyed by id.
#[derive(Debug, Default)]
pub struct FsmCfg {
    pub initial: String,
    pub states: Vec<(String, SharedConfig)>,
}

impl FsmCfg {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: initial.into(),
            states: Vec::new(),
        }
    }

    /// Adds a state config under `id`.
    pub fn with_state(mut self, id: impl Into<String>, state: SharedConfig) -> Self {
        self.states.push((id.into(), state));
        self
    }
}

impl NodeConfig for FsmCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        self.initial = element.required_attr("Initial")?.trim().to_string();

        let mut seen = HashSet::new();
        for entry in element.entries() {
            let Some(state) = parser.parse_expect(element, "State", entry, NodeCategory::State)?
            else {
                continue;
            };
            let id = entry.required_attr("Id")?.trim().to_string();
            if !seen.insert(id.clone()) {
                let err = ConfigError::DuplicateStateId {
                    tag: element.tag.clone(),
                    id,
                };
                error!(target: "logic_graph::config", %err, "script rejected");
                return Err(err);
            }
            self.states.push((id, state));
        }

        if !seen.contains(&self.initial) {
            let err = ConfigError::UnknownInitialState {
                tag: element.tag.clone(),
                id: self.initial.clone(),
            };
            error!(target: "logic_graph::config", %err, "script rejected");
            return Err(err);
        }
        Ok(())
    }
}

/// Runs one state at a time and switches on resolved transitions.
pub struct Fsm {
    states: Vec<Box<dyn StateNode>>,
    index: HashMap<String, usize>,
    initial: String,
    current: Option<usize>,
    switches: usize,
}

impl Fsm {
    /// Id of the running state.
    pub fn current_state(&self) -> Option<&str> {
        self.current.map(|i| self.states[i].id())
    }

    /// Transitions taken since creation.
    pub fn switches(&self) -> usize {
        self.switches
    }

    fn enter_initial(&mut self, ctx: &mut NodeContext) {
        if let Some(&initial) = self.index.get(&self.initial) {
            self.current = Some(initial);
            self.states[initial].enter(ctx);
            debug!(target: "logic_graph::fsm", state = %self.initial, "entered initial state");
        }
    }

    fn switch_to(&mut self, target: &str, ctx: &mut NodeContext) {
        let Some(&next) = self.index.get(target) else {
            warn!(
                target: "logic_graph::fsm",
                from = self.current_state().unwrap_or_default(),
                to = target,
                "unknown transition target, staying"
            );
            return;
        };

        if let Some(current) = self.current {
            self.states[current].exit(ctx);
        }
        self.current = Some(next);
        self.states[next].enter(ctx);
        self.switches += 1;
        debug!(target: "logic_graph::fsm", state = target, "entered state");
    }
}

impl BehaviorLogic for Fsm {
    const TYPE_NAME: &'static str = "Fsm";
    const CATEGORY: NodeCategory = NodeCategory::Fsm;

    type Config = FsmCfg;

    fn new(config: Arc<FsmCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        let mut states = Vec::with_capacity(config.states.len());
        let mut index = HashMap::new();
        for (id, state) in &config.states {
            match ctx.create_state(state) {
                Some(node) => {
                    index.insert(id.clone(), states.len());
                    states.push(node);
                }
                None => warn!(target: "logic_graph::fsm", state = %id, "state skipped"),
            }
        }

        if !index.contains_key(&config.initial) {
            for state in states {
                ctx.destroy_state(state);
            }
            return Err(NodeError::MissingChild {
                node: Self::TYPE_NAME,
                role: "Initial",
            });
        }

        Ok(Self {
            states,
            index,
            initial: config.initial.clone(),
            current: None,
            switches: 0,
        })
    }

    fn on_activate(&mut self, ctx: &mut NodeContext) {
        match self.current {
            Some(current) => self.states[current].activate(ctx),
            None => self.enter_initial(ctx),
        }
    }

    fn on_deactivate(&mut self, ctx: &mut NodeContext) {
        if let Some(current) = self.current {
            self.states[current].deactivate(ctx);
        }
    }

    fn on_reset(&mut self, ctx: &mut NodeContext) {
        if let Some(current) = self.current.take() {
            self.states[current].deactivate(ctx);
        }
    }

    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if self.current.is_none() {
            self.enter_initial(ctx);
        }
        let Some(current) = self.current else {
            return dt;
        };

        let state = &mut self.states[current];
        state.update(dt, ctx);
        if let Some(target) = state.check_transitions(dt, ctx) {
            self.switch_to(&target, ctx);
        }
        0.0
    }

    /// Done when the running state has ended and cannot leave.
    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.current
            .map(|i| &self.states[i])
            .is_some_and(|state| state.is_logic_ended() && !state.has_transitions())
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        if let Some(current) = self.current {
            self.states[current].on_trigger(tag, ctx);
        }
    }

    fn on_destroy(&mut self, ctx: &mut NodeContext) {
        self.current = None;
        self.index.clear();
        for state in self.states.drain(..) {
            ctx.destroy_state(state);
        }
    }
}

#[cfg(test)]
mod tests;

//! Per-agent execution context passed through the whole node tree.

use std::sync::Arc;

use crate::behavior::BehaviorNode;
use crate::condition::ConditionNode;
use crate::config::SharedConfig;
use crate::events::{EventBus, GameEvent};
use crate::factory::NodeFactory;
use crate::fsm::{StateNode, StateTransitionNode};
use crate::host::{EntityAccess, EntityId, ProcessTag};
use crate::registry::NodeRegistry;
use crate::settings::RuntimeSettings;
use crate::var_env::VarEnv;

/// Host services shared by all agents of one host.
#[derive(Clone)]
pub struct AgentEnv {
    pub registry: Arc<NodeRegistry>,
    pub entities: Arc<dyn EntityAccess>,
    pub events: EventBus,
    pub settings: Arc<RuntimeSettings>,
}

impl AgentEnv {
    /// Builds an environment whose bus capacity follows `settings`.
    pub fn new(
        registry: Arc<NodeRegistry>,
        entities: Arc<dyn EntityAccess>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            registry,
            entities,
            events: EventBus::with_capacity(settings.event_capacity),
            settings: Arc::new(settings),
        }
    }
}

/// What every node of one agent sees: owner ids, the variable environment,
/// the factory and the host services.
pub struct NodeContext {
    owner: EntityId,
    script_owner: ProcessTag,
    vars: VarEnv,
    factory: Arc<NodeFactory>,
    env: AgentEnv,
}

impl NodeContext {
    pub fn new(
        owner: EntityId,
        script_owner: ProcessTag,
        vars: VarEnv,
        factory: Arc<NodeFactory>,
        env: AgentEnv,
    ) -> Self {
        Self {
            owner,
            script_owner,
            vars,
            factory,
            env,
        }
    }

    /// Entity the agent runs for.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Tag of the process that owns the running script.
    pub fn script_owner(&self) -> ProcessTag {
        self.script_owner
    }

    pub fn vars(&self) -> &VarEnv {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarEnv {
        &mut self.vars
    }

    pub fn factory(&self) -> &Arc<NodeFactory> {
        &self.factory
    }

    pub fn entities(&self) -> &dyn EntityAccess {
        &*self.env.entities
    }

    pub fn events(&self) -> &EventBus {
        &self.env.events
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.env.settings
    }

    pub fn env(&self) -> &AgentEnv {
        &self.env
    }

    /// Publishes `name` on the bus with this agent's owner as source.
    pub fn publish(&self, name: &str, payload: VarEnv) -> usize {
        self.env
            .events
            .publish(GameEvent::new(name, self.owner).with_payload(payload))
    }

    /// Returns true if `t` is within the configured time tolerance of zero.
    pub fn is_zero(&self, t: f32) -> bool {
        t.abs() <= self.env.settings.time_epsilon
    }

    pub fn create_behavior(&mut self, config: &SharedConfig) -> Option<Box<dyn BehaviorNode>> {
        let factory = Arc::clone(&self.factory);
        factory.create_behavior(config, self)
    }

    pub fn create_condition(&mut self, config: &SharedConfig) -> Option<Box<dyn ConditionNode>> {
        let factory = Arc::clone(&self.factory);
        factory.create_condition(config, self)
    }

    pub fn create_state(&mut self, config: &SharedConfig) -> Option<Box<dyn StateNode>> {
        let factory = Arc::clone(&self.factory);
        factory.create_state(config, self)
    }

    pub fn create_transition(
        &mut self,
        config: &SharedConfig,
    ) -> Option<Box<StateTransitionNode>> {
        let factory = Arc::clone(&self.factory);
        factory.create_transition(config, self)
    }

    pub fn destroy_behavior(&mut self, node: Box<dyn BehaviorNode>) {
        let factory = Arc::clone(&self.factory);
        factory.destroy_behavior(node, self);
    }

    pub fn destroy_condition(&mut self, node: Box<dyn ConditionNode>) {
        let factory = Arc::clone(&self.factory);
        factory.destroy_condition(node, self);
    }

    pub fn destroy_state(&mut self, node: Box<dyn StateNode>) {
        let factory = Arc::clone(&self.factory);
        factory.destroy_state(node, self);
    }

    pub fn destroy_transition(&mut self, node: Box<StateTransitionNode>) {
        let factory = Arc::clone(&self.factory);
        factory.destroy_transition(node, self);
    }
}

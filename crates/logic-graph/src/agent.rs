//! Runtime instance of one script for one owner.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::behavior::BehaviorNode;
use crate::category::NodeCategory;
use crate::config::Script;
use crate::context::{AgentEnv, NodeContext};
use crate::error::AgentError;
use crate::factory::NodeFactory;
use crate::host::{EntityId, ProcessTag};
use crate::var_env::VarEnv;

/// Owns the root behavior of a script instance, its variables and its
/// node factory.
///
/// Agents are ticked from a single thread. Several agents of one host share
/// the registry, the entity accessor and the event bus through [`AgentEnv`].
pub struct Agent {
    script: String,
    ctx: NodeContext,
    root: Option<Box<dyn BehaviorNode>>,
}

impl Agent {
    /// Builds the runtime tree of `script` and starts it.
    ///
    /// The root must be a behavior (an FSM qualifies). `initial` seeds the
    /// variable environment before any node is created, so bound parameters
    /// see it from the first tick.
    pub fn init(
        script: &Script,
        owner: EntityId,
        script_owner: ProcessTag,
        initial: VarEnv,
        env: &AgentEnv,
    ) -> Result<Self, AgentError> {
        let root_config = script.root();
        if !root_config.category().satisfies(NodeCategory::Behavior) {
            return Err(AgentError::RootNotBehavior {
                script: script.name().to_string(),
                type_name: root_config.type_name().to_string(),
            });
        }

        let factory = Arc::new(NodeFactory::new(Arc::clone(&env.registry)));
        let mut ctx = NodeContext::new(owner, script_owner, initial, factory, env.clone());
        let mut root = ctx
            .create_behavior(root_config)
            .ok_or_else(|| AgentError::RootCreation {
                script: script.name().to_string(),
                type_name: root_config.type_name().to_string(),
            })?;

        root.reset(&mut ctx);
        root.activate(&mut ctx);
        debug!(
            target: "logic_graph::agent",
            script = script.name(),
            %owner,
            nodes = ctx.factory().live_nodes(),
            "agent started"
        );

        Ok(Self {
            script: script.name().to_string(),
            ctx,
            root: Some(root),
        })
    }

    /// Merges `payload` into the variables, then forwards `tag` to the
    /// active part of the tree.
    pub fn trigger(&mut self, tag: &str, payload: VarEnv) {
        let Some(root) = self.root.as_mut() else {
            warn!(
                target: "logic_graph::agent",
                script = %self.script,
                tag,
                "trigger on disposed agent"
            );
            return;
        };
        self.ctx.vars_mut().extend(payload);
        debug!(target: "logic_graph::agent", script = %self.script, tag, "trigger");
        root.on_trigger(tag, &mut self.ctx);
    }

    /// Advances the tree by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(root) = self.root.as_mut() {
            root.update(dt, &mut self.ctx);
        }
    }

    /// True once the root behavior can stop. A disposed agent is finished.
    pub fn is_finished(&self) -> bool {
        self.root
            .as_ref()
            .is_none_or(|root| root.can_stop(&self.ctx))
    }

    /// Deactivates and destroys the whole tree. Idempotent.
    pub fn dispose(&mut self) {
        let Some(mut root) = self.root.take() else {
            return;
        };
        root.deactivate(&mut self.ctx);
        self.ctx.destroy_behavior(root);

        let leaked = self.ctx.factory().live_nodes();
        if leaked > 0 {
            warn!(
                target: "logic_graph::agent",
                script = %self.script,
                leaked,
                "nodes left after dispose"
            );
        }
        debug!(target: "logic_graph::agent", script = %self.script, "agent disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.root.is_none()
    }

    pub fn script_name(&self) -> &str {
        &self.script
    }

    pub fn owner(&self) -> EntityId {
        self.ctx.owner()
    }

    pub fn vars(&self) -> &VarEnv {
        self.ctx.vars()
    }

    pub fn vars_mut(&mut self) -> &mut VarEnv {
        self.ctx.vars_mut()
    }

    /// Runtime nodes currently alive in this agent's tree.
    pub fn live_nodes(&self) -> usize {
        self.ctx.factory().live_nodes()
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        if !self.is_disposed() {
            warn!(
                target: "logic_graph::agent",
                script = %self.script,
                "agent dropped without dispose"
            );
            self.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::config::SharedConfig;
    use crate::fsm::{CustomBhvStateCfg, StateTransitionCfg};
    use crate::host::{EntityRecord, MemoryEntities, Position};
    use crate::registry::NodeRegistry;
    use crate::settings::RuntimeSettings;

    const OWNER: EntityId = EntityId(1);

    fn env() -> AgentEnv {
        let entities = Arc::new(MemoryEntities::new());
        entities.insert(OWNER, EntityRecord::actor(100, Position::default()));
        AgentEnv::new(
            Arc::new(NodeRegistry::with_builtins()),
            entities,
            RuntimeSettings::default(),
        )
    }

    fn agent(root: SharedConfig, env: &AgentEnv) -> Agent {
        Agent::init(
            &Script::new("test", root),
            OWNER,
            ProcessTag::for_cast(OWNER, 1),
            VarEnv::new(),
            env,
        )
        .unwrap()
    }

    #[test]
    fn condition_root_is_rejected() {
        let env = env();
        let err = Agent::init(
            &Script::new("bad", builder::constant(true)),
            OWNER,
            ProcessTag::for_cast(OWNER, 1),
            VarEnv::new(),
            &env,
        )
        .err()
        .unwrap();
        assert!(matches!(err, AgentError::RootNotBehavior { .. }));
    }

    #[test]
    fn runs_until_finished_then_disposes() {
        let env = env();
        let mut agent = agent(builder::sequence(vec![builder::wait(0.5)]), &env);
        assert_eq!(agent.live_nodes(), 2);

        agent.update(0.25);
        assert!(!agent.is_finished());
        agent.update(0.25);
        assert!(agent.is_finished());

        agent.dispose();
        assert!(agent.is_disposed());
        assert_eq!(agent.live_nodes(), 0);
        agent.dispose();
    }

    #[test]
    fn trigger_merges_payload_before_forwarding() {
        let env = env();
        let config = builder::fsm(
            "idle",
            vec![
                CustomBhvStateCfg::new("idle").with_transition(builder::transition(
                    StateTransitionCfg::new(builder::trigger("Cast")).on_true("cast"),
                )),
                CustomBhvStateCfg::new("cast").with_bhv(builder::wait_var("cast_time", 10.0)),
            ],
        );
        let mut agent = agent(config, &env);

        agent.trigger("Cast", VarEnv::new().with("cast_time", 0.5f32));
        assert_eq!(agent.vars().get::<f32>("cast_time"), Some(0.5));

        agent.update(0.1);
        agent.update(0.5);
        assert!(agent.is_finished());
    }

    #[test]
    fn agents_do_not_share_variables() {
        let env = env();
        let mut a = agent(builder::set_var("x", 1), &env);
        let b = agent(builder::wait(1.0), &env);
        a.update(0.1);
        assert_eq!(a.vars().get::<i32>("x"), Some(1));
        assert!(b.vars().is_empty());
    }

    #[test]
    fn unregistered_root_fails_creation() {
        let env = env();
        let root = SharedConfig::new(
            "Teleport",
            NodeCategory::Behavior,
            crate::composite::CompositeCfg::default(),
        );
        let err = Agent::init(
            &Script::new("bad", root),
            OWNER,
            ProcessTag::for_cast(OWNER, 1),
            VarEnv::new(),
            &env,
        )
        .err()
        .unwrap();
        assert!(matches!(err, AgentError::RootCreation { .. }));
    }
}

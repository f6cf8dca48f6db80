//! Built-in node catalog.

mod actions;
mod conditions;
mod delegate;

use tracing::warn;

pub use actions::{
    HealthOverTime, HealthOverTimeBhv, HealthOverTimeCfg, ModifyHealth, ModifyHealthBhv,
    ModifyHealthCfg, PlainWait, PublishEvent, PublishEventBhv, PublishEventCfg, SetVar, SetVarBhv,
    SetVarCfg, SpawnOwned, SpawnOwnedBhv, SpawnOwnedCfg, WaitCfg,
};
pub use conditions::{
    CompareOp, CompareVar, CompareVarCfg, CompareVarCond, Const, ConstCfg, ConstCond, Elapsed,
    ElapsedCfg, ElapsedCond, EventCfg, EventCond, EventLatch, HealthBelow, HealthBelowCfg,
    HealthBelowCond, Trigger, TriggerCfg, TriggerCond,
};
pub use delegate::{
    Delegate, DelegateBhv, DelegateCfg, DelegateHooks, WaitCheck, WaitCheckBhv, WaitCheckCfg,
    WaitPredicate, register_delegate, register_wait_check,
};

pub use crate::composite::{ParallelBhv, SequenceBhv};
pub use crate::decorator::{AllCond, AnyCond, NotCond};
pub use crate::fsm::{CustomBhvState, FsmBhv, StateTransitionNode};

use crate::behavior::{Bhv, FiniteTime};
use crate::config::ConfigElement;
use crate::context::NodeContext;
use crate::error::{ConfigError, ConfigResult};
use crate::host::EntityId;
use crate::registry::NodeRegistry;
use crate::value::{ValueConfig, VarType};

/// Waits for a duration.
pub type FiniteTimeBhv = Bhv<FiniteTime<PlainWait>>;

/// Registers every built-in node type.
pub fn register_builtins(registry: &mut NodeRegistry) {
    let results = [
        registry.register::<FiniteTimeBhv>(),
        registry.register::<SequenceBhv>(),
        registry.register::<ParallelBhv>(),
        registry.register::<SetVarBhv>(),
        registry.register::<ModifyHealthBhv>(),
        registry.register::<PublishEventBhv>(),
        registry.register::<HealthOverTimeBhv>(),
        registry.register::<SpawnOwnedBhv>(),
        registry.register::<ConstCond>(),
        registry.register::<NotCond>(),
        registry.register::<AllCond>(),
        registry.register::<AnyCond>(),
        registry.register::<CompareVarCond>(),
        registry.register::<HealthBelowCond>(),
        registry.register::<ElapsedCond>(),
        registry.register::<EventCond>(),
        registry.register::<TriggerCond>(),
        registry.register::<FsmBhv>(),
        registry.register::<CustomBhvState>(),
        registry.register::<StateTransitionNode>(),
    ];
    for err in results.into_iter().filter_map(Result::err) {
        warn!(target: "logic_graph::registry", %err, "built-in registration skipped");
    }
}

/// Entity a node acts on: the agent's owner or a (possibly bound) entity id.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TargetRef {
    #[default]
    Owner,
    Entity(ValueConfig<EntityId>),
}

impl TargetRef {
    /// Reads attribute `attr`. Absent, `Owner` and `Self` mean the owner.
    pub fn parse(element: &ConfigElement, attr: &str) -> ConfigResult<Self> {
        match element.attr(attr).map(str::trim) {
            None | Some("Owner") | Some("Self") => Ok(Self::Owner),
            Some(text) => ValueConfig::parse(text, EntityId::default())
                .map(Self::Entity)
                .ok_or_else(|| ConfigError::InvalidLiteral {
                    tag: element.tag.clone(),
                    attr: attr.to_string(),
                    value: text.to_string(),
                    expected: EntityId::KIND.name(),
                }),
        }
    }

    pub fn resolve(&self, ctx: &NodeContext) -> EntityId {
        match self {
            Self::Owner => ctx.owner(),
            Self::Entity(id) => id.get_value(ctx),
        }
    }

    /// Resolves the target and checks that it exists.
    fn live(&self, node: &'static str, ctx: &NodeContext) -> Option<EntityId> {
        let id = self.resolve(ctx);
        if ctx.entities().exists(id) {
            Some(id)
        } else {
            warn!(target: "logic_graph::node", node, target = %id, "target entity missing");
            None
        }
    }
}

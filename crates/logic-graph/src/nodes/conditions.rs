//! Leaf conditions and event latches.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, trace};

use super::TargetRef;
use crate::category::NodeCategory;
use crate::condition::{Cond, ConditionLogic};
use crate::config::{ConfigElement, ConfigParser, NodeConfig};
use crate::context::NodeContext;
use crate::error::{ConfigError, ConfigResult, NodeResult};
use crate::events::GameEvent;
use crate::host::EntityId;
use crate::value::ValueConfig;

pub type ConstCond = Cond<Const>;
pub type CompareVarCond = Cond<CompareVar>;
pub type HealthBelowCond = Cond<HealthBelow>;
pub type ElapsedCond = Cond<Elapsed>;
pub type EventCond = Cond<EventLatch>;
pub type TriggerCond = Cond<Trigger>;

#[derive(Debug, Default)]
pub struct ConstCfg {
    pub value: ValueConfig<bool>,
}

impl NodeConfig for ConstCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.value = element.required_value("Value")?;
        Ok(())
    }
}

/// A fixed or variable-bound boolean.
pub struct Const {
    config: Arc<ConstCfg>,
}

impl ConditionLogic for Const {
    const TYPE_NAME: &'static str = "ConstCond";

    type Config = ConstCfg;

    fn new(config: Arc<ConstCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        self.config.value.get_value(ctx)
    }
}

/// Comparison operator of [`CompareVarCond`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum CompareOp {
    #[default]
    #[strum(serialize = "Eq", serialize = "==")]
    Eq,
    #[strum(serialize = "Ne", serialize = "!=")]
    Ne,
    #[strum(serialize = "Lt", serialize = "<")]
    Lt,
    #[strum(serialize = "Le", serialize = "<=")]
    Le,
    #[strum(serialize = "Gt", serialize = ">")]
    Gt,
    #[strum(serialize = "Ge", serialize = ">=")]
    Ge,
}

impl CompareOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Default)]
pub struct CompareVarCfg {
    pub var: String,
    pub op: CompareOp,
    pub value: ValueConfig<f32>,
}

impl NodeConfig for CompareVarCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.var = element.required_attr("Var")?.trim().to_string();
        self.op = element
            .parse_attr("Op", "comparison operator")?
            .ok_or(ConfigError::MissingAttribute {
                tag: element.tag.clone(),
                attr: "Op",
            })?;
        self.value = element.required_value("Value")?;
        Ok(())
    }
}

/// Compares a numeric variable against a value. An unset or non-numeric
/// variable compares false.
pub struct CompareVar {
    config: Arc<CompareVarCfg>,
}

impl ConditionLogic for CompareVar {
    const TYPE_NAME: &'static str = "CompareVarCond";

    type Config = CompareVarCfg;

    fn new(config: Arc<CompareVarCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        let Some(lhs) = ctx.vars().get_value(&self.config.var).and_then(|v| v.as_f64()) else {
            return false;
        };
        let rhs = f64::from(self.config.value.get_value(ctx));
        self.config.op.apply(lhs, rhs)
    }
}

#[derive(Debug, Default)]
pub struct HealthBelowCfg {
    pub target: TargetRef,
    pub threshold: ValueConfig<i32>,
}

impl NodeConfig for HealthBelowCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.target = TargetRef::parse(element, "Target")?;
        self.threshold = element.required_value("Threshold")?;
        Ok(())
    }
}

/// True while the target's health is below a threshold. False for missing
/// targets.
pub struct HealthBelow {
    config: Arc<HealthBelowCfg>,
}

impl ConditionLogic for HealthBelow {
    const TYPE_NAME: &'static str = "HealthBelowCond";

    type Config = HealthBelowCfg;

    fn new(config: Arc<HealthBelowCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        let target = self.config.target.resolve(ctx);
        ctx.entities()
            .health(target)
            .is_some_and(|health| health < self.config.threshold.get_value(ctx))
    }
}

#[derive(Debug, Default)]
pub struct ElapsedCfg {
    pub seconds: ValueConfig<f32>,
}

impl NodeConfig for ElapsedCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.seconds = element.required_value("Seconds")?;
        Ok(())
    }
}

/// True once `Seconds` of update time have passed since the last reset.
pub struct Elapsed {
    config: Arc<ElapsedCfg>,
    elapsed: f32,
}

impl ConditionLogic for Elapsed {
    const TYPE_NAME: &'static str = "ElapsedCond";

    type Config = ElapsedCfg;

    fn new(config: Arc<ElapsedCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config,
            elapsed: 0.0,
        })
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.elapsed = 0.0;
    }

    fn on_update(&mut self, dt: f32, _ctx: &mut NodeContext) {
        self.elapsed += dt;
    }

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        let left = self.config.seconds.get_value(ctx) - self.elapsed;
        left <= 0.0 || ctx.is_zero(left)
    }
}

#[derive(Debug, Default)]
pub struct EventCfg {
    pub event: String,
    /// Only count events whose source is the agent's owner.
    pub owner_only: bool,
}

impl NodeConfig for EventCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.event = element.required_attr("Event")?.trim().to_string();
        self.owner_only = element.parse_attr("OwnerOnly", "bool")?.unwrap_or(false);
        Ok(())
    }
}

/// Latches once a named bus event is received while active.
///
/// The subscription lives between activate and deactivate; a lagged
/// receiver counts as having seen the event.
pub struct EventLatch {
    config: Arc<EventCfg>,
    rx: Option<broadcast::Receiver<GameEvent>>,
    fired: bool,
}

impl EventLatch {
    fn drain(&mut self, owner: EntityId) {
        let Some(rx) = self.rx.as_mut() else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if !self.config.owner_only || event.source == owner {
                        self.fired = true;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    trace!(
                        target: "logic_graph::events",
                        event = %self.config.event,
                        skipped,
                        "receiver lagged"
                    );
                    self.fired = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    self.rx = None;
                    break;
                }
            }
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl ConditionLogic for EventLatch {
    const TYPE_NAME: &'static str = "EventCond";
    const CATEGORY: NodeCategory = NodeCategory::Event;

    type Config = EventCfg;

    fn new(config: Arc<EventCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config,
            rx: None,
            fired: false,
        })
    }

    fn on_activate(&mut self, ctx: &mut NodeContext) {
        if self.rx.is_none() {
            self.rx = ctx.events().subscribe(&self.config.event);
        }
    }

    fn on_deactivate(&mut self, _ctx: &mut NodeContext) {
        self.rx = None;
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.fired = false;
        if let Some(rx) = self.rx.as_mut() {
            *rx = rx.resubscribe();
        }
    }

    fn on_update(&mut self, _dt: f32, ctx: &mut NodeContext) {
        self.drain(ctx.owner());
    }

    fn evaluate(&mut self, ctx: &NodeContext) -> bool {
        self.drain(ctx.owner());
        self.fired
    }
}

#[derive(Debug, Default)]
pub struct TriggerCfg {
    pub tag: String,
}

impl NodeConfig for TriggerCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.tag = element.required_attr("Tag")?.trim().to_string();
        Ok(())
    }
}

/// Latches when the agent receives a matching trigger while active.
pub struct Trigger {
    config: Arc<TriggerCfg>,
    fired: bool,
}

impl ConditionLogic for Trigger {
    const TYPE_NAME: &'static str = "TriggerCond";
    const CATEGORY: NodeCategory = NodeCategory::Event;

    type Config = TriggerCfg;

    fn new(config: Arc<TriggerCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config,
            fired: false,
        })
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.fired = false;
    }

    fn on_trigger(&mut self, tag: &str, _ctx: &mut NodeContext) {
        if tag == self.config.tag {
            debug!(target: "logic_graph::node", tag, "trigger latched");
            self.fired = true;
        }
    }

    fn evaluate(&mut self, _ctx: &NodeContext) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::condition::ConditionNode;
    use crate::config::SharedConfig;
    use crate::context::test_support::{self, OWNER};
    use crate::host::{EntityRecord, Position};
    use crate::registry::NodeRegistry;
    use crate::var_env::VarEnv;

    fn start(config: &SharedConfig, ctx: &mut NodeContext) -> Box<dyn ConditionNode> {
        let mut node = ctx.create_condition(config).unwrap();
        node.reset(ctx);
        node.activate(ctx);
        node
    }

    #[test]
    fn compare_var_against_bound_value() {
        let registry = NodeRegistry::with_builtins();
        let parser = ConfigParser::new(&registry);
        let config = parser
            .parse(
                &ConfigElement::new("CompareVarCond")
                    .with_attr("Var", "charges")
                    .with_attr("Op", ">=")
                    .with_attr("Value", "BB#needed"),
            )
            .unwrap()
            .unwrap();

        let (mut ctx, _) = test_support::context();
        let mut node = start(&config, &mut ctx);
        assert!(!node.check(&ctx), "unset variable compares false");

        ctx.vars_mut().set("charges", 2);
        assert!(node.check(&ctx), "falls back to default 0");

        ctx.vars_mut().set("needed", 3.0f32);
        assert!(!node.check(&ctx));
        ctx.vars_mut().set("charges", 3i64);
        assert!(node.check(&ctx));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let registry = NodeRegistry::with_builtins();
        let parser = ConfigParser::new(&registry);
        let err = parser
            .parse(
                &ConfigElement::new("CompareVarCond")
                    .with_attr("Var", "x")
                    .with_attr("Op", "~")
                    .with_attr("Value", "1"),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLiteral { .. }));
    }

    #[test]
    fn health_below_threshold() {
        let (mut ctx, entities) = test_support::context();
        let config = SharedConfig::of::<HealthBelowCond>(HealthBelowCfg {
            target: TargetRef::Owner,
            threshold: ValueConfig::literal(50),
        });
        let mut node = start(&config, &mut ctx);
        assert!(!node.check(&ctx));

        entities.insert(OWNER, EntityRecord::actor(49, Position::default()));
        assert!(node.check(&ctx));

        entities.remove(OWNER);
        assert!(!node.check(&ctx));
    }

    #[test]
    fn elapsed_counts_update_time() {
        let (mut ctx, _) = test_support::context();
        let config = SharedConfig::of::<ElapsedCond>(ElapsedCfg {
            seconds: ValueConfig::literal(0.3),
        });
        let mut node = start(&config, &mut ctx);

        node.update(0.1, &mut ctx);
        node.update(0.1, &mut ctx);
        assert!(!node.check(&ctx));
        node.update(0.1, &mut ctx);
        assert!(node.check(&ctx));

        node.reset(&mut ctx);
        assert!(!node.check(&ctx));
    }

    #[test]
    fn event_latches_while_subscribed() {
        let (mut ctx, _) = test_support::context();
        ctx.publish("Boom", VarEnv::new());

        let mut node = start(&builder::event("Boom"), &mut ctx);
        assert!(!node.check(&ctx), "events before activation are not seen");

        ctx.publish("Boom", VarEnv::new());
        assert!(node.check(&ctx));
        assert!(node.check(&ctx), "latched");

        node.reset(&mut ctx);
        assert!(!node.check(&ctx));

        node.deactivate(&mut ctx);
        assert_eq!(ctx.events().subscriber_count("Boom"), 0);
    }

    #[test]
    fn trigger_latches_on_matching_tag() {
        let (mut ctx, _) = test_support::context();
        let mut node = start(&builder::trigger("Go"), &mut ctx);

        node.on_trigger("Stop", &mut ctx);
        assert!(!node.check(&ctx));
        node.on_trigger("Go", &mut ctx);
        assert!(node.check(&ctx));

        node.reset(&mut ctx);
        assert!(!node.check(&ctx));
    }

    #[test]
    fn inactive_trigger_ignores_tags() {
        let (mut ctx, _) = test_support::context();
        let mut node = ctx.create_condition(&builder::trigger("Go")).unwrap();
        node.on_trigger("Go", &mut ctx);
        node.activate(&mut ctx);
        assert!(!node.check(&ctx));
    }
}

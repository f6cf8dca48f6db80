//! Behaviors with side effects on variables, entities and the event bus.

use std::sync::Arc;

use tracing::{debug, warn};

use super::TargetRef;
use crate::behavior::{BehaviorLogic, Bhv, FiniteTime, FiniteTimeLogic};
use crate::config::{ConfigElement, ConfigParser, NodeConfig};
use crate::context::NodeContext;
use crate::error::{ConfigError, ConfigResult, NodeResult};
use crate::host::EntityId;
use crate::value::{Value, ValueConfig, ValueKind};
use crate::var_env::VarEnv;

pub type SetVarBhv = Bhv<SetVar>;
pub type ModifyHealthBhv = Bhv<ModifyHealth>;
pub type PublishEventBhv = Bhv<PublishEvent>;
pub type HealthOverTimeBhv = Bhv<FiniteTime<HealthOverTime>>;
pub type SpawnOwnedBhv = Bhv<SpawnOwned>;

/// Adds `delta` to the health of `id`, never going below zero.
fn adjust_health(id: EntityId, delta: i32, ctx: &NodeContext) {
    let entities = ctx.entities();
    let Some(health) = entities.health(id) else {
        warn!(target: "logic_graph::node", target = %id, "target has no health");
        return;
    };
    let health = health.saturating_add(delta).max(0);
    entities.set_health(id, health);
    debug!(target: "logic_graph::node", target = %id, delta, health, "health changed");
}

#[derive(Debug, Default)]
pub struct WaitCfg {
    pub duration: ValueConfig<f32>,
    /// Published once the duration has elapsed.
    pub end_event: Option<String>,
}

impl WaitCfg {
    pub fn new(duration: ValueConfig<f32>) -> Self {
        Self {
            duration,
            end_event: None,
        }
    }
}

impl NodeConfig for WaitCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.duration = element.required_value("Duration")?;
        self.end_event = element.attr("EndEvent").map(str::to_string);
        Ok(())
    }
}

/// Does nothing for its duration.
pub struct PlainWait {
    config: Arc<WaitCfg>,
}

impl FiniteTimeLogic for PlainWait {
    const TYPE_NAME: &'static str = "FiniteTimeBhv";

    type Config = WaitCfg;

    fn new(config: &Arc<WaitCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config: Arc::clone(config),
        })
    }

    fn duration(config: &WaitCfg) -> &ValueConfig<f32> {
        &config.duration
    }

    fn on_duration_end(&mut self, ctx: &mut NodeContext) {
        if let Some(event) = self.config.end_event.as_deref() {
            ctx.publish(event, VarEnv::new());
        }
    }
}

#[derive(Debug, Default)]
pub struct HealthOverTimeCfg {
    pub duration: ValueConfig<f32>,
    /// Health change per second; negative values deal damage.
    pub per_second: ValueConfig<f32>,
    pub target: TargetRef,
}

impl NodeConfig for HealthOverTimeCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.duration = element.required_value("Duration")?;
        self.per_second = element.required_value("PerSecond")?;
        self.target = TargetRef::parse(element, "Target")?;
        Ok(())
    }
}

/// Changes health at a steady rate while its duration runs.
///
/// Whole points are applied as they accumulate; the rounded fraction left
/// over is applied when the duration ends.
pub struct HealthOverTime {
    config: Arc<HealthOverTimeCfg>,
    target: Option<EntityId>,
    rate: f32,
    pending: f32,
}

impl HealthOverTime {
    fn apply(&mut self, ctx: &NodeContext, whole: i32) {
        if whole == 0 {
            return;
        }
        if let Some(target) = self.target {
            adjust_health(target, whole, ctx);
        }
        self.pending -= whole as f32;
    }
}

impl FiniteTimeLogic for HealthOverTime {
    const TYPE_NAME: &'static str = "HealthOverTimeBhv";

    type Config = HealthOverTimeCfg;

    fn new(config: &Arc<HealthOverTimeCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config: Arc::clone(config),
            target: None,
            rate: 0.0,
            pending: 0.0,
        })
    }

    fn duration(config: &HealthOverTimeCfg) -> &ValueConfig<f32> {
        &config.duration
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        self.target = self.config.target.live(Self::TYPE_NAME, ctx);
        self.rate = self.config.per_second.get_value(ctx);
        self.pending = 0.0;
    }

    fn on_tick(&mut self, consumed: f32, ctx: &mut NodeContext) {
        self.pending += self.rate * consumed;
        let whole = self.pending.trunc() as i32;
        self.apply(ctx, whole);
    }

    fn on_duration_end(&mut self, ctx: &mut NodeContext) {
        let rest = self.pending.round() as i32;
        self.apply(ctx, rest);
        self.pending = 0.0;
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.target = None;
        self.pending = 0.0;
    }
}

#[derive(Debug)]
pub struct SetVarCfg {
    pub var: String,
    pub value: Value,
}

impl Default for SetVarCfg {
    fn default() -> Self {
        Self {
            var: String::new(),
            value: Value::Bool(false),
        }
    }
}

impl SetVarCfg {
    pub fn new(var: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            var: var.into(),
            value: value.into(),
        }
    }
}

impl NodeConfig for SetVarCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.var = element.required_attr("Var")?.trim().to_string();
        if self.var.is_empty() {
            return Err(element.invalid("Var must not be empty"));
        }
        let kind: ValueKind = element
            .parse_attr("Type", "value type")?
            .ok_or(ConfigError::MissingAttribute {
                tag: element.tag.clone(),
                attr: "Type",
            })?;
        let text = element.required_attr("Value")?;
        self.value = kind
            .parse_literal(text)
            .ok_or_else(|| ConfigError::InvalidLiteral {
                tag: element.tag.clone(),
                attr: "Value".to_string(),
                value: text.to_string(),
                expected: kind.name(),
            })?;
        Ok(())
    }
}

/// Writes a typed literal into the agent's variables. Instant.
pub struct SetVar {
    config: Arc<SetVarCfg>,
}

impl BehaviorLogic for SetVar {
    const TYPE_NAME: &'static str = "SetVarBhv";

    type Config = SetVarCfg;

    fn new(config: Arc<SetVarCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        ctx.vars_mut()
            .set_value(self.config.var.clone(), self.config.value.clone());
    }
}

#[derive(Debug, Default)]
pub struct ModifyHealthCfg {
    pub target: TargetRef,
    pub amount: ValueConfig<i32>,
}

impl NodeConfig for ModifyHealthCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.target = TargetRef::parse(element, "Target")?;
        self.amount = element.required_value("Amount")?;
        Ok(())
    }
}

/// Adds `Amount` to the target's health once. Instant.
pub struct ModifyHealth {
    config: Arc<ModifyHealthCfg>,
}

impl BehaviorLogic for ModifyHealth {
    const TYPE_NAME: &'static str = "ModifyHealthBhv";

    type Config = ModifyHealthCfg;

    fn new(config: Arc<ModifyHealthCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        if let Some(target) = self.config.target.live(Self::TYPE_NAME, ctx) {
            adjust_health(target, self.config.amount.get_value(ctx), ctx);
        }
    }
}

#[derive(Debug, Default)]
pub struct PublishEventCfg {
    pub event: String,
    /// Variables copied into the event payload.
    pub vars: Vec<String>,
}

impl PublishEventCfg {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            vars: Vec::new(),
        }
    }
}

impl NodeConfig for PublishEventCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.event = element.required_attr("Event")?.trim().to_string();
        self.vars = element
            .attr("Vars")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(())
    }
}

/// Publishes an event with the owner as source. Instant.
pub struct PublishEvent {
    config: Arc<PublishEventCfg>,
}

impl BehaviorLogic for PublishEvent {
    const TYPE_NAME: &'static str = "PublishEventBhv";

    type Config = PublishEventCfg;

    fn new(config: Arc<PublishEventCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        let payload = self
            .config
            .vars
            .iter()
            .filter_map(|id| {
                ctx.vars()
                    .get_value(id)
                    .map(|value| (id.clone(), value.clone()))
            })
            .collect();
        ctx.publish(&self.config.event, payload);
    }
}

#[derive(Debug, Default)]
pub struct SpawnOwnedCfg {
    pub kind: String,
    /// Variable receiving the spawned entity id.
    pub store_as: Option<String>,
}

impl NodeConfig for SpawnOwnedCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.kind = element.required_attr("Kind")?.trim().to_string();
        self.store_as = element.attr("StoreAs").map(str::to_string);
        Ok(())
    }
}

/// Spawns a secondary object owned by the running script. Instant.
///
/// Objects are released by the host when the script owner is disposed.
pub struct SpawnOwned {
    config: Arc<SpawnOwnedCfg>,
}

impl BehaviorLogic for SpawnOwned {
    const TYPE_NAME: &'static str = "SpawnOwnedBhv";

    type Config = SpawnOwnedCfg;

    fn new(config: Arc<SpawnOwnedCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self { config })
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        let spawned = ctx
            .entities()
            .spawn_owned(ctx.owner(), &self.config.kind, ctx.script_owner());
        match spawned {
            Some(id) => {
                debug!(
                    target: "logic_graph::node",
                    kind = %self.config.kind,
                    spawned = %id,
                    "spawned owned object"
                );
                if let Some(var) = self.config.store_as.as_deref() {
                    ctx.vars_mut().set(var, id);
                }
            }
            None => warn!(
                target: "logic_graph::node",
                kind = %self.config.kind,
                "host refused to spawn owned object"
            ),
        }
    }
}

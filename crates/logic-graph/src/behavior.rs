//! Behavior nodes.
//!
//! A behavior runs across ticks. [`BehaviorNode::update`] returns the part of
//! `dt` it did not consume so that containers can feed it to the next
//! behavior within the same tick; a behavior that does nothing returns `dt`
//! unchanged and is treated as instant.
//!
//! Concrete behaviors implement [`BehaviorLogic`] and are wrapped in [`Bhv`],
//! which owns lifecycle bookkeeping and the once-per-run `on_begin` hook.
//! Time-bounded behaviors implement [`FiniteTimeLogic`] and are wrapped in
//! [`FiniteTime`].

use std::sync::Arc;

use tracing::warn;

use crate::category::NodeCategory;
use crate::config::{NodeConfig, SharedConfig};
use crate::context::NodeContext;
use crate::error::{NodeError, NodeResult};
use crate::node::{AnyNode, CustomNode, NodeCore};
use crate::registry::RegisteredNode;
use crate::status::Lifecycle;
use crate::value::ValueConfig;

/// A runtime node that can run across ticks.
pub trait BehaviorNode: CustomNode {
    /// Advances by `dt` seconds and returns the unconsumed remainder.
    fn update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32;

    /// Returns true once the behavior has nothing left to do.
    fn can_stop(&self, ctx: &NodeContext) -> bool;
}

/// Node-specific part of a behavior.
///
/// All hooks run only in valid lifecycle states; [`Bhv`] filters the rest.
pub trait BehaviorLogic: Send + Sized + 'static {
    const TYPE_NAME: &'static str;
    const CATEGORY: NodeCategory = NodeCategory::Behavior;

    type Config: NodeConfig + Default;

    /// Builds the logic, creating declared children through `ctx`.
    fn new(config: Arc<Self::Config>, ctx: &mut NodeContext) -> NodeResult<Self>;

    fn on_activate(&mut self, _ctx: &mut NodeContext) {}

    fn on_deactivate(&mut self, _ctx: &mut NodeContext) {}

    fn on_reset(&mut self, _ctx: &mut NodeContext) {}

    /// First update after a reset.
    fn on_begin(&mut self, _ctx: &mut NodeContext) {}

    fn on_update(&mut self, dt: f32, _ctx: &mut NodeContext) -> f32 {
        dt
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        true
    }

    fn on_trigger(&mut self, _tag: &str, _ctx: &mut NodeContext) {}

    /// Releases children. Called once.
    fn on_destroy(&mut self, _ctx: &mut NodeContext) {}
}

/// Lifecycle wrapper turning a [`BehaviorLogic`] into a [`BehaviorNode`].
pub struct Bhv<L: BehaviorLogic> {
    core: NodeCore,
    begun: bool,
    logic: Option<L>,
}

impl<L: BehaviorLogic> Bhv<L> {
    pub fn new() -> Self {
        Self {
            core: NodeCore::default(),
            begun: false,
            logic: None,
        }
    }

    pub fn logic(&self) -> Option<&L> {
        self.logic.as_ref()
    }

    pub fn logic_mut(&mut self) -> Option<&mut L> {
        self.logic.as_mut()
    }

    /// True between the first update after a reset and the next reset.
    pub fn has_begun(&self) -> bool {
        self.begun
    }
}

impl<L: BehaviorLogic> Default for Bhv<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: BehaviorLogic> RegisteredNode for Bhv<L> {
    const TYPE_NAME: &'static str = L::TYPE_NAME;
    const CATEGORY: NodeCategory = L::CATEGORY;

    type Config = L::Config;

    fn instantiate() -> AnyNode {
        AnyNode::Behavior(Box::new(Self::new()))
    }
}

impl<L: BehaviorLogic> CustomNode for Bhv<L> {
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
        if !self.core.can_reset(L::TYPE_NAME) {
            return;
        }
        self.begun = false;
        if let Some(logic) = self.logic.as_mut() {
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
        if !self.core.status().is_active() {
            return;
        }
        if let Some(logic) = self.logic.as_mut() {
            logic.on_trigger(tag, ctx);
        }
    }
}

impl<L: BehaviorLogic> BehaviorNode for Bhv<L> {
    fn update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if !self.core.can_update(L::TYPE_NAME) {
            return dt;
        }
        let dt = if dt < 0.0 {
            warn!(target: "logic_graph::node", node = L::TYPE_NAME, dt, "negative dt clamped");
            0.0
        } else {
            dt
        };
        let Some(logic) = self.logic.as_mut() else {
            return dt;
        };

        if !self.begun {
            self.begun = true;
            logic.on_begin(ctx);
        }
        logic.on_update(dt, ctx)
    }

    fn can_stop(&self, ctx: &NodeContext) -> bool {
        self.logic.as_ref().is_none_or(|logic| logic.can_stop(ctx))
    }
}

/// Node-specific part of a time-bounded behavior.
pub trait FiniteTimeLogic: Send + Sized + 'static {
    const TYPE_NAME: &'static str;

    type Config: NodeConfig + Default;

    fn new(config: &Arc<Self::Config>, ctx: &mut NodeContext) -> NodeResult<Self>;

    /// Duration parameter of `config`, in seconds.
    fn duration(config: &Self::Config) -> &ValueConfig<f32>;

    fn on_begin(&mut self, _ctx: &mut NodeContext) {}

    /// Called every update with the time consumed from the duration.
    fn on_tick(&mut self, _consumed: f32, _ctx: &mut NodeContext) {}

    /// Called once, when the duration first reaches zero.
    fn on_duration_end(&mut self, _ctx: &mut NodeContext) {}

    fn on_reset(&mut self, _ctx: &mut NodeContext) {}

    fn on_destroy(&mut self, _ctx: &mut NodeContext) {}
}

/// A behavior that completes after a bounded duration.
///
/// The remaining duration only decreases while active and never goes below
/// zero. The duration is resolved from the config on reset and again on
/// begin, so variables set by a trigger are honored.
pub struct FiniteTime<F: FiniteTimeLogic> {
    config: Arc<F::Config>,
    total: f32,
    remaining: f32,
    done: bool,
    inner: F,
}

impl<F: FiniteTimeLogic> FiniteTime<F> {
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn rearm(&mut self, ctx: &NodeContext) {
        let duration = F::duration(&self.config).get_value(ctx);
        self.total = if duration < 0.0 || duration.is_nan() {
            warn!(
                target: "logic_graph::node",
                node = F::TYPE_NAME,
                duration,
                "negative duration clamped to zero"
            );
            0.0
        } else {
            duration
        };
        self.remaining = self.total;
        self.done = false;
    }
}

impl<F: FiniteTimeLogic> BehaviorLogic for FiniteTime<F> {
    const TYPE_NAME: &'static str = F::TYPE_NAME;

    type Config = F::Config;

    fn new(config: Arc<Self::Config>, ctx: &mut NodeContext) -> NodeResult<Self> {
        let inner = F::new(&config, ctx)?;
        let mut this = Self {
            config,
            total: 0.0,
            remaining: 0.0,
            done: false,
            inner,
        };
        this.rearm(ctx);
        Ok(this)
    }

    fn on_reset(&mut self, ctx: &mut NodeContext) {
        self.rearm(ctx);
        self.inner.on_reset(ctx);
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        self.rearm(ctx);
        self.inner.on_begin(ctx);
    }

    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if self.done {
            return dt;
        }

        let consumed = dt.min(self.remaining);
        self.remaining -= consumed;
        if ctx.is_zero(self.remaining) {
            self.remaining = 0.0;
        }
        self.inner.on_tick(consumed, ctx);

        if self.remaining == 0.0 {
            self.done = true;
            self.inner.on_duration_end(ctx);
        }
        (dt - consumed).max(0.0)
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.done
    }

    fn on_destroy(&mut self, ctx: &mut NodeContext) {
        self.inner.on_destroy(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigElement, ConfigParser};
    use crate::context::test_support;
    use crate::error::ConfigResult;
    use crate::registry::NodeRegistry;

    #[derive(Debug, Default)]
    struct CountingCfg {
        duration: ValueConfig<f32>,
    }

    impl NodeConfig for CountingCfg {
        fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
            self.duration = element.required_value("Duration")?;
            Ok(())
        }
    }

    struct Counting {
        ends: usize,
        ticked: f32,
    }

    impl FiniteTimeLogic for Counting {
        const TYPE_NAME: &'static str = "CountingBhv";
        type Config = CountingCfg;

        fn new(_: &Arc<CountingCfg>, _: &mut NodeContext) -> NodeResult<Self> {
            Ok(Self {
                ends: 0,
                ticked: 0.0,
            })
        }

        fn duration(config: &CountingCfg) -> &ValueConfig<f32> {
            &config.duration
        }

        fn on_tick(&mut self, consumed: f32, _: &mut NodeContext) {
            self.ticked += consumed;
        }

        fn on_duration_end(&mut self, _: &mut NodeContext) {
            self.ends += 1;
        }
    }

    type CountingBhv = Bhv<FiniteTime<Counting>>;

    fn counting(duration: f32, ctx: &mut NodeContext) -> CountingBhv {
        let config = SharedConfig::of::<CountingBhv>(CountingCfg {
            duration: ValueConfig::literal(duration),
        });
        let mut node = CountingBhv::new();
        node.initialize(&config, ctx).unwrap();
        node.reset(ctx);
        node.activate(ctx);
        node
    }

    fn logic(node: &CountingBhv) -> &FiniteTime<Counting> {
        node.logic().unwrap()
    }

    #[test]
    fn duration_end_fires_once_when_consumed() {
        let (mut ctx, _) = test_support::context();
        let mut node = counting(1.0, &mut ctx);

        for _ in 0..3 {
            assert_eq!(node.update(0.25, &mut ctx), 0.0);
            assert!(!node.can_stop(&ctx));
        }
        let rest = node.update(0.5, &mut ctx);
        assert!((rest - 0.25).abs() < 1e-6);
        assert!(node.can_stop(&ctx));
        assert_eq!(logic(&node).inner().ends, 1);
        assert!((logic(&node).inner().ticked - 1.0).abs() < 1e-6);

        assert_eq!(node.update(0.5, &mut ctx), 0.5);
        assert_eq!(logic(&node).inner().ends, 1);
        assert_eq!(logic(&node).remaining(), 0.0);
    }

    #[test]
    fn float_drift_still_completes() {
        let (mut ctx, _) = test_support::context();
        let mut node = counting(0.3, &mut ctx);

        for _ in 0..3 {
            node.update(0.1, &mut ctx);
        }
        assert!(node.can_stop(&ctx));
        assert_eq!(logic(&node).inner().ends, 1);
    }

    #[test]
    fn zero_duration_completes_on_first_update() {
        let (mut ctx, _) = test_support::context();
        let mut node = counting(0.0, &mut ctx);

        assert!(!node.can_stop(&ctx));
        assert_eq!(node.update(0.2, &mut ctx), 0.2);
        assert!(node.can_stop(&ctx));
    }

    #[test]
    fn negative_duration_is_clamped() {
        let (mut ctx, _) = test_support::context();
        let mut node = counting(-2.0, &mut ctx);

        assert_eq!(logic(&node).total(), 0.0);
        node.update(0.1, &mut ctx);
        assert!(node.can_stop(&ctx));
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let (mut ctx, _) = test_support::context();
        let mut node = counting(2.0, &mut ctx);
        node.update(1.5, &mut ctx);

        node.reset(&mut ctx);
        let once = (
            logic(&node).remaining(),
            logic(&node).is_done(),
            node.has_begun(),
        );
        node.reset(&mut ctx);
        let twice = (
            logic(&node).remaining(),
            logic(&node).is_done(),
            node.has_begun(),
        );

        assert_eq!(once, twice);
        assert_eq!(once, (2.0, false, false));
    }

    #[test]
    fn duration_binds_to_variable() {
        let (mut ctx, _) = test_support::context();
        let config = SharedConfig::of::<CountingBhv>(CountingCfg {
            duration: ValueConfig::variable("cast_time", 5.0),
        });
        ctx.vars_mut().set("cast_time", 0.5f32);

        let mut node = CountingBhv::new();
        node.initialize(&config, &mut ctx).unwrap();
        node.activate(&mut ctx);
        node.update(0.5, &mut ctx);
        assert!(node.can_stop(&ctx));
    }

    #[test]
    fn update_before_activate_is_ignored() {
        let (mut ctx, _) = test_support::context();
        let config = SharedConfig::of::<CountingBhv>(CountingCfg {
            duration: ValueConfig::literal(1.0),
        });
        let mut node = CountingBhv::new();

        assert_eq!(node.update(0.5, &mut ctx), 0.5);
        node.initialize(&config, &mut ctx).unwrap();
        assert_eq!(node.update(0.5, &mut ctx), 0.5);
        assert!(!node.has_begun());
    }

    #[test]
    fn wrong_config_type_fails_initialization() {
        let (mut ctx, _) = test_support::context();
        let config = crate::builder::wait(1.0);
        let mut node = CountingBhv::new();
        assert!(matches!(
            node.initialize(&config, &mut ctx),
            Err(NodeError::ConfigType { node: "CountingBhv", .. })
        ));
        assert_eq!(node.lifecycle(), Lifecycle::Uninitialized);
    }

    #[test]
    fn parsed_from_markup() {
        let mut registry = NodeRegistry::new();
        registry.register::<CountingBhv>().unwrap();
        let parser = ConfigParser::new(&registry);

        let config = parser
            .parse(&ConfigElement::new("CountingBhv").with_attr("Duration", "BB#t"))
            .unwrap()
            .unwrap();
        let body = config.downcast_ref::<CountingCfg>().unwrap();
        assert_eq!(body.duration.var_id(), Some("t"));
    }
}

//! Host-extensible behaviors.
//!
//! Hosts register these under their own type names with closures captured
//! in the config constructor, so scripts can use host-specific waits and
//! side effects without a new node type.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::behavior::{BehaviorLogic, Bhv};
use crate::category::NodeCategory;
use crate::config::{ConfigElement, ConfigParser, NodeConfig};
use crate::context::NodeContext;
use crate::error::{ConfigResult, NodeResult, RegistryError};
use crate::registry::{NodeRegistry, RegisteredNode};

pub type WaitCheckBhv = Bhv<WaitCheck>;
pub type DelegateBhv = Bhv<Delegate>;

/// Decides whether a [`WaitCheck`] may stop.
pub type WaitPredicate = Arc<dyn Fn(&WaitCheck, &NodeContext) -> bool + Send + Sync>;

/// Lifecycle callback of a [`Delegate`].
pub type DelegateHook = Arc<dyn Fn(&mut Delegate, &mut NodeContext) + Send + Sync>;

/// Update callback of a [`Delegate`]; returns the unconsumed `dt`.
pub type DelegateUpdate = Arc<dyn Fn(&mut Delegate, f32, &mut NodeContext) -> f32 + Send + Sync>;

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[derive(Clone, Default)]
pub struct WaitCheckCfg {
    pub predicate: Option<WaitPredicate>,
    /// Markup attributes, readable by the predicate.
    pub attrs: Vec<(String, String)>,
}

impl WaitCheckCfg {
    pub fn new(predicate: WaitPredicate) -> Self {
        Self {
            predicate: Some(predicate),
            attrs: Vec::new(),
        }
    }
}

impl fmt::Debug for WaitCheckCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitCheckCfg")
            .field("predicate", &self.predicate.is_some())
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl NodeConfig for WaitCheckCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.attrs = element.attrs.clone();
        Ok(())
    }
}

/// Waits until a host predicate holds.
///
/// The predicate is checked at the start of every update; once it holds
/// the node stops without consuming `dt`. Without a predicate the node
/// completes immediately.
pub struct WaitCheck {
    config: Arc<WaitCheckCfg>,
    elapsed: f32,
    satisfied: bool,
}

impl WaitCheck {
    pub fn attr(&self, name: &str) -> Option<&str> {
        attr(&self.config.attrs, name)
    }

    /// Time spent waiting since the last reset.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl BehaviorLogic for WaitCheck {
    const TYPE_NAME: &'static str = "WaitCheckBhv";

    type Config = WaitCheckCfg;

    fn new(config: Arc<WaitCheckCfg>, _ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            config,
            elapsed: 0.0,
            satisfied: false,
        })
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.elapsed = 0.0;
        self.satisfied = false;
    }

    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if self.satisfied {
            return dt;
        }
        let predicate = self.config.predicate.clone();
        self.satisfied = predicate.is_none_or(|holds| holds(self, ctx));
        if self.satisfied {
            dt
        } else {
            self.elapsed += dt;
            0.0
        }
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.satisfied
    }
}

/// Registers a [`WaitCheckBhv`] under `name` using `predicate`.
pub fn register_wait_check(
    registry: &mut NodeRegistry,
    name: &str,
    predicate: WaitPredicate,
) -> Result<(), RegistryError> {
    registry.register_with(
        name,
        NodeCategory::Behavior,
        TypeId::of::<WaitCheckBhv>(),
        Arc::new(move || {
            Box::new(WaitCheckCfg::new(Arc::clone(&predicate))) as Box<dyn NodeConfig>
        }),
        Arc::new(WaitCheckBhv::instantiate),
    )
}

/// Host callbacks run by a [`Delegate`].
#[derive(Clone, Default)]
pub struct DelegateHooks {
    pub on_initialize: Option<DelegateHook>,
    pub on_begin: Option<DelegateHook>,
    pub on_update: Option<DelegateUpdate>,
    pub on_destroy: Option<DelegateHook>,
}

#[derive(Clone, Default)]
pub struct DelegateCfg {
    pub hooks: DelegateHooks,
    pub attrs: Vec<(String, String)>,
}

impl DelegateCfg {
    pub fn new(hooks: DelegateHooks) -> Self {
        Self {
            hooks,
            attrs: Vec::new(),
        }
    }
}

impl fmt::Debug for DelegateCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = &self.hooks;
        f.debug_struct("DelegateCfg")
            .field("on_initialize", &hooks.on_initialize.is_some())
            .field("on_begin", &hooks.on_begin.is_some())
            .field("on_update", &hooks.on_update.is_some())
            .field("on_destroy", &hooks.on_destroy.is_some())
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl NodeConfig for DelegateCfg {
    fn parse(&mut self, element: &ConfigElement, _: &ConfigParser<'_>) -> ConfigResult<()> {
        self.attrs = element.attrs.clone();
        Ok(())
    }
}

/// Runs host callbacks at lifecycle points.
///
/// Without an update hook the node is instant. With one, it runs until the
/// hook calls [`Delegate::finish`].
pub struct Delegate {
    config: Arc<DelegateCfg>,
    finished: bool,
}

impl Delegate {
    pub fn attr(&self, name: &str) -> Option<&str> {
        attr(&self.config.attrs, name)
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl BehaviorLogic for Delegate {
    const TYPE_NAME: &'static str = "DelegateBhv";

    type Config = DelegateCfg;

    fn new(config: Arc<DelegateCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        let hook = config.hooks.on_initialize.clone();
        let mut this = Self {
            config,
            finished: false,
        };
        if let Some(hook) = hook {
            hook(&mut this, ctx);
        }
        Ok(this)
    }

    fn on_reset(&mut self, _ctx: &mut NodeContext) {
        self.finished = false;
    }

    fn on_begin(&mut self, ctx: &mut NodeContext) {
        if let Some(hook) = self.config.hooks.on_begin.clone() {
            hook(self, ctx);
        }
    }

    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        match self.config.hooks.on_update.clone() {
            Some(hook) => hook(self, dt, ctx),
            None => dt,
        }
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.finished || self.config.hooks.on_update.is_none()
    }

    fn on_destroy(&mut self, ctx: &mut NodeContext) {
        if let Some(hook) = self.config.hooks.on_destroy.clone() {
            hook(self, ctx);
        }
    }
}

/// Registers a [`DelegateBhv`] under `name` running `hooks`.
pub fn register_delegate(
    registry: &mut NodeRegistry,
    name: &str,
    hooks: DelegateHooks,
) -> Result<(), RegistryError> {
    registry.register_with(
        name,
        NodeCategory::Behavior,
        TypeId::of::<DelegateBhv>(),
        Arc::new(move || Box::new(DelegateCfg::new(hooks.clone())) as Box<dyn NodeConfig>),
        Arc::new(DelegateBhv::instantiate),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::behavior::BehaviorNode;
    use crate::context::test_support;

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::with_builtins();
        register_wait_check(
            &mut registry,
            "WaitReady",
            Arc::new(|node: &WaitCheck, ctx: &NodeContext| {
                let var = node.attr("Var").unwrap_or("ready");
                ctx.vars().get::<bool>(var).unwrap_or(false)
            }),
        )
        .unwrap();
        registry
    }

    #[test]
    fn wait_check_stops_when_predicate_holds() {
        let registry = registry();
        let parser = ConfigParser::new(&registry);
        let config = parser
            .parse(&ConfigElement::new("WaitReady").with_attr("Var", "armed"))
            .unwrap()
            .unwrap();

        let (mut ctx, _) = test_support::context_with(registry.clone());
        let mut node = ctx.create_behavior(&config).unwrap();
        node.reset(&mut ctx);
        node.activate(&mut ctx);

        assert_eq!(node.update(0.5, &mut ctx), 0.0);
        assert!(!node.can_stop(&ctx));

        ctx.vars_mut().set("armed", true);
        assert_eq!(node.update(0.5, &mut ctx), 0.5);
        assert!(node.can_stop(&ctx));
    }

    #[test]
    fn delegate_runs_hooks_until_finished() {
        let begins = Arc::new(AtomicUsize::new(0));
        let destroys = Arc::new(AtomicUsize::new(0));
        let hooks = DelegateHooks {
            on_begin: Some({
                let begins = Arc::clone(&begins);
                Arc::new(move |_: &mut Delegate, _: &mut NodeContext| {
                    begins.fetch_add(1, Ordering::Relaxed);
                })
            }),
            on_update: Some(Arc::new(|node: &mut Delegate, _dt: f32, ctx: &mut NodeContext| {
                let ticks = ctx.vars().get::<i32>("ticks").unwrap_or(0) + 1;
                ctx.vars_mut().set("ticks", ticks);
                if ticks >= 2 {
                    node.finish();
                }
                0.0
            })),
            on_destroy: Some({
                let destroys = Arc::clone(&destroys);
                Arc::new(move |_: &mut Delegate, _: &mut NodeContext| {
                    destroys.fetch_add(1, Ordering::Relaxed);
                })
            }),
            ..DelegateHooks::default()
        };

        let mut registry = NodeRegistry::with_builtins();
        register_delegate(&mut registry, "Ping", hooks).unwrap();
        let config = ConfigParser::new(&registry)
            .parse(&ConfigElement::new("Ping"))
            .unwrap()
            .unwrap();

        let (mut ctx, _) = test_support::context_with(registry);
        let mut node = ctx.create_behavior(&config).unwrap();
        node.reset(&mut ctx);
        node.activate(&mut ctx);

        node.update(0.1, &mut ctx);
        assert!(!node.can_stop(&ctx));
        node.update(0.1, &mut ctx);
        assert!(node.can_stop(&ctx));
        assert_eq!(begins.load(Ordering::Relaxed), 1);

        ctx.destroy_behavior(node);
        assert_eq!(destroys.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn delegate_without_update_hook_is_instant() {
        let mut registry = NodeRegistry::new();
        register_delegate(&mut registry, "Noop", DelegateHooks::default()).unwrap();
        let config = ConfigParser::new(&registry)
            .parse(&ConfigElement::new("Noop"))
            .unwrap()
            .unwrap();

        let (mut ctx, _) = test_support::context_with(registry);
        let mut node = ctx.create_behavior(&config).unwrap();
        node.reset(&mut ctx);
        node.activate(&mut ctx);
        assert_eq!(node.update(0.2, &mut ctx), 0.2);
        assert!(node.can_stop(&ctx));
    }
}

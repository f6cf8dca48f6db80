//! Composite behaviors.
//!
//! Composites own an ordered list of child behaviors and drive their
//! lifecycles. Children that cannot be created are skipped with a warning.

use std::sync::Arc;

use tracing::warn;

use crate::behavior::{BehaviorLogic, BehaviorNode, Bhv};
use crate::category::NodeCategory;
use crate::config::{ConfigElement, ConfigParser, NodeConfig, SharedConfig};
use crate::context::NodeContext;
use crate::error::{ConfigResult, NodeResult};

/// Behaviors run one after another.
pub type SequenceBhv = Bhv<Sequence>;

/// Behaviors run side by side.
pub type ParallelBhv = Bhv<Parallel>;

/// Config of a composite: child behaviors in declared order.
#[derive(Debug, Default)]
pub struct CompositeCfg {
    pub children: Vec<SharedConfig>,
}

impl CompositeCfg {
    pub fn new(children: Vec<SharedConfig>) -> Self {
        Self { children }
    }
}

impl NodeConfig for CompositeCfg {
    fn parse(&mut self, element: &ConfigElement, parser: &ConfigParser<'_>) -> ConfigResult<()> {
        self.children = parser.parse_list(element, NodeCategory::Behavior)?;
        Ok(())
    }
}

fn create_children(
    owner: &'static str,
    config: &CompositeCfg,
    ctx: &mut NodeContext,
) -> Vec<Box<dyn BehaviorNode>> {
    config
        .children
        .iter()
        .filter_map(|child| {
            let node = ctx.create_behavior(child);
            if node.is_none() {
                warn!(
                    target: "logic_graph::node",
                    node = owner,
                    child = child.type_name(),
                    "child skipped"
                );
            }
            node
        })
        .collect()
}

fn destroy_children(children: &mut Vec<Box<dyn BehaviorNode>>, ctx: &mut NodeContext) {
    for child in children.drain(..) {
        ctx.destroy_behavior(child);
    }
}

/// Runs children in declared order.
///
/// When a child finishes, its unconsumed `dt` is fed to the next child in
/// the same update, so several short behaviors can complete within one
/// tick. A running child consumes the rest of the tick.
pub struct Sequence {
    children: Vec<Box<dyn BehaviorNode>>,
    index: usize,
    started: bool,
}

impl Sequence {
    /// Index of the running child; equals the child count once finished.
    pub fn current_index(&self) -> usize {
        self.index
    }

    fn start_current(&mut self, ctx: &mut NodeContext) {
        self.started = true;
        if let Some(child) = self.children.get_mut(self.index) {
            child.reset(ctx);
            child.activate(ctx);
        }
    }
}

impl BehaviorLogic for Sequence {
    const TYPE_NAME: &'static str = "SequenceBhv";

    type Config = CompositeCfg;

    fn new(config: Arc<CompositeCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        Ok(Self {
            children: create_children(Self::TYPE_NAME, &config, ctx),
            index: 0,
            started: false,
        })
    }

    fn on_activate(&mut self, ctx: &mut NodeContext) {
        if !self.started {
            self.start_current(ctx);
        } else if let Some(child) = self.children.get_mut(self.index) {
            child.activate(ctx);
        }
    }

    fn on_deactivate(&mut self, ctx: &mut NodeContext) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.deactivate(ctx);
        }
    }

    fn on_reset(&mut self, ctx: &mut NodeContext) {
        if self.started
            && let Some(child) = self.children.get_mut(self.index)
        {
            child.deactivate(ctx);
        }
        self.index = 0;
        self.started = false;
    }

    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if !self.started {
            self.start_current(ctx);
        }

        let mut dt = dt;
        while let Some(child) = self.children.get_mut(self.index) {
            let remaining = child.update(dt, ctx);
            if !child.can_stop(ctx) {
                return 0.0;
            }
            child.deactivate(ctx);
            self.index += 1;
            self.start_current(ctx);
            dt = remaining;
        }
        dt
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.index >= self.children.len()
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.on_trigger(tag, ctx);
        }
    }

    fn on_destroy(&mut self, ctx: &mut NodeContext) {
        destroy_children(&mut self.children, ctx);
    }
}

/// Runs all children every update; done when every child is done.
///
/// Children are rearmed lazily, so a reset while active restarts every
/// child on the next update.
pub struct Parallel {
    children: Vec<Box<dyn BehaviorNode>>,
    finished: Vec<bool>,
    started: bool,
}

impl Parallel {
    fn start_all(&mut self, ctx: &mut NodeContext) {
        self.started = true;
        self.finished.fill(false);
        for child in &mut self.children {
            child.reset(ctx);
            child.activate(ctx);
        }
    }

    fn running(&mut self) -> impl Iterator<Item = &mut Box<dyn BehaviorNode>> {
        self.children
            .iter_mut()
            .zip(&self.finished)
            .filter(|(_, done)| !**done)
            .map(|(child, _)| child)
    }
}

impl BehaviorLogic for Parallel {
    const TYPE_NAME: &'static str = "ParallelBhv";

    type Config = CompositeCfg;

    fn new(config: Arc<CompositeCfg>, ctx: &mut NodeContext) -> NodeResult<Self> {
        let children = create_children(Self::TYPE_NAME, &config, ctx);
        let finished = vec![false; children.len()];
        Ok(Self {
            children,
            finished,
            started: false,
        })
    }

    fn on_activate(&mut self, ctx: &mut NodeContext) {
        if !self.started {
            self.start_all(ctx);
            return;
        }
        for child in self.running() {
            child.activate(ctx);
        }
    }

    fn on_deactivate(&mut self, ctx: &mut NodeContext) {
        for child in &mut self.children {
            child.deactivate(ctx);
        }
    }

    fn on_reset(&mut self, ctx: &mut NodeContext) {
        for child in &mut self.children {
            child.deactivate(ctx);
        }
        self.finished.fill(false);
        self.started = false;
    }

    /// Returns the smallest remainder among the children that finished in
    /// this update, or 0 while any child is still running.
    fn on_update(&mut self, dt: f32, ctx: &mut NodeContext) -> f32 {
        if !self.started {
            self.start_all(ctx);
        }

        let mut least_remaining = dt;
        for (child, done) in self.children.iter_mut().zip(self.finished.iter_mut()) {
            if *done {
                continue;
            }
            let remaining = child.update(dt, ctx);
            if child.can_stop(ctx) {
                *done = true;
                child.deactivate(ctx);
                least_remaining = least_remaining.min(remaining);
            } else {
                least_remaining = 0.0;
            }
        }
        least_remaining
    }

    fn can_stop(&self, _ctx: &NodeContext) -> bool {
        self.finished.iter().all(|done| *done)
    }

    fn on_trigger(&mut self, tag: &str, ctx: &mut NodeContext) {
        for child in self.running() {
            child.on_trigger(tag, ctx);
        }
    }

    fn on_destroy(&mut self, ctx: &mut NodeContext) {
        destroy_children(&mut self.children, ctx);
    }
}

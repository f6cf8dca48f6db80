//! Builder utilities for constructing configs in code.
//!
//! Each function returns a [`SharedConfig`] equivalent to what the markup
//! parser produces, so trees can be assembled without writing markup:
//!
//! ```
//! use logic_graph::builder::{sequence, set_var, wait};
//!
//! let root = sequence(vec![wait(0.5), set_var("casting", true)]);
//! assert_eq!(root.type_name(), "SequenceBhv");
//! ```

use crate::composite::CompositeCfg;
use crate::config::SharedConfig;
use crate::decorator::{ConditionListCfg, NotCfg};
use crate::fsm::{
    CustomBhvState, CustomBhvStateCfg, FsmBhv, FsmCfg, StateTransitionCfg, StateTransitionNode,
};
use crate::nodes::{
    AllCond, AnyCond, ConstCfg, ConstCond, ElapsedCfg, ElapsedCond, EventCfg, EventCond,
    FiniteTimeBhv, HealthOverTimeBhv, HealthOverTimeCfg, ModifyHealthBhv, ModifyHealthCfg,
    NotCond, ParallelBhv, PublishEventBhv, PublishEventCfg, SequenceBhv, SetVarBhv, SetVarCfg,
    TargetRef, TriggerCfg, TriggerCond, WaitCfg,
};
use crate::value::{Value, ValueConfig};

/// Creates a wait of `seconds`.
#[inline]
pub fn wait(seconds: f32) -> SharedConfig {
    SharedConfig::of::<FiniteTimeBhv>(WaitCfg::new(ValueConfig::literal(seconds)))
}

/// Creates a wait whose duration is read from variable `var`.
#[inline]
pub fn wait_var(var: &str, default: f32) -> SharedConfig {
    SharedConfig::of::<FiniteTimeBhv>(WaitCfg::new(ValueConfig::variable(var, default)))
}

#[inline]
pub fn sequence(children: Vec<SharedConfig>) -> SharedConfig {
    SharedConfig::of::<SequenceBhv>(CompositeCfg::new(children))
}

#[inline]
pub fn parallel(children: Vec<SharedConfig>) -> SharedConfig {
    SharedConfig::of::<ParallelBhv>(CompositeCfg::new(children))
}

#[inline]
pub fn set_var(var: &str, value: impl Into<Value>) -> SharedConfig {
    SharedConfig::of::<SetVarBhv>(SetVarCfg::new(var, value))
}

/// Adds `amount` to the owner's health.
#[inline]
pub fn modify_health(amount: i32) -> SharedConfig {
    SharedConfig::of::<ModifyHealthBhv>(ModifyHealthCfg {
        target: TargetRef::Owner,
        amount: ValueConfig::literal(amount),
    })
}

/// Changes the owner's health by `per_second` for `seconds`.
#[inline]
pub fn health_over_time(seconds: f32, per_second: f32) -> SharedConfig {
    SharedConfig::of::<HealthOverTimeBhv>(HealthOverTimeCfg {
        duration: ValueConfig::literal(seconds),
        per_second: ValueConfig::literal(per_second),
        target: TargetRef::Owner,
    })
}

#[inline]
pub fn publish_event(event: &str) -> SharedConfig {
    SharedConfig::of::<PublishEventBhv>(PublishEventCfg::new(event))
}

#[inline]
pub fn constant(value: bool) -> SharedConfig {
    SharedConfig::of::<ConstCond>(ConstCfg {
        value: ValueConfig::literal(value),
    })
}

#[inline]
pub fn not(condition: SharedConfig) -> SharedConfig {
    SharedConfig::of::<NotCond>(NotCfg {
        condition: Some(condition),
    })
}

#[inline]
pub fn all(conditions: Vec<SharedConfig>) -> SharedConfig {
    SharedConfig::of::<AllCond>(ConditionListCfg { conditions })
}

#[inline]
pub fn any(conditions: Vec<SharedConfig>) -> SharedConfig {
    SharedConfig::of::<AnyCond>(ConditionListCfg { conditions })
}

#[inline]
pub fn elapsed(seconds: f32) -> SharedConfig {
    SharedConfig::of::<ElapsedCond>(ElapsedCfg {
        seconds: ValueConfig::literal(seconds),
    })
}

/// Latches on agent trigger `tag`.
#[inline]
pub fn trigger(tag: &str) -> SharedConfig {
    SharedConfig::of::<TriggerCond>(TriggerCfg {
        tag: tag.to_string(),
    })
}

/// Latches on bus event `name`.
#[inline]
pub fn event(name: &str) -> SharedConfig {
    SharedConfig::of::<EventCond>(EventCfg {
        event: name.to_string(),
        owner_only: false,
    })
}

#[inline]
pub fn transition(config: StateTransitionCfg) -> SharedConfig {
    SharedConfig::of::<StateTransitionNode>(config)
}

#[inline]
pub fn state(config: CustomBhvStateCfg) -> SharedConfig {
    SharedConfig::of::<CustomBhvState>(config)
}

/// Creates an FSM over `states`, keyed by their ids.
pub fn fsm(initial: &str, states: Vec<CustomBhvStateCfg>) -> SharedConfig {
    let config = states
        .into_iter()
        .fold(FsmCfg::new(initial), |config, state| {
            let id = state.id.clone();
            config.with_state(id, self::state(state))
        });
    SharedConfig::of::<FsmBhv>(config)
}

use super::*;
use crate::behavior::BehaviorNode;
use crate::builder;
use crate::config::{ROLE_BHV, ROLE_CONDITION};
use crate::context::test_support;
use crate::node::CustomNode;
use crate::registry::NodeRegistry;
use crate::var_env::VarEnv;

fn start(config: &SharedConfig, ctx: &mut NodeContext) -> FsmBhv {
    let mut node = FsmBhv::new();
    node.initialize(config, ctx).unwrap();
    node.reset(ctx);
    node.activate(ctx);
    node
}

fn current(node: &FsmBhv) -> Option<&str> {
    node.logic().and_then(Fsm::current_state)
}

fn goto(target: &str, condition: SharedConfig) -> SharedConfig {
    builder::transition(StateTransitionCfg::new(condition).on_true(target))
}

#[test]
fn runs_states_in_transition_order() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "idle",
        vec![
            CustomBhvStateCfg::new("idle").with_transition(goto("run", builder::trigger("Go"))),
            CustomBhvStateCfg::new("run")
                .with_bhv(builder::wait(1.0))
                .with_transition(goto("done", builder::constant(true))),
            CustomBhvStateCfg::new("done"),
        ],
    );
    let mut node = start(&config, &mut ctx);
    assert_eq!(current(&node), Some("idle"));

    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("idle"));
    assert!(!node.can_stop(&ctx));

    node.on_trigger("Go", &mut ctx);
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("run"));

    node.update(0.5, &mut ctx);
    assert_eq!(current(&node), Some("run"), "transitions wait for the behavior");

    node.update(0.5, &mut ctx);
    assert_eq!(current(&node), Some("done"));
    assert!(!node.can_stop(&ctx), "entered state has not ticked yet");

    node.update(0.1, &mut ctx);
    assert!(node.can_stop(&ctx));
    assert_eq!(node.logic().unwrap().switches(), 2);
}

#[test]
fn at_most_one_transition_per_update() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "a",
        vec![
            CustomBhvStateCfg::new("a").with_transition(goto("b", builder::constant(true))),
            CustomBhvStateCfg::new("b").with_transition(goto("c", builder::constant(true))),
            CustomBhvStateCfg::new("c"),
        ],
    );
    let mut node = start(&config, &mut ctx);

    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("b"));
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("c"));
}

#[test]
fn first_resolved_transition_wins() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "a",
        vec![
            CustomBhvStateCfg::new("a")
                .with_transition(goto("b", builder::constant(false)))
                .with_transition(goto("c", builder::constant(true)))
                .with_transition(goto("b", builder::constant(true))),
            CustomBhvStateCfg::new("b"),
            CustomBhvStateCfg::new("c"),
        ],
    );
    let mut node = start(&config, &mut ctx);
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("c"));
}

#[test]
fn exit_behavior_completes_on_leaving() {
    let (mut ctx, _) = test_support::context();
    let exit = builder::sequence(vec![builder::wait(5.0), builder::set_var("exited", true)]);
    let config = builder::fsm(
        "a",
        vec![
            CustomBhvStateCfg::new("a")
                .with_exit_bhv(exit)
                .with_transition(goto("b", builder::constant(true))),
            CustomBhvStateCfg::new("b"),
        ],
    );
    let mut node = start(&config, &mut ctx);

    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("b"));
    assert_eq!(ctx.vars().get::<bool>("exited"), Some(true));
}

#[test]
fn end_event_is_published_once() {
    let (mut ctx, _) = test_support::context();
    let mut rx = ctx.events().subscribe("WorkDone").unwrap();
    let config = builder::fsm(
        "work",
        vec![
            CustomBhvStateCfg::new("work")
                .with_bhv(builder::wait(0.2))
                .with_end_event("WorkDone"),
        ],
    );
    let mut node = start(&config, &mut ctx);

    node.update(0.1, &mut ctx);
    assert!(rx.try_recv().is_err());
    node.update(0.1, &mut ctx);
    node.update(0.1, &mut ctx);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.name, "WorkDone");
    assert_eq!(event.source, test_support::OWNER);
    assert!(rx.try_recv().is_err());
}

#[test]
fn unknown_target_stays_in_state() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "a",
        vec![CustomBhvStateCfg::new("a").with_transition(goto("nowhere", builder::constant(true)))],
    );
    let mut node = start(&config, &mut ctx);

    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("a"));
    assert_eq!(node.logic().unwrap().switches(), 0);
}

#[test]
fn reset_reenters_initial_state() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "a",
        vec![
            CustomBhvStateCfg::new("a").with_transition(goto("b", builder::constant(true))),
            CustomBhvStateCfg::new("b"),
        ],
    );
    let mut node = start(&config, &mut ctx);
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("b"));

    node.reset(&mut ctx);
    assert_eq!(current(&node), None);
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("b"), "initial entered lazily, then left");
}

#[test]
fn reentered_state_runs_its_parallel_again() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "work",
        vec![
            CustomBhvStateCfg::new("work")
                .with_bhv(builder::parallel(vec![builder::wait(0.2), builder::wait(0.4)]))
                .with_transition(goto("rest", builder::constant(true))),
            CustomBhvStateCfg::new("rest").with_transition(goto("work", builder::trigger("Again"))),
        ],
    );
    let mut node = start(&config, &mut ctx);

    for round in 1..=2 {
        node.update(0.3, &mut ctx);
        assert_eq!(current(&node), Some("work"), "round {round}");
        node.update(0.3, &mut ctx);
        assert_eq!(current(&node), Some("rest"), "round {round}");

        node.on_trigger("Again", &mut ctx);
        node.update(0.1, &mut ctx);
        assert_eq!(current(&node), Some("work"), "round {round}");
    }
    assert_eq!(node.logic().unwrap().switches(), 4);
}

#[test]
fn reset_mid_state_restarts_its_behavior() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "work",
        vec![
            CustomBhvStateCfg::new("work")
                .with_bhv(builder::parallel(vec![builder::wait(0.5), builder::wait(1.0)]))
                .with_transition(goto("done", builder::constant(true))),
            CustomBhvStateCfg::new("done"),
        ],
    );
    let mut node = start(&config, &mut ctx);

    node.update(0.75, &mut ctx);
    node.reset(&mut ctx);
    node.update(0.75, &mut ctx);
    assert_eq!(current(&node), Some("work"));
    node.update(0.25, &mut ctx);
    assert_eq!(current(&node), Some("done"));
}

#[test]
fn destroy_releases_every_node() {
    let (mut ctx, _) = test_support::context();
    let config = builder::fsm(
        "a",
        vec![
            CustomBhvStateCfg::new("a")
                .with_bhv(builder::sequence(vec![builder::wait(1.0)]))
                .with_exit_bhv(builder::wait(0.1))
                .with_transition(goto("b", builder::not(builder::constant(false)))),
            CustomBhvStateCfg::new("b"),
        ],
    );
    let node = ctx.create_behavior(&config).unwrap();
    // fsm, 2 states, sequence, wait, exit wait, transition, not, const
    assert_eq!(ctx.factory().live_nodes(), 9);

    ctx.destroy_behavior(node);
    assert_eq!(ctx.factory().live_nodes(), 0);
}

#[test]
fn fsm_fits_behavior_slots() {
    let (mut ctx, _) = test_support::context();
    let inner = builder::fsm(
        "a",
        vec![CustomBhvStateCfg::new("a").with_bhv(builder::wait(0.5))],
    );
    let config = builder::sequence(vec![inner, builder::set_var("after", true)]);
    let mut node = ctx.create_behavior(&config).unwrap();
    node.reset(&mut ctx);
    node.activate(&mut ctx);

    node.update(0.25, &mut ctx);
    assert!(!node.can_stop(&ctx));
    node.update(0.25, &mut ctx);
    assert!(node.can_stop(&ctx));
    assert_eq!(ctx.vars().get::<bool>("after"), Some(true));
}

const SCRIPT: &str = r#"(
    tag: "Fsm",
    attrs: [("Initial", "idle")],
    children: [
        (tag: "CustomBhvState", attrs: [("Id", "idle")], children: [
            (tag: "StateTransition", attrs: [("TrueStateID", "work")], children: [
                (tag: "Condition", children: [(tag: "TriggerCond", attrs: [("Tag", "Go")])]),
            ]),
        ]),
        (tag: "CustomBhvState", attrs: [("Id", "work"), ("EndEvent", "WorkDone")], children: [
            (tag: "Bhv", children: [(tag: "FiniteTimeBhv", attrs: [("Duration", "BB#work_time")])]),
        ]),
    ],
)"#;

#[test]
fn parses_markup_script() {
    let registry = NodeRegistry::with_builtins();
    let script = ConfigParser::new(&registry)
        .parse_script_str("worker", SCRIPT)
        .unwrap();
    assert_eq!(script.root().category(), NodeCategory::Fsm);

    let body = script.root().downcast_ref::<FsmCfg>().unwrap();
    assert_eq!(body.initial, "idle");
    let ids: Vec<_> = body.states.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, ["idle", "work"]);

    let (mut ctx, _) = test_support::context_with(registry);
    ctx.vars_mut().extend(VarEnv::new().with("work_time", 0.25f32));
    let mut node = start(script.root(), &mut ctx);
    node.on_trigger("Go", &mut ctx);
    node.update(0.1, &mut ctx);
    assert_eq!(current(&node), Some("work"));
    node.update(0.25, &mut ctx);
    node.update(0.0, &mut ctx);
    assert!(node.can_stop(&ctx));
}

#[test]
fn rejects_duplicate_state_ids() {
    let registry = NodeRegistry::with_builtins();
    let parser = ConfigParser::new(&registry);
    let element = ConfigElement::new("Fsm")
        .with_attr("Initial", "a")
        .with_child(ConfigElement::new("CustomBhvState").with_attr("Id", "a"))
        .with_child(ConfigElement::new("CustomBhvState").with_attr("Id", "a"));

    assert!(matches!(
        parser.parse(&element),
        Err(ConfigError::DuplicateStateId { id, .. }) if id == "a"
    ));
}

#[test]
fn rejects_unknown_initial_state() {
    let registry = NodeRegistry::with_builtins();
    let parser = ConfigParser::new(&registry);
    let element = ConfigElement::new("Fsm")
        .with_attr("Initial", "missing")
        .with_child(ConfigElement::new("CustomBhvState").with_attr("Id", "a"));

    assert!(matches!(
        parser.parse(&element),
        Err(ConfigError::UnknownInitialState { id, .. }) if id == "missing"
    ));
}

#[test]
fn rejects_non_state_children() {
    let registry = NodeRegistry::with_builtins();
    let parser = ConfigParser::new(&registry);
    let element = ConfigElement::new("Fsm")
        .with_attr("Initial", "a")
        .with_child(ConfigElement::new("FiniteTimeBhv").with_attr("Duration", "1"));

    assert!(matches!(
        parser.parse(&element),
        Err(ConfigError::CategoryMismatch {
            expected: NodeCategory::State,
            ..
        })
    ));
}

#[test]
fn state_roles_are_validated() {
    let registry = NodeRegistry::with_builtins();
    let parser = ConfigParser::new(&registry);

    let condition_as_bhv = ConfigElement::new("CustomBhvState")
        .with_attr("Id", "a")
        .with_role(ROLE_BHV, ConfigElement::new("ConstCond").with_attr("Value", "true"));
    assert!(matches!(
        parser.parse(&condition_as_bhv),
        Err(ConfigError::CategoryMismatch { .. })
    ));

    let two_bhvs = ConfigElement::new("CustomBhvState")
        .with_attr("Id", "a")
        .with_child(
            ConfigElement::new(ROLE_BHV)
                .with_child(ConfigElement::new("FiniteTimeBhv").with_attr("Duration", "1"))
                .with_child(ConfigElement::new("FiniteTimeBhv").with_attr("Duration", "2")),
        );
    assert!(matches!(
        parser.parse(&two_bhvs),
        Err(ConfigError::RoleArity { count: 2, .. })
    ));

    let stray_condition = ConfigElement::new("CustomBhvState")
        .with_attr("Id", "a")
        .with_role(ROLE_CONDITION, ConfigElement::new("ConstCond").with_attr("Value", "true"));
    assert!(matches!(
        parser.parse(&stray_condition),
        Err(ConfigError::Invalid { message, .. }) if message.contains("Condition")
    ));
}

//! Cast scenarios over the bundled content.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use logic_graph::{
    AgentEnv, EntityAccess, EntityFlags, EntityId, EntityRecord, MemoryEntities, NodeRegistry,
    Position,
};
use skill::loaders::{Content, ContentLoader};
use skill::{CastBlock, SkillCaster, SkillData, SkillError, SkillId, SpellContext};

const OWNER: EntityId = EntityId(1);
const TARGET: EntityId = EntityId(2);

const FIREBALL: SkillId = SkillId(1);
const MEND: SkillId = SkillId(2);
const BARRIER: SkillId = SkillId(3);

struct Host {
    entities: Arc<MemoryEntities>,
    env: AgentEnv,
    content: Content,
}

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn host() -> Host {
    let registry = NodeRegistry::with_builtins();
    let content = ContentLoader::new(data_dir()).load(&registry).unwrap();

    let entities = Arc::new(MemoryEntities::new());
    entities.insert(OWNER, EntityRecord::actor(100, Position::default()));
    entities.insert(TARGET, EntityRecord::actor(100, Position::new(4.0, 0.0)));

    let env = AgentEnv::new(
        Arc::new(registry),
        entities.clone(),
        content.settings.clone(),
    );
    Host {
        entities,
        env,
        content,
    }
}

fn caster(host: &Host) -> SkillCaster {
    let library = Arc::new(host.content.scripts.clone());
    let mut caster = SkillCaster::new(OWNER, host.env.clone(), library);
    for skill in &host.content.skills {
        caster.learn(Arc::clone(skill));
    }
    caster
}

/// Ticks until the running cast is reaped, returning the number of ticks.
fn run_to_end(caster: &mut SkillCaster, dt: f32) -> usize {
    for tick in 1..=200 {
        caster.update(dt);
        caster.late_update();
        if !caster.is_casting() {
            return tick;
        }
    }
    panic!("cast did not finish");
}

#[test]
fn range_and_busy_gates() {
    let host = host();
    let mut caster = caster(&host)
        .with_skill(Arc::new(SkillData::new(10, "Bolt", "fireball").with_range(5.0)));
    let bolt = SkillId(10);

    host.entities.set_position(TARGET, Position::new(6.0, 0.0));
    assert!(!caster.can_spell_skill_at(bolt, TARGET));

    host.entities.set_position(TARGET, Position::new(4.0, 0.0));
    assert!(caster.can_spell_skill_at(bolt, TARGET));
    assert!(caster.spell_skill(bolt, SpellContext::new().with_target(TARGET)));

    assert!(!caster.can_spell_skill(MEND));
    assert!(!caster.spell_skill(MEND, SpellContext::new()));
    assert!(matches!(
        caster.try_spell_skill(BARRIER, SpellContext::new()),
        Err(SkillError::Blocked {
            reason: CastBlock::Busy,
            ..
        })
    ));
    assert_eq!(caster.active_skill(), Some(bolt));
}

#[test]
fn fireball_runs_to_completion() {
    let host = host();
    let mut impact = host.env.events.subscribe("FireballImpact").unwrap();
    let mut done = host.env.events.subscribe("FireballDone").unwrap();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(FIREBALL, SpellContext::new().with_target(TARGET)));
    let tag = caster.process().unwrap().tag();

    let mut spawned = false;
    for _ in 0..200 {
        caster.update(0.1);
        spawned |= host.entities.owned_count(tag) > 0;
        caster.late_update();
        if !caster.is_casting() {
            break;
        }
    }
    assert!(!caster.is_casting());
    assert!(spawned, "projectile was spawned while casting");
    assert_eq!(host.entities.owned_count(tag), 0, "projectile released");

    assert_eq!(host.entities.health(TARGET), Some(75));
    assert_eq!(impact.try_recv().unwrap().payload.get::<EntityId>("target"), Some(TARGET));
    assert_eq!(done.try_recv().unwrap().source, OWNER);
    assert!(caster.ability(FIREBALL).unwrap().cooldown().is_cooling());
}

#[test]
fn interrupted_cast_still_enters_cooldown() {
    let host = host();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(FIREBALL, SpellContext::new().with_target(TARGET)));
    caster.update(0.1);
    assert!(caster.interrupt());

    assert!(!caster.is_casting());
    assert!(caster.ability(FIREBALL).unwrap().cooldown().is_cooling());
    assert!(!caster.can_spell_skill(FIREBALL));
    assert_eq!(host.entities.health(TARGET), Some(100));
    assert!(!caster.interrupt());
}

#[test]
fn stun_ends_interruptible_casts() {
    let host = host();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(MEND, SpellContext::new()));
    caster.update(0.5);
    caster.late_update();
    assert!(caster.is_casting());

    host.entities.set_flags(OWNER, EntityFlags::STUNNED);
    caster.update(0.1);
    caster.late_update();
    assert!(!caster.is_casting());
    assert!(caster.ability(MEND).unwrap().cooldown().is_cooling());
}

#[test]
fn interruptible_cast_is_replaced() {
    let host = host();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(MEND, SpellContext::new()));
    caster.update(0.1);
    assert!(caster.spell_skill(BARRIER, SpellContext::new()));

    assert_eq!(caster.active_skill(), Some(BARRIER));
    assert!(caster.ability(MEND).unwrap().cooldown().is_cooling());
    assert!(!caster.ability(BARRIER).unwrap().cooldown().is_cooling());
}

#[test]
fn mend_heals_over_time() {
    let host = host();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(MEND, SpellContext::new()));
    let ticks = run_to_end(&mut caster, 0.25);
    assert!(ticks >= 8);
    assert_eq!(host.entities.health(OWNER), Some(110));
}

#[test]
fn barrier_locks_owner_until_disposed() {
    let host = host();
    let mut caster = caster(&host);

    assert!(caster.spell_skill(BARRIER, SpellContext::new()));
    assert_eq!(host.entities.health(OWNER), Some(85));
    assert_eq!(host.entities.flags(OWNER), EntityFlags::empty());
    assert_eq!(host.entities.len(), 2, "barrier spawns on the first update");

    caster.update(0.1);
    assert_eq!(host.entities.len(), 3);

    run_to_end(&mut caster, 0.5);
    assert_eq!(host.entities.len(), 2);
    assert_eq!(
        host.entities.flags(OWNER),
        EntityFlags::MOVABLE | EntityFlags::STUNNABLE
    );
}

#[test]
fn unknown_skill_and_script_are_rejected() {
    let host = host();
    let mut caster =
        caster(&host).with_skill(Arc::new(SkillData::new(9, "Ghost", "ghost")));

    assert!(matches!(
        caster.try_spell_skill(SkillId(42), SpellContext::new()),
        Err(SkillError::UnknownSkill(SkillId(42)))
    ));
    assert!(matches!(
        caster.try_spell_skill(SkillId(9), SpellContext::new()),
        Err(SkillError::ScriptNotFound { .. })
    ));
    assert!(!caster.spell_skill(SkillId(9), SpellContext::new()));
    assert!(!caster.is_casting());
}

//! One active cast of a skill.

use std::sync::Arc;

use logic_graph::{
    Agent, AgentEnv, AgentError, EntityAccess, EntityFlags, EntityId, Position, ProcessTag,
    Script, VarEnv,
};
use tracing::{debug, warn};

use crate::cooldown::SkillCd;
use crate::data::SkillData;

/// Trigger sent to the agent once the cast starts.
pub const ON_RELEASE_SKILL: &str = "OnReleaseSkill";

/// Caller-provided cast parameters, merged into the script's variables by
/// the release trigger.
#[derive(Clone, Debug, Default)]
pub struct SpellContext {
    pub target: Option<EntityId>,
    pub position: Option<Position>,
    pub vars: VarEnv,
}

impl SpellContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_var<T: logic_graph::VarType>(mut self, id: &str, value: T) -> Self {
        self.vars.set(id, value);
        self
    }

    /// Variables seen by the script: `target`, `target_x` and `target_y`
    /// when set, then the caller's own variables.
    pub fn into_payload(self) -> VarEnv {
        let mut payload = VarEnv::new();
        if let Some(target) = self.target {
            payload.set("target", target);
        }
        if let Some(position) = self.position {
            payload.set("target_x", position.x);
            payload.set("target_y", position.y);
        }
        payload.extend(self.vars);
        payload
    }
}

/// Owns the agent of one cast and the owner state it changed.
///
/// Created by [`SkillProcess::start`] and ended by
/// [`SkillProcess::dispose`], which enters the skill's cooldown whether the
/// cast completed or was interrupted.
pub struct SkillProcess {
    skill: Arc<SkillData>,
    tag: ProcessTag,
    agent: Agent,
    entities: Arc<dyn EntityAccess>,
    suppressed: EntityFlags,
    finished: bool,
    disposed: bool,
}

impl SkillProcess {
    /// Builds the agent for `script`, applies the cast's owner effects and
    /// fires [`ON_RELEASE_SKILL`] with `spell` as payload.
    ///
    /// `sequence` distinguishes the casts of one owner and feeds the
    /// [`ProcessTag`] carried by every object the cast spawns.
    pub fn start(
        skill: Arc<SkillData>,
        script: &Script,
        owner: EntityId,
        sequence: u32,
        spell: SpellContext,
        env: &AgentEnv,
    ) -> Result<Self, AgentError> {
        let tag = ProcessTag::for_cast(owner, sequence);
        let initial = VarEnv::new().with("skill_id", skill.id.0 as i64);
        let agent = Agent::init(script, owner, tag, initial, env)?;
        let entities = Arc::clone(&env.entities);

        let mut lock = EntityFlags::empty();
        if skill.lock_movement {
            lock |= EntityFlags::MOVABLE;
        }
        if skill.unstoppable {
            lock |= EntityFlags::STUNNABLE;
        }
        let flags = entities.flags(owner);
        let suppressed = flags & lock;
        if !suppressed.is_empty() {
            entities.set_flags(owner, flags - suppressed);
        }

        if skill.health_cost > 0
            && let Some(health) = entities.health(owner)
        {
            entities.set_health(owner, (health - skill.health_cost).max(0));
        }

        let mut process = Self {
            skill,
            tag,
            agent,
            entities,
            suppressed,
            finished: false,
            disposed: false,
        };
        process.agent.trigger(ON_RELEASE_SKILL, spell.into_payload());
        debug!(
            target: "skill::process",
            skill = %process.skill.id,
            %owner,
            tag = tag.0,
            "cast started"
        );
        Ok(process)
    }

    pub fn skill(&self) -> &Arc<SkillData> {
        &self.skill
    }

    pub fn tag(&self) -> ProcessTag {
        self.tag
    }

    pub fn owner(&self) -> EntityId {
        self.agent.owner()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Forwards a host trigger to the running script.
    pub fn trigger(&mut self, tag: &str, payload: VarEnv) {
        if !self.disposed {
            self.agent.trigger(tag, payload);
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.finished {
            self.agent.update(dt);
        }
    }

    /// Marks the process finished once its script has run to the end.
    ///
    /// The agent is ticked once per frame, in [`update`](Self::update);
    /// this pass only observes the result, so frame time is never counted
    /// twice.
    pub fn late_update(&mut self) {
        if !self.finished && self.agent.is_finished() {
            debug!(target: "skill::process", skill = %self.skill.id, "cast completed");
            self.finished = true;
        }
    }

    pub fn mark_finished(&mut self) {
        self.finished = true;
    }

    /// True once marked finished, or while an interruptible cast's owner is
    /// stunned.
    pub fn is_finished(&self) -> bool {
        self.finished
            || (self.skill.interruptible
                && self
                    .entities
                    .flags(self.owner())
                    .contains(EntityFlags::STUNNED))
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Ends the cast: enters `cd`, releases spawned objects, restores the
    /// suppressed owner flags and disposes the agent. Idempotent.
    pub fn dispose(&mut self, cd: &mut SkillCd) {
        if self.disposed {
            return;
        }
        cd.start();
        self.release();
        debug!(
            target: "skill::process",
            skill = %self.skill.id,
            cooldown = cd.remaining(),
            "cast disposed"
        );
    }

    fn release(&mut self) {
        let owner = self.owner();
        let released = self.entities.release_owned(self.tag);
        if !self.suppressed.is_empty() {
            let flags = self.entities.flags(owner);
            self.entities.set_flags(owner, flags | self.suppressed);
            self.suppressed = EntityFlags::empty();
        }
        self.finished = true;
        self.disposed = true;
        self.agent.dispose();
        if released > 0 {
            debug!(target: "skill::process", skill = %self.skill.id, released, "owned objects released");
        }
    }
}

impl Drop for SkillProcess {
    fn drop(&mut self) {
        if !self.disposed {
            warn!(
                target: "skill::process",
                skill = %self.skill.id,
                "cast dropped without dispose, cooldown skipped"
            );
            self.release();
        }
    }
}

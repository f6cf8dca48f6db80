//! Per-owner skill casting.

use std::collections::BTreeMap;
use std::sync::Arc;

use logic_graph::{AgentEnv, EntityId, VarEnv};
use tracing::{debug, info, warn};

use crate::ability::SkillAbility;
use crate::cooldown::SkillCd;
use crate::data::{SkillData, SkillId};
use crate::error::SkillError;
use crate::library::ScriptLibrary;
use crate::process::{SkillProcess, SpellContext};

/// Abilities of one owner entity and its running cast, if any.
///
/// The host calls [`update`](Self::update) then
/// [`late_update`](Self::late_update) once per tick.
pub struct SkillCaster {
    owner: EntityId,
    env: AgentEnv,
    library: Arc<ScriptLibrary>,
    abilities: BTreeMap<SkillId, SkillAbility>,
    process: Option<SkillProcess>,
    casts: u32,
}

impl SkillCaster {
    pub fn new(owner: EntityId, env: AgentEnv, library: Arc<ScriptLibrary>) -> Self {
        Self {
            owner,
            env,
            library,
            abilities: BTreeMap::new(),
            process: None,
            casts: 0,
        }
    }

    /// Teaches the owner a skill. Re-learning a skill resets its cooldown.
    pub fn learn(&mut self, data: Arc<SkillData>) {
        let id = data.id;
        if !self.library.contains(&data.script) {
            warn!(
                target: "skill::caster",
                skill = %id,
                script = %data.script,
                "learned skill uses an unknown script"
            );
        }
        self.abilities.insert(id, SkillAbility::new(data));
    }

    pub fn with_skill(mut self, data: Arc<SkillData>) -> Self {
        self.learn(data);
        self
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn ability(&self, id: SkillId) -> Option<&SkillAbility> {
        self.abilities.get(&id)
    }

    pub fn abilities(&self) -> impl Iterator<Item = &SkillAbility> {
        self.abilities.values()
    }

    /// Skill of the running cast.
    pub fn active_skill(&self) -> Option<SkillId> {
        self.process.as_ref().map(|process| process.skill().id)
    }

    pub fn process(&self) -> Option<&SkillProcess> {
        self.process.as_ref()
    }

    pub fn is_casting(&self) -> bool {
        self.process.is_some()
    }

    pub fn can_spell_skill(&self, id: SkillId) -> bool {
        self.check(id, None).is_ok()
    }

    /// Like [`can_spell_skill`](Self::can_spell_skill), also requiring
    /// `target` to exist within the skill's range.
    pub fn can_spell_skill_at(&self, id: SkillId, target: EntityId) -> bool {
        self.check(id, Some(target)).is_ok()
    }

    /// Runs every cast gate of `id`, with the target gates when `target`
    /// is given.
    pub fn check(&self, id: SkillId, target: Option<EntityId>) -> Result<(), SkillError> {
        let ability = self.abilities.get(&id).ok_or(SkillError::UnknownSkill(id))?;
        let entities = &*self.env.entities;
        let running = self.process.as_ref();
        let checked = match target {
            Some(target) => ability.check_target(self.owner, target, entities, running),
            None => ability.check(self.owner, entities, running),
        };
        checked.map_err(|reason| SkillError::Blocked { skill: id, reason })
    }

    /// Starts a cast of `id`, replacing the running cast.
    ///
    /// The running cast is disposed (entering its own cooldown) before the
    /// new agent is built. On error nothing changes except that teardown.
    pub fn try_spell_skill(&mut self, id: SkillId, spell: SpellContext) -> Result<(), SkillError> {
        self.check(id, spell.target)?;

        let data = match self.abilities.get(&id) {
            Some(ability) => Arc::clone(ability.data()),
            None => return Err(SkillError::UnknownSkill(id)),
        };
        let library = Arc::clone(&self.library);
        let script = library
            .get(&data.script)
            .ok_or_else(|| SkillError::ScriptNotFound {
                skill: id,
                script: data.script.clone(),
            })?;

        if self.process.is_some() {
            self.interrupt();
        }

        self.casts = self.casts.wrapping_add(1);
        let process = SkillProcess::start(data, script, self.owner, self.casts, spell, &self.env)?;
        info!(target: "skill::caster", owner = %self.owner, skill = %id, "skill cast");
        self.process = Some(process);
        Ok(())
    }

    /// [`try_spell_skill`](Self::try_spell_skill) reporting failure as
    /// `false` and a warning.
    pub fn spell_skill(&mut self, id: SkillId, spell: SpellContext) -> bool {
        match self.try_spell_skill(id, spell) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: "skill::caster", owner = %self.owner, skill = %id, %err, "cast rejected");
                false
            }
        }
    }

    /// Forwards a host trigger to the running cast.
    pub fn trigger(&mut self, tag: &str, payload: VarEnv) {
        if let Some(process) = self.process.as_mut() {
            process.trigger(tag, payload);
        }
    }

    /// Ticks cooldowns and the running cast.
    pub fn update(&mut self, dt: f32) {
        for ability in self.abilities.values_mut() {
            ability.cooldown_mut().tick(dt);
        }
        if let Some(process) = self.process.as_mut() {
            process.update(dt);
        }
    }

    /// Disposes the running cast once it is finished.
    pub fn late_update(&mut self) {
        let finished = match self.process.as_mut() {
            Some(process) => {
                process.late_update();
                process.is_finished()
            }
            None => false,
        };
        if finished {
            self.end_process();
        }
    }

    /// Ends the running cast immediately. Returns false when idle.
    pub fn interrupt(&mut self) -> bool {
        if self.process.is_none() {
            return false;
        }
        debug!(target: "skill::caster", owner = %self.owner, skill = ?self.active_skill(), "cast interrupted");
        self.end_process();
        true
    }

    fn end_process(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        match self.abilities.get_mut(&process.skill().id) {
            Some(ability) => process.dispose(ability.cooldown_mut()),
            None => process.dispose(&mut SkillCd::default()),
        }
    }
}

impl Drop for SkillCaster {
    fn drop(&mut self) {
        self.end_process();
    }
}

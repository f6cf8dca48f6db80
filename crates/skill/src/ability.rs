//! A skill known by an owner, with its cooldown and cast gates.

use std::sync::Arc;

use logic_graph::{EntityAccess, EntityFlags, EntityId};
use strum::Display;

use crate::cooldown::SkillCd;
use crate::data::{SkillData, SkillId};
use crate::process::SkillProcess;

/// Why a cast cannot start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CastBlock {
    OnCooldown,
    OwnerMissing,
    Stunned,
    InsufficientHealth,
    /// A non-interruptible cast is still running for the owner.
    Busy,
    TargetMissing,
    OutOfRange,
}

#[derive(Clone, Debug)]
pub struct SkillAbility {
    data: Arc<SkillData>,
    cd: SkillCd,
}

impl SkillAbility {
    pub fn new(data: Arc<SkillData>) -> Self {
        let cd = SkillCd::new(data.cooldown);
        Self { data, cd }
    }

    pub fn id(&self) -> SkillId {
        self.data.id
    }

    pub fn data(&self) -> &Arc<SkillData> {
        &self.data
    }

    pub fn cooldown(&self) -> &SkillCd {
        &self.cd
    }

    pub fn cooldown_mut(&mut self) -> &mut SkillCd {
        &mut self.cd
    }

    /// Checks the untargeted gates: cooldown, owner state, health and the
    /// owner's running cast.
    pub fn check(
        &self,
        owner: EntityId,
        entities: &dyn EntityAccess,
        running: Option<&SkillProcess>,
    ) -> Result<(), CastBlock> {
        if self.cd.is_cooling() {
            return Err(CastBlock::OnCooldown);
        }
        let Some(health) = entities.health(owner) else {
            return Err(CastBlock::OwnerMissing);
        };
        if entities.flags(owner).contains(EntityFlags::STUNNED) {
            return Err(CastBlock::Stunned);
        }
        if health < self.data.min_health
            || (self.data.health_cost > 0 && health <= self.data.health_cost)
        {
            return Err(CastBlock::InsufficientHealth);
        }
        if running.is_some_and(|process| !process.skill().interruptible && !process.is_finished())
        {
            return Err(CastBlock::Busy);
        }
        Ok(())
    }

    /// [`check`](Self::check) plus the target gates: the target must exist
    /// and lie within range.
    pub fn check_target(
        &self,
        owner: EntityId,
        target: EntityId,
        entities: &dyn EntityAccess,
        running: Option<&SkillProcess>,
    ) -> Result<(), CastBlock> {
        self.check(owner, entities, running)?;

        let Some(target_pos) = entities.position(target) else {
            return Err(CastBlock::TargetMissing);
        };
        if let Some(range) = self.data.range {
            let owner_pos = entities.position(owner).ok_or(CastBlock::OwnerMissing)?;
            if owner_pos.distance(target_pos) > range {
                return Err(CastBlock::OutOfRange);
            }
        }
        Ok(())
    }
}

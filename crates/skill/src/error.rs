//! Skill layer errors.

use logic_graph::AgentError;
use thiserror::Error;

use crate::ability::CastBlock;
use crate::data::SkillId;

#[derive(Debug, Error)]
pub enum SkillError {
    #[error("{0} is not known to this caster")]
    UnknownSkill(SkillId),

    #[error("{skill} uses script `{script}`, which is not loaded")]
    ScriptNotFound { skill: SkillId, script: String },

    #[error("{skill} cannot be cast: {reason}")]
    Blocked { skill: SkillId, reason: CastBlock },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("failed to load skill content: {0}")]
    Load(String),
}

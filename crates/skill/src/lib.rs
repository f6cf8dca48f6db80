//! Skill layer on top of the logic-graph runtime.
//!
//! A [`SkillCaster`] holds the abilities of one owner entity. Casting a
//! skill starts a [`SkillProcess`], which owns exactly one
//! [`logic_graph::Agent`] running the skill's script. The process enters
//! the skill's cooldown when it is disposed, however it ended.
//!
//! Content (runtime settings, the skill catalog and the scripts) is read
//! from a data directory by [`loaders::ContentLoader`].

pub mod ability;
pub mod caster;
pub mod cooldown;
pub mod data;
pub mod error;
pub mod library;
pub mod loaders;
pub mod process;

pub use ability::{CastBlock, SkillAbility};
pub use caster::SkillCaster;
pub use cooldown::SkillCd;
pub use data::{SkillCatalog, SkillData, SkillId};
pub use error::SkillError;
pub use library::ScriptLibrary;
pub use process::{ON_RELEASE_SKILL, SkillProcess, SpellContext};

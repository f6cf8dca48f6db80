//! Static skill definitions loaded from the catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Skill identifier, unique within a catalog.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SkillId(pub u32);

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill:{}", self.0)
    }
}

/// Definition of one skill.
///
/// Only `id`, `name` and `script` are required in the catalog; every gate
/// and flag defaults to off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    pub id: SkillId,
    pub name: String,
    /// Name of the script run by each cast.
    pub script: String,
    /// Seconds of cooldown entered when a cast process is disposed.
    #[serde(default)]
    pub cooldown: f32,
    /// Maximum distance to the target. `None` means unlimited.
    #[serde(default)]
    pub range: Option<f32>,
    /// A running cast of this skill can be replaced by another cast, and
    /// ends early when the owner is stunned.
    #[serde(default)]
    pub interruptible: bool,
    /// Minimum owner health required to start a cast.
    #[serde(default)]
    pub min_health: i32,
    /// Health paid by the owner when the cast starts.
    #[serde(default)]
    pub health_cost: i32,
    /// Suppress the owner's MOVABLE flag while casting.
    #[serde(default)]
    pub lock_movement: bool,
    /// Suppress the owner's STUNNABLE flag while casting.
    #[serde(default)]
    pub unstoppable: bool,
}

impl SkillData {
    pub fn new(id: u32, name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            id: SkillId(id),
            name: name.into(),
            script: script.into(),
            cooldown: 0.0,
            range: None,
            interruptible: false,
            min_health: 0,
            health_cost: 0,
            lock_movement: false,
            unstoppable: false,
        }
    }

    pub fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }

    pub fn with_health_cost(mut self, cost: i32) -> Self {
        self.health_cost = cost;
        self
    }

    pub fn with_min_health(mut self, health: i32) -> Self {
        self.min_health = health;
        self
    }

    pub fn with_lock_movement(mut self, lock: bool) -> Self {
        self.lock_movement = lock;
        self
    }

    pub fn with_unstoppable(mut self, unstoppable: bool) -> Self {
        self.unstoppable = unstoppable;
        self
    }
}

/// Skill catalog structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<SkillData>,
}

//! Narrow contract between the runtime and the host's entity storage.
//!
//! Nodes never see the host's component storage. They read and write a few
//! named properties of entities (health, status flags, position) and ask the
//! host to spawn or release secondary objects tagged with the process that
//! created them. This is the only state shared between agents.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Host entity identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies the script owner (one skill process) that spawned an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessTag(pub u64);

impl ProcessTag {
    /// Builds a tag unique per owner and per cast sequence number.
    pub const fn for_cast(owner: EntityId, sequence: u32) -> Self {
        Self(((owner.0 as u64) << 32) | sequence as u64)
    }
}

/// World-space position of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

bitflags! {
    /// Status flags the runtime reads and toggles on owner entities.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        /// Entity may move. Suppressed while casting movement-locking skills.
        const MOVABLE = 1 << 0;
        /// Entity may be stunned. Suppressed while casting unstoppable skills.
        const STUNNABLE = 1 << 1;
        /// Entity is currently stunned.
        const STUNNED = 1 << 2;
    }
}

/// Owner-entity access consumed by nodes and skill processes.
///
/// Implementations use interior mutability: the same accessor is shared by
/// every agent of a host, and each agent only touches it from the thread
/// that ticks it.
pub trait EntityAccess: Send + Sync {
    fn exists(&self, id: EntityId) -> bool;

    fn health(&self, id: EntityId) -> Option<i32>;

    fn set_health(&self, id: EntityId, health: i32);

    /// Flags of `id`; empty for unknown entities.
    fn flags(&self, id: EntityId) -> EntityFlags;

    fn set_flags(&self, id: EntityId, flags: EntityFlags);

    fn position(&self, id: EntityId) -> Option<Position>;

    /// Spawns a secondary object of `kind` owned by `tag`.
    fn spawn_owned(&self, owner: EntityId, kind: &str, tag: ProcessTag) -> Option<EntityId>;

    /// Releases every object spawned under `tag`, returning how many were removed.
    fn release_owned(&self, tag: ProcessTag) -> usize;
}

/// A single entity held by [`MemoryEntities`].
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub kind: String,
    pub health: i32,
    pub flags: EntityFlags,
    pub position: Position,
    pub owner_tag: Option<ProcessTag>,
}

impl EntityRecord {
    /// A movable, stunnable actor with the given health.
    pub fn actor(health: i32, position: Position) -> Self {
        Self {
            kind: "actor".to_string(),
            health,
            flags: EntityFlags::MOVABLE | EntityFlags::STUNNABLE,
            position,
            owner_tag: None,
        }
    }
}

#[derive(Debug, Default)]
struct World {
    entities: BTreeMap<EntityId, EntityRecord>,
    next_id: u32,
}

/// In-memory [`EntityAccess`] implementation for hosts without their own
/// storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryEntities {
    world: Mutex<World>,
}

impl MemoryEntities {
    /// Spawned objects receive ids starting here, away from hand-picked ids.
    pub const FIRST_SPAWNED_ID: u32 = 10_000;

    pub fn new() -> Self {
        Self {
            world: Mutex::new(World {
                entities: BTreeMap::new(),
                next_id: Self::FIRST_SPAWNED_ID,
            }),
        }
    }

    /// Inserts or replaces an entity.
    pub fn insert(&self, id: EntityId, record: EntityRecord) {
        self.world().entities.insert(id, record);
    }

    /// Returns a copy of an entity's record.
    pub fn get(&self, id: EntityId) -> Option<EntityRecord> {
        self.world().entities.get(&id).cloned()
    }

    pub fn remove(&self, id: EntityId) -> Option<EntityRecord> {
        self.world().entities.remove(&id)
    }

    /// Moves an entity.
    pub fn set_position(&self, id: EntityId, position: Position) {
        if let Some(record) = self.world().entities.get_mut(&id) {
            record.position = position;
        }
    }

    /// Number of live objects spawned under `tag`.
    pub fn owned_count(&self, tag: ProcessTag) -> usize {
        self.world()
            .entities
            .values()
            .filter(|r| r.owner_tag == Some(tag))
            .count()
    }

    pub fn len(&self) -> usize {
        self.world().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world().entities.is_empty()
    }

    fn world(&self) -> MutexGuard<'_, World> {
        // A panicking writer leaves plain data behind; keep serving it.
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityAccess for MemoryEntities {
    fn exists(&self, id: EntityId) -> bool {
        self.world().entities.contains_key(&id)
    }

    fn health(&self, id: EntityId) -> Option<i32> {
        self.world().entities.get(&id).map(|r| r.health)
    }

    fn set_health(&self, id: EntityId, health: i32) {
        if let Some(record) = self.world().entities.get_mut(&id) {
            record.health = health;
        }
    }

    fn flags(&self, id: EntityId) -> EntityFlags {
        self.world()
            .entities
            .get(&id)
            .map(|r| r.flags)
            .unwrap_or_default()
    }

    fn set_flags(&self, id: EntityId, flags: EntityFlags) {
        if let Some(record) = self.world().entities.get_mut(&id) {
            record.flags = flags;
        }
    }

    fn position(&self, id: EntityId) -> Option<Position> {
        self.world().entities.get(&id).map(|r| r.position)
    }

    fn spawn_owned(&self, owner: EntityId, kind: &str, tag: ProcessTag) -> Option<EntityId> {
        let mut world = self.world();
        let position = world.entities.get(&owner)?.position;

        let id = EntityId(world.next_id);
        world.next_id += 1;
        world.entities.insert(
            id,
            EntityRecord {
                kind: kind.to_string(),
                health: 0,
                flags: EntityFlags::empty(),
                position,
                owner_tag: Some(tag),
            },
        );
        Some(id)
    }

    fn release_owned(&self, tag: ProcessTag) -> usize {
        let mut world = self.world();
        let before = world.entities.len();
        world.entities.retain(|_, r| r.owner_tag != Some(tag));
        before - world.entities.len()
    }
}

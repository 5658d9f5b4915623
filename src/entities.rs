//! Structure-of-arrays entity stores.
//!
//! Enemies, projectiles, and death particles each live in a store of
//! parallel columns indexed by a dense slot in `0..len`. Removal is
//! swap-remove: the last row moves into the vacated slot, so slot indices
//! are positions, not identities. Identity is the `EntityId` — monotonic,
//! never reused — and every cross-reference (emitter targets, projectile
//! hit lists, chain visited sets) goes through a store's id→slot map.
//!
//! Batched removals sort slots descending and remove highest-first so a
//! swap never invalidates a slot still waiting in the batch.

use crate::archetypes::{EnemyKind, ProjectileKind};
use std::collections::HashMap;

/// Process-unique entity identity. Stable for the entity's lifetime,
/// never reused after removal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct EntityId(pub u64);

/// Hands out fresh `EntityId`s. One per simulation context; ids are unique
/// across all stores that share it.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Transient per-enemy flag bits. Render-facing bits are cleared when a
/// snapshot is taken; `REACHED_END` marks the enemy logically dead for the
/// rest of the tick.
pub mod flags {
    pub const ON_FIRE: u8 = 1 << 0;
    pub const SLOWED: u8 = 1 << 1;
    pub const NEEDS_REDRAW: u8 = 1 << 2;
    pub const HEALTH_CHANGED: u8 = 1 << 3;
    pub const REACHED_END: u8 = 1 << 4;

    /// Bits cleared once the renderer has seen them.
    pub const RENDER_BITS: u8 = NEEDS_REDRAW | HEALTH_CHANGED;
}

/// Enemy store. Columns are parallel; `len()` rows are live.
#[derive(Debug, Default)]
pub struct EnemyStore {
    pub id: Vec<EntityId>,
    pub kind: Vec<EnemyKind>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    /// Knockback velocity; zero while path-following.
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    pub health: Vec<f32>,
    pub max_health: Vec<f32>,
    pub base_speed: Vec<f32>,
    /// Slow multiplier, reset to 1 and re-derived from live slow sources
    /// every tick.
    pub speed_mult: Vec<f32>,
    pub mass: Vec<f32>,
    pub friction: Vec<f32>,
    pub radius: Vec<f32>,
    pub reward: Vec<u32>,
    /// Index of the last waypoint reached.
    pub path_index: Vec<u32>,
    pub slow_timer: Vec<f32>,
    pub slow_factor: Vec<f32>,
    pub dot_timer: Vec<f32>,
    pub dot_dps: Vec<f32>,
    pub flash_timer: Vec<f32>,
    pub flags: Vec<u8>,
    slots: HashMap<EntityId, usize>,
}

impl EnemyStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            kind: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            health: Vec::with_capacity(capacity),
            max_health: Vec::with_capacity(capacity),
            base_speed: Vec::with_capacity(capacity),
            speed_mult: Vec::with_capacity(capacity),
            mass: Vec::with_capacity(capacity),
            friction: Vec::with_capacity(capacity),
            radius: Vec::with_capacity(capacity),
            reward: Vec::with_capacity(capacity),
            path_index: Vec::with_capacity(capacity),
            slow_timer: Vec::with_capacity(capacity),
            slow_factor: Vec::with_capacity(capacity),
            dot_timer: Vec::with_capacity(capacity),
            dot_dps: Vec::with_capacity(capacity),
            flash_timer: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Spawns an enemy from its archetype, scaled by the wave health
    /// multiplier and a size scale (splitter children spawn at 0.5).
    /// Returns the new slot. Never fails; the store grows amortized.
    pub fn spawn(
        &mut self,
        ids: &mut IdAllocator,
        kind: EnemyKind,
        x: f32,
        y: f32,
        health_mult: f32,
        scale: f32,
        path_index: u32,
    ) -> usize {
        let stats = kind.stats();
        let slot = self.len();
        let id = ids.alloc();
        self.id.push(id);
        self.kind.push(kind);
        self.x.push(x);
        self.y.push(y);
        self.vx.push(0.0);
        self.vy.push(0.0);
        let hp = stats.max_health * health_mult * scale;
        self.health.push(hp);
        self.max_health.push(hp);
        self.base_speed.push(stats.speed);
        self.speed_mult.push(1.0);
        self.mass.push(stats.mass * scale.max(0.25));
        self.friction.push(stats.friction);
        self.radius.push(stats.radius * scale);
        self.reward.push(stats.reward);
        self.path_index.push(path_index);
        self.slow_timer.push(0.0);
        self.slow_factor.push(1.0);
        self.dot_timer.push(0.0);
        self.dot_dps.push(0.0);
        self.flash_timer.push(0.0);
        self.flags.push(flags::NEEDS_REDRAW);
        let _previous = self.slots.insert(id, slot);
        debug_assert!(_previous.is_none(), "id reuse");
        slot
    }

    /// Current slot of an id, if the entity is still alive.
    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Whether the entity should be ignored by every system for the rest
    /// of this tick, even though its row still exists.
    pub fn logically_dead(&self, slot: usize) -> bool {
        self.health[slot] <= 0.0 || self.has_flag(slot, flags::REACHED_END)
    }

    pub fn has_flag(&self, slot: usize, bit: u8) -> bool {
        self.flags[slot] & bit != 0
    }

    pub fn set_flag(&mut self, slot: usize, bit: u8) {
        self.flags[slot] |= bit;
    }

    pub fn clear_flag(&mut self, slot: usize, bit: u8) {
        self.flags[slot] &= !bit;
    }

    /// Clears render-facing flag bits on every row. Called when a snapshot
    /// is handed to the renderer.
    pub fn clear_render_flags(&mut self) {
        for f in &mut self.flags {
            *f &= !flags::RENDER_BITS;
        }
    }

    /// Swap-remove. The previously-last row moves into `slot`; the id→slot
    /// map is patched so lookups stay valid mid-tick.
    pub fn swap_remove(&mut self, slot: usize) {
        let last = self.len() - 1;
        let _removed = self.slots.remove(&self.id[slot]);
        debug_assert!(_removed == Some(slot), "id/slot desync");
        if slot != last {
            let moved = self.id[last];
            let _ = self.slots.insert(moved, slot);
        }
        self.id.swap_remove(slot);
        self.kind.swap_remove(slot);
        self.x.swap_remove(slot);
        self.y.swap_remove(slot);
        self.vx.swap_remove(slot);
        self.vy.swap_remove(slot);
        self.health.swap_remove(slot);
        self.max_health.swap_remove(slot);
        self.base_speed.swap_remove(slot);
        self.speed_mult.swap_remove(slot);
        self.mass.swap_remove(slot);
        self.friction.swap_remove(slot);
        self.radius.swap_remove(slot);
        self.reward.swap_remove(slot);
        self.path_index.swap_remove(slot);
        self.slow_timer.swap_remove(slot);
        self.slow_factor.swap_remove(slot);
        self.dot_timer.swap_remove(slot);
        self.dot_dps.swap_remove(slot);
        self.flash_timer.swap_remove(slot);
        self.flags.swap_remove(slot);
    }

    /// Removes a batch of slots, highest-first, so pending slots stay valid.
    /// The batch is consumed (sorted, deduplicated, cleared).
    pub fn remove_batch(&mut self, batch: &mut Vec<usize>) {
        batch.sort_unstable_by(|a, b| b.cmp(a));
        batch.dedup();
        for &slot in batch.iter() {
            self.swap_remove(slot);
        }
        batch.clear();
    }
}

/// Projectile store.
#[derive(Debug, Default)]
pub struct ProjectileStore {
    pub id: Vec<EntityId>,
    pub kind: Vec<ProjectileKind>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    pub damage: Vec<f32>,
    /// Remaining hit budget; the projectile dies when it reaches zero.
    pub pierce: Vec<u32>,
    pub lifespan: Vec<f32>,
    pub knockback: Vec<f32>,
    pub radius: Vec<f32>,
    /// Enemy ids this projectile has already damaged. Small linear lists;
    /// buffers are recycled through `spare` so steady-state firing does not
    /// allocate.
    pub hit_ids: Vec<Vec<EntityId>>,
    slots: HashMap<EntityId, usize>,
    spare: Vec<Vec<EntityId>>,
}

impl ProjectileStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            kind: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            damage: Vec::with_capacity(capacity),
            pierce: Vec::with_capacity(capacity),
            lifespan: Vec::with_capacity(capacity),
            knockback: Vec::with_capacity(capacity),
            radius: Vec::with_capacity(capacity),
            hit_ids: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            spare: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// Spawns a projectile with final (level-scaled) damage and knockback.
    pub fn spawn(
        &mut self,
        ids: &mut IdAllocator,
        kind: ProjectileKind,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        damage: f32,
        knockback: f32,
    ) -> usize {
        let stats = kind.stats();
        let slot = self.len();
        let id = ids.alloc();
        self.id.push(id);
        self.kind.push(kind);
        self.x.push(x);
        self.y.push(y);
        self.vx.push(vx);
        self.vy.push(vy);
        self.damage.push(damage);
        self.pierce.push(stats.pierce);
        self.lifespan.push(stats.lifespan);
        self.knockback.push(knockback);
        self.radius.push(stats.radius);
        self.hit_ids.push(self.spare.pop().unwrap_or_default());
        let _previous = self.slots.insert(id, slot);
        debug_assert!(_previous.is_none(), "id reuse");
        slot
    }

    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Whether this projectile already damaged the given enemy.
    pub fn has_hit(&self, slot: usize, enemy: EntityId) -> bool {
        self.hit_ids[slot].contains(&enemy)
    }

    pub fn record_hit(&mut self, slot: usize, enemy: EntityId) {
        self.hit_ids[slot].push(enemy);
    }

    pub fn swap_remove(&mut self, slot: usize) {
        let last = self.len() - 1;
        let _removed = self.slots.remove(&self.id[slot]);
        debug_assert!(_removed == Some(slot), "id/slot desync");
        if slot != last {
            let moved = self.id[last];
            let _ = self.slots.insert(moved, slot);
        }
        self.id.swap_remove(slot);
        self.kind.swap_remove(slot);
        self.x.swap_remove(slot);
        self.y.swap_remove(slot);
        self.vx.swap_remove(slot);
        self.vy.swap_remove(slot);
        self.damage.swap_remove(slot);
        self.pierce.swap_remove(slot);
        self.lifespan.swap_remove(slot);
        self.knockback.swap_remove(slot);
        self.radius.swap_remove(slot);
        let mut hits = self.hit_ids.swap_remove(slot);
        hits.clear();
        self.spare.push(hits);
    }

    /// Batched removal, highest slot first. Consumes the batch.
    pub fn remove_batch(&mut self, batch: &mut Vec<usize>) {
        batch.sort_unstable_by(|a, b| b.cmp(a));
        batch.dedup();
        for &slot in batch.iter() {
            self.swap_remove(slot);
        }
        batch.clear();
    }
}

/// Death-particle store. Visual debris, but it is simulated data: gravity,
/// multiplicative size decay, finite life.
#[derive(Debug, Default)]
pub struct ParticleStore {
    pub id: Vec<EntityId>,
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    pub size: Vec<f32>,
    pub life: Vec<f32>,
}

impl ParticleStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
            life: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn spawn(
        &mut self,
        ids: &mut IdAllocator,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        size: f32,
        life: f32,
    ) -> usize {
        let slot = self.len();
        self.id.push(ids.alloc());
        self.x.push(x);
        self.y.push(y);
        self.vx.push(vx);
        self.vy.push(vy);
        self.size.push(size);
        self.life.push(life);
        slot
    }

    pub fn swap_remove(&mut self, slot: usize) {
        self.id.swap_remove(slot);
        self.x.swap_remove(slot);
        self.y.swap_remove(slot);
        self.vx.swap_remove(slot);
        self.vy.swap_remove(slot);
        self.size.swap_remove(slot);
        self.life.swap_remove(slot);
    }

    pub fn remove_batch(&mut self, batch: &mut Vec<usize>) {
        batch.sort_unstable_by(|a, b| b.cmp(a));
        batch.dedup();
        for &slot in batch.iter() {
            self.swap_remove(slot);
        }
        batch.clear();
    }
}
